//! MNA assembly: extra-row layout, the stamping pass and ground elimination.

use nalgebra::DVector;

use super::sparse::{remove_entries, Scalar, SparseMatrix};
use crate::circuit::{Analysis, NetFactory, Port};
use crate::components::Component;
use crate::error::{NodalError, Result};

/// What a component sees while stamping one analysis.
///
/// The matrices themselves are passed next to the context so that each
/// analysis can hand over one (`M`) or two (`G`, `Cap`) of them.
pub struct StampContext<'a, T> {
    netlist: &'a NetFactory,
    analysis: Analysis,
    extra_row: Option<usize>,
    variables: &'a mut Vec<String>,
    rhs: &'a mut Vec<T>,
    dimension: usize,
}

impl<'a, T: Scalar> StampContext<'a, T> {
    pub(crate) fn new(
        netlist: &'a NetFactory,
        analysis: Analysis,
        extra_row: Option<usize>,
        variables: &'a mut Vec<String>,
        rhs: &'a mut Vec<T>,
    ) -> Self {
        let dimension = rhs.len();
        Self {
            netlist,
            analysis,
            extra_row,
            variables,
            rhs,
            dimension,
        }
    }

    pub fn netlist(&self) -> &NetFactory {
        self.netlist
    }

    pub fn analysis(&self) -> Analysis {
        self.analysis
    }

    /// Matrix row of the net `port` belongs to.
    pub fn net_id(&self, port: &Port) -> Result<usize> {
        self.netlist.net_id(port)
    }

    /// First extra row assigned to this component, if it declared any.
    pub fn extra_row(&self) -> Option<usize> {
        self.extra_row
    }

    /// First extra row, or an error if the component declared none.
    pub fn require_extra_row(&self, component: &str) -> Result<usize> {
        self.extra_row.ok_or_else(|| NodalError::MissingExtraRow {
            component: component.to_string(),
            analysis: self.analysis,
        })
    }

    /// Full (pre-elimination) system size.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn variables(&self) -> &[String] {
        self.variables.as_slice()
    }

    /// Name the next extra unknown. Call once per declared extra row, in order.
    pub fn push_variable(&mut self, name: impl Into<String>) {
        self.variables.push(name.into());
    }

    /// Add `value` to the right-hand side at `row`.
    pub fn add_rhs(&mut self, row: usize, value: T) {
        self.rhs[row] += value;
    }
}

/// What a component sees in its per-step transient `update` hook.
///
/// All indices are in ground-eliminated coordinates. The hook can only add
/// to the step-local perturbations; the assembled base system is not
/// reachable from here.
pub struct StepContext<'a> {
    pub(crate) netlist: &'a NetFactory,
    pub(crate) elimination: &'a GroundElimination,
    pub(crate) time: f64,
    pub(crate) dt: f64,
    pub(crate) previous: &'a DVector<f64>,
    pub(crate) variables: &'a [String],
    pub(crate) conductance: &'a mut SparseMatrix<f64>,
    pub(crate) capacitance: &'a mut SparseMatrix<f64>,
    pub(crate) rhs: &'a mut DVector<f64>,
}

impl<'a> StepContext<'a> {
    /// Time at the start of this step.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Solution of the previous step (or the initial condition).
    pub fn previous(&self) -> &DVector<f64> {
        self.previous
    }

    pub fn variables(&self) -> &[String] {
        self.variables
    }

    /// Reduced row of the net `port` belongs to; `None` for ground.
    pub fn row_of(&self, port: &Port) -> Result<Option<usize>> {
        let id = self.netlist.net_id(port)?;
        Ok(self.elimination.reduced(id))
    }

    /// Previous-step voltage of the net `port` belongs to.
    pub fn voltage(&self, port: &Port) -> Result<f64> {
        Ok(self
            .row_of(port)?
            .map(|row| self.previous[row])
            .unwrap_or(0.0))
    }

    /// Previous-step value of a named unknown.
    pub fn value_of(&self, variable: &str) -> Option<f64> {
        let index = self.variables.iter().position(|v| v == variable)?;
        Some(self.previous[index])
    }

    pub fn add_conductance(&mut self, row: usize, col: usize, value: f64) {
        self.conductance.add(row, col, value);
    }

    pub fn add_capacitance(&mut self, row: usize, col: usize, value: f64) {
        self.capacitance.add(row, col, value);
    }

    pub fn add_rhs(&mut self, row: usize, value: f64) {
        self.rhs[row] += value;
    }

    /// Stamp an extra conductance `g` between the nets of two ports.
    pub fn stamp_conductance(&mut self, a: &Port, b: &Port, g: f64) -> Result<()> {
        let n1 = self.row_of(a)?;
        let n2 = self.row_of(b)?;
        if let Some(i) = n1 {
            self.conductance.add(i, i, g);
        }
        if let Some(j) = n2 {
            self.conductance.add(j, j, g);
        }
        if let (Some(i), Some(j)) = (n1, n2) {
            self.conductance.add(i, j, -g);
            self.conductance.add(j, i, -g);
        }
        Ok(())
    }

    /// Inject `current` into the net of `port` for this step.
    pub fn inject_current(&mut self, port: &Port, current: f64) -> Result<()> {
        if let Some(row) = self.row_of(port)? {
            self.rhs[row] += current;
        }
        Ok(())
    }
}

/// Extra-row assignment for one analysis.
#[derive(Debug, Clone)]
pub(crate) struct Layout {
    pub dimension: usize,
    /// Declared extra unknowns per component
    pub counts: Vec<usize>,
    /// First extra row per component (`None` when it declared zero)
    pub extra_rows: Vec<Option<usize>>,
}

impl Layout {
    /// Extra rows follow the net rows, in component order.
    pub fn new(components: &[Box<dyn Component>], num_nets: usize, analysis: Analysis) -> Self {
        let mut counts = Vec::with_capacity(components.len());
        let mut extra_rows = Vec::with_capacity(components.len());
        let mut next = num_nets;

        for component in components {
            let count = component.extra_unknowns(analysis);
            extra_rows.push(if count > 0 { Some(next) } else { None });
            counts.push(count);
            next += count;
        }

        Self {
            dimension: next,
            counts,
            extra_rows,
        }
    }
}

/// Run one stamping pass over all components.
///
/// `stamp` is called once per component with a context that carries its
/// extra row; the number of unknowns it names must match its declaration.
pub(crate) fn stamp_all<T, F>(
    components: &[Box<dyn Component>],
    netlist: &NetFactory,
    layout: &Layout,
    analysis: Analysis,
    variables: &mut Vec<String>,
    rhs: &mut Vec<T>,
    mut stamp: F,
) -> Result<()>
where
    T: Scalar,
    F: FnMut(&dyn Component, &mut StampContext<'_, T>) -> Result<()>,
{
    for (index, component) in components.iter().enumerate() {
        let before = variables.len();
        {
            let mut ctx = StampContext::new(
                netlist,
                analysis,
                layout.extra_rows[index],
                variables,
                rhs,
            );
            stamp(component.as_ref(), &mut ctx)?;
        }

        let added = variables.len() - before;
        if added != layout.counts[index] {
            return Err(NodalError::ExtraRowMismatch {
                component: component.name().to_string(),
                declared: layout.counts[index],
                added,
            });
        }
    }
    Ok(())
}

/// Removal of grounded rows/columns from an assembled system.
#[derive(Debug, Clone)]
pub struct GroundElimination {
    removed: Vec<usize>,
    map: Vec<Option<usize>>,
}

impl GroundElimination {
    /// Plan the removal of `removed` (full indices) from a system of `dimension`.
    pub fn new(dimension: usize, removed: &[usize]) -> Self {
        let mut removed = removed.to_vec();
        removed.sort_unstable();
        removed.dedup();

        let mut next = 0;
        let map = (0..dimension)
            .map(|i| {
                if removed.binary_search(&i).is_ok() {
                    None
                } else {
                    next += 1;
                    Some(next - 1)
                }
            })
            .collect();

        Self { removed, map }
    }

    /// For a netlist: drop every grounded net.
    pub fn for_netlist(netlist: &NetFactory, dimension: usize) -> Self {
        let ground = netlist.ground_ids();
        if ground.is_empty() {
            log::warn!("No grounded net; solving without a reference node");
        }
        Self::new(dimension, &ground)
    }

    /// Full indices being removed, ascending.
    pub fn removed(&self) -> &[usize] {
        &self.removed
    }

    /// Reduced index of a full index (`None` if removed).
    pub fn reduced(&self, full: usize) -> Option<usize> {
        self.map.get(full).copied().flatten()
    }

    /// Size after elimination.
    pub fn reduced_dimension(&self) -> usize {
        self.map.len() - self.removed.len()
    }

    pub fn matrix<T: Scalar>(&self, m: &SparseMatrix<T>) -> SparseMatrix<T> {
        m.delete(&self.removed, &self.removed)
    }

    pub fn vector<T>(&self, v: Vec<T>) -> Vec<T> {
        remove_entries(v, &self.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Circuit, GND};
    use crate::components::Resistor;

    /// Declares one extra unknown but never names it.
    #[derive(Debug)]
    struct Silent {
        ports: [Port; 1],
    }

    impl Component for Silent {
        fn name(&self) -> &str {
            "X1"
        }

        fn ports(&self) -> &[Port] {
            &self.ports
        }

        fn extra_unknowns(&self, _analysis: Analysis) -> usize {
            1
        }

        fn stamp_op(
            &self,
            ctx: &mut StampContext<'_, f64>,
            _m: &mut SparseMatrix<f64>,
        ) -> Result<()> {
            ctx.net_id(&self.ports[0])?;
            Ok(())
        }
    }

    /// Asks for an extra row it never declared.
    #[derive(Debug)]
    struct Greedy {
        ports: [Port; 1],
    }

    impl Component for Greedy {
        fn name(&self) -> &str {
            "X2"
        }

        fn ports(&self) -> &[Port] {
            &self.ports
        }

        fn stamp_op(
            &self,
            ctx: &mut StampContext<'_, f64>,
            _m: &mut SparseMatrix<f64>,
        ) -> Result<()> {
            let row = ctx.require_extra_row(self.name())?;
            ctx.push_variable(format!("I{}", row));
            Ok(())
        }
    }

    fn loaded(component: Box<dyn Component>, port: &Port) -> Circuit {
        let r1 = Resistor::new("R1", 1.0);
        let mut circuit = Circuit::new();
        circuit.connect(port, r1.p());
        circuit.connect(r1.n(), GND);
        circuit.add_boxed(component);
        circuit.add(r1);
        circuit
    }

    #[test]
    fn test_unnamed_extra_unknown() {
        let x = Silent {
            ports: [Port::new("X1", "a")],
        };
        let port = x.ports[0].clone();
        let circuit = loaded(Box::new(x), &port);

        assert_eq!(
            circuit.analyse_op(None),
            Err(NodalError::ExtraRowMismatch {
                component: "X1".to_string(),
                declared: 1,
                added: 0
            })
        );
    }

    #[test]
    fn test_undeclared_extra_row() {
        let x = Greedy {
            ports: [Port::new("X2", "a")],
        };
        let port = x.ports[0].clone();
        let circuit = loaded(Box::new(x), &port);

        assert_eq!(
            circuit.analyse_op(None),
            Err(NodalError::MissingExtraRow {
                component: "X2".to_string(),
                analysis: Analysis::OperatingPoint
            })
        );
    }

    #[test]
    fn test_layout_follows_component_order() {
        let silent = |name: &str| -> Box<dyn Component> {
            Box::new(Silent {
                ports: [Port::new(name, "a")],
            })
        };
        let components = vec![
            silent("X1"),
            Box::new(Resistor::new("R1", 1.0)) as Box<dyn Component>,
            silent("X3"),
        ];

        let layout = Layout::new(&components, 4, Analysis::OperatingPoint);
        assert_eq!(layout.dimension, 6);
        assert_eq!(layout.extra_rows, vec![Some(4), None, Some(5)]);
        assert_eq!(layout.counts, vec![1, 0, 1]);
    }

    #[test]
    fn test_elimination_map() {
        let elim = GroundElimination::new(5, &[3, 1]);
        assert_eq!(elim.removed(), &[1, 3]);
        assert_eq!(elim.reduced(0), Some(0));
        assert_eq!(elim.reduced(1), None);
        assert_eq!(elim.reduced(2), Some(1));
        assert_eq!(elim.reduced(4), Some(2));
        assert_eq!(elim.reduced(9), None);
        assert_eq!(elim.reduced_dimension(), 3);
        assert_eq!(
            elim.vector(vec!["a", "b", "c", "d", "e"]),
            vec!["a", "c", "e"]
        );
    }
}
