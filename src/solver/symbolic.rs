//! Symbolic (Laplace-domain) analysis.

use std::ops::Index;

use indexmap::IndexMap;

use super::mna::{stamp_all, GroundElimination, Layout};
use super::sparse::SparseMatrix;
use crate::circuit::{Analysis, Circuit, NetFactory};
use crate::error::{NodalError, Result};
use crate::symbolic::{solve_symbolic, Expr};

/// Solution of a symbolic analysis: unknown name → expression, in row order.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicResult {
    values: IndexMap<String, Expr>,
}

impl SymbolicResult {
    pub fn get(&self, name: &str) -> Option<&Expr> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Index<&str> for SymbolicResult {
    type Output = Expr;

    fn index(&self, name: &str) -> &Expr {
        &self.values[name]
    }
}

impl Circuit {
    /// Solve the circuit in the Laplace domain.
    ///
    /// Component values may be symbols; capacitors become admittances `s·C`
    /// and voltage sources drive their `ac` amplitude. Every unknown is
    /// returned as a simplified rational function.
    pub fn analyse_symbolic(&self, netlist: Option<&NetFactory>) -> Result<SymbolicResult> {
        if self.components.is_empty() {
            return Err(NodalError::EmptyCircuit);
        }
        let owned;
        let netlist = match netlist {
            Some(netlist) => netlist,
            None => {
                owned = self.netlist();
                &owned
            }
        };

        let analysis = Analysis::Symbolic;
        let layout = Layout::new(&self.components, netlist.len(), analysis);
        log::info!("Symbolic analysis: {} unknowns", layout.dimension);

        let mut variables = netlist.variable_names()?;
        let mut rhs = vec![Expr::zero(); layout.dimension];
        let mut m = SparseMatrix::square(layout.dimension);
        stamp_all(
            &self.components,
            netlist,
            &layout,
            analysis,
            &mut variables,
            &mut rhs,
            |component, ctx| component.stamp_symbolic(ctx, &mut m),
        )?;

        let elimination = GroundElimination::for_netlist(netlist, layout.dimension);
        let m = elimination.matrix(&m);
        let b = elimination.vector(rhs);
        let variables = elimination.vector(variables);

        let solution = solve_symbolic(&m, &b, self.config.zero_tolerance)?;

        // Duplicate names keep the first occurrence
        let mut values = IndexMap::with_capacity(variables.len());
        for (name, expr) in variables.into_iter().zip(solution) {
            if values.contains_key(&name) {
                log::warn!("Duplicate variable name '{}' in symbolic result", name);
                continue;
            }
            values.insert(name, expr);
        }

        Ok(SymbolicResult { values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GND;
    use crate::components::{Resistor, VoltageSource};

    #[test]
    fn test_symbolic_divider() {
        let v1 = VoltageSource::new("V1", 0.0).with_ac("u");
        let r1 = Resistor::new("R1", "R1");
        let r2 = Resistor::new("R2", "R2");

        let mut circuit = Circuit::new();
        circuit.connect(v1.p(), r1.p());
        circuit.connect(r1.n(), r2.p());
        circuit.connect(r2.n(), GND);
        circuit.connect(v1.n(), GND);
        circuit.add(v1);
        circuit.add(r1);
        circuit.add(r2);

        let result = circuit.analyse_symbolic(None).unwrap();
        let u = Expr::symbol("u");
        let r1 = Expr::symbol("R1");
        let r2 = Expr::symbol("R2");

        let variables: Vec<&str> = result.variables().collect();
        assert_eq!(variables, vec!["V0", "V2", "I1_0"]);
        assert_eq!(result["V0"], u.clone());
        assert_eq!(result["V2"], u.clone() * r2.clone() / (r1.clone() + r2.clone()));
        assert_eq!(result["I1_0"], u / (r1 + r2));
    }
}
