//! DC operating point analysis.

use nalgebra::DVector;

use super::linear::solve;
use super::mna::{stamp_all, GroundElimination, Layout};
use super::sparse::SparseMatrix;
use crate::circuit::{Analysis, Circuit, NetFactory};
use crate::error::{NodalError, Result};

/// Solution of an operating-point analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct OpResult {
    /// Unknown names, ground removed, in row order
    pub variables: Vec<String>,
    pub values: DVector<f64>,
}

impl OpResult {
    /// Value of the first unknown called `name`.
    pub fn get(&self, name: &str) -> Option<f64> {
        let index = self.variables.iter().position(|v| v == name)?;
        Some(self.values[index])
    }

    /// `(name, value)` pairs in row order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.variables
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

impl Circuit {
    /// Solve the DC operating point.
    ///
    /// Capacitors hold their initial voltage and voltage sources their `dc`
    /// level. Pass a netlist to control net names; otherwise one is built.
    pub fn analyse_op(&self, netlist: Option<&NetFactory>) -> Result<OpResult> {
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

        let analysis = Analysis::OperatingPoint;
        let layout = Layout::new(&self.components, netlist.len(), analysis);
        log::info!("Operating point: {} unknowns", layout.dimension);

        let mut variables = netlist.variable_names()?;
        let mut rhs = vec![0.0; layout.dimension];
        let mut m = SparseMatrix::square(layout.dimension);
        stamp_all(
            &self.components,
            netlist,
            &layout,
            analysis,
            &mut variables,
            &mut rhs,
            |component, ctx| component.stamp_op(ctx, &mut m),
        )?;

        let elimination = GroundElimination::for_netlist(netlist, layout.dimension);
        let m = elimination.matrix(&m);
        let b = DVector::from_vec(elimination.vector(rhs));
        let variables = elimination.vector(variables);

        let values = solve(&m, &b, &self.config)?;
        log::debug!("Operating point solved ({} nonzeros)", m.nnz());

        Ok(OpResult { variables, values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GND;
    use crate::components::{Resistor, VoltageSource};
    use crate::solver::SolverConfig;
    use approx::assert_relative_eq;

    fn divider(config: SolverConfig) -> Circuit {
        let v1 = VoltageSource::new("V1", 2.0);
        let r1 = Resistor::new("R1", 1000.0);
        let r2 = Resistor::new("R2", 3000.0);

        let mut circuit = Circuit::with_config(config);
        circuit.connect(v1.p(), r1.p());
        circuit.connect(r1.n(), r2.p());
        circuit.connect(r2.n(), GND);
        circuit.connect(v1.n(), GND);
        circuit.add(v1);
        circuit.add(r1);
        circuit.add(r2);
        circuit
    }

    #[test]
    fn test_divider() {
        let op = divider(SolverConfig::default()).analyse_op(None).unwrap();
        // Net 1 is ground and is eliminated
        assert_eq!(op.variables, vec!["V0", "V2", "I1_0"]);
        assert_relative_eq!(op.get("V0").unwrap(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(op.get("V2").unwrap(), 1.5, epsilon = 1e-12);
        // Source current leaves the positive terminal
        assert_relative_eq!(op.get("I1_0").unwrap(), 0.5e-3, epsilon = 1e-15);
    }

    #[test]
    fn test_sparse_path_agrees() {
        let dense = divider(SolverConfig::default()).analyse_op(None).unwrap();
        let sparse = divider(SolverConfig::new().with_sparse_threshold(1))
            .analyse_op(None)
            .unwrap();
        for ((_, a), (_, b)) in dense.iter().zip(sparse.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_empty_circuit() {
        assert_eq!(
            Circuit::new().analyse_op(None),
            Err(NodalError::EmptyCircuit)
        );
    }

    #[test]
    fn test_idempotent() {
        let circuit = divider(SolverConfig::default());
        let first = circuit.analyse_op(None).unwrap();
        let second = circuit.analyse_op(None).unwrap();
        assert_eq!(first, second);
    }
}
