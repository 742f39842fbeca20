//! Transient analysis with backward Euler integration.
//!
//! The circuit obeys `G·v + Cap·dv/dt = B`. Discretising with step `h`:
//!
//! ```text
//! (h·G + Cap)·v[n+1] = h·B + Cap·v[n]
//! ```
//!
//! Before every step each component's `update` hook may add step-local
//! contributions `G_add`, `Cap_add` and `B_add` on top of the assembled
//! system.

use std::collections::HashMap;

use nalgebra::{DMatrix, DVector};

use super::linear::solve;
use super::mna::{stamp_all, GroundElimination, Layout, StepContext};
use super::operating_point::OpResult;
use super::sparse::SparseMatrix;
use crate::circuit::{Analysis, Circuit, NetFactory};
use crate::error::{NodalError, Result};

/// Solution of a transient analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct TransientResult {
    /// Unknown names, ground removed, in row order
    pub variables: Vec<String>,
    /// One row per variable, one column per time point
    pub signals: DMatrix<f64>,
    pub time: Vec<f64>,
}

impl TransientResult {
    /// Waveform of the first unknown called `name`.
    pub fn signal(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.variables.iter().position(|v| v == name)?;
        Some(self.signals.row(index).iter().copied().collect())
    }

    /// Solution at time point `k` (column `k`).
    pub fn at(&self, k: usize) -> Option<DVector<f64>> {
        (k < self.signals.ncols()).then(|| self.signals.column(k).into_owned())
    }

    /// Number of time points, initial condition included.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Check step parameters and return the number of steps, `ceil(tstop/tstep)`.
fn step_count(tstop: f64, tstep: f64) -> Result<usize> {
    if !(tstop.is_finite() && tstep.is_finite()) {
        return Err(NodalError::invalid_param("time parameters must be finite"));
    }
    if tstep <= 0.0 {
        return Err(NodalError::invalid_param(format!(
            "tstep must be positive, got {}",
            tstep
        )));
    }
    if tstop < 0.0 {
        return Err(NodalError::invalid_param(format!(
            "tstop must not be negative, got {}",
            tstop
        )));
    }

    let steps = (tstop / tstep).ceil();
    if steps >= usize::MAX as f64 {
        return Err(NodalError::invalid_param(format!(
            "tstop/tstep = {:e} steps is not representable",
            steps
        )));
    }
    Ok(steps as usize)
}

/// Number of stored time points for `steps` steps of a `size`-unknown system.
fn time_points(steps: usize, size: usize, max_time_points: usize) -> Result<usize> {
    let points = steps
        .checked_add(1)
        .filter(|&points| points <= max_time_points)
        .ok_or_else(|| {
            NodalError::invalid_param(format!(
                "{} steps exceed the limit of {} time points",
                steps, max_time_points
            ))
        })?;
    size.checked_mul(points)
        .and_then(|cells| cells.checked_mul(std::mem::size_of::<f64>()))
        .filter(|&bytes| bytes <= isize::MAX as usize)
        .ok_or_else(|| {
            NodalError::invalid_param(format!(
                "{} unknowns over {} time points do not fit in memory",
                size, points
            ))
        })?;
    Ok(points)
}

/// Initial condition for `variables` taken from the operating point.
///
/// Names are matched by occurrence: the k-th transient unknown called `x`
/// takes the value of the k-th operating-point unknown called `x`.
fn initial_condition(variables: &[String], op: &OpResult) -> Result<DVector<f64>> {
    let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
    for (index, name) in op.variables.iter().enumerate() {
        positions.entry(name.as_str()).or_default().push(index);
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let values = variables
        .iter()
        .map(|name| {
            let occurrence = seen.entry(name.as_str()).or_insert(0);
            let index = positions
                .get(name.as_str())
                .and_then(|p| p.get(*occurrence))
                .ok_or_else(|| NodalError::MissingInitialCondition {
                    variable: name.clone(),
                })?;
            *occurrence += 1;
            log::debug!("Initial condition {} = {}", name, op.values[*index]);
            Ok(op.values[*index])
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DVector::from_vec(values))
}

impl Circuit {
    /// Run a transient analysis up to `tstop` with fixed step `tstep`.
    ///
    /// The initial condition is the operating point at `t = 0`. The result
    /// holds `ceil(tstop/tstep) + 1` time points `0, tstep, ..., N·tstep`, the
    /// initial condition first; `tstop = 0` gives the initial condition alone.
    /// `tstart` is accepted for call compatibility and does not shift the time
    /// axis. Components may change their own state from `update`, which is why
    /// the circuit is borrowed mutably.
    pub fn analyse_tran(
        &mut self,
        tstop: f64,
        tstep: f64,
        tstart: f64,
        netlist: Option<&NetFactory>,
    ) -> Result<TransientResult> {
        let steps = step_count(tstop, tstep)?;
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

        let analysis = Analysis::Transient;
        let layout = Layout::new(&self.components, netlist.len(), analysis);
        log::info!(
            "Transient: {} unknowns, {} steps of {}s",
            layout.dimension,
            steps,
            tstep
        );
        if tstart != 0.0 {
            log::debug!("tstart = {}s does not shift the time axis", tstart);
        }

        let mut variables = netlist.variable_names()?;
        let mut rhs = vec![0.0; layout.dimension];
        let mut g = SparseMatrix::square(layout.dimension);
        let mut cap = SparseMatrix::square(layout.dimension);
        stamp_all(
            &self.components,
            netlist,
            &layout,
            analysis,
            &mut variables,
            &mut rhs,
            |component, ctx| component.stamp_transient(ctx, &mut g, &mut cap),
        )?;

        let elimination = GroundElimination::for_netlist(netlist, layout.dimension);
        let g = elimination.matrix(&g);
        let cap = elimination.matrix(&cap);
        let b = DVector::from_vec(elimination.vector(rhs));
        let variables = elimination.vector(variables);
        let size = variables.len();
        let points = time_points(steps, size, self.config.max_time_points)?;

        let op = self.analyse_op(Some(netlist))?;
        let mut previous = initial_condition(&variables, &op)?;

        let mut signals = DMatrix::zeros(size, points);
        signals.set_column(0, &previous);
        let mut time = Vec::with_capacity(points);
        time.push(0.0);

        let interval = self.config.progress_interval;
        let mut last_reported = None;

        for i in 0..steps {
            let percentage = i * 100 / steps;
            if interval > 0 && percentage % interval == 0 && last_reported != Some(percentage) {
                log::trace!("Transient {}%", percentage);
                last_reported = Some(percentage);
            }

            let mut g_add = SparseMatrix::square(size);
            let mut cap_add = SparseMatrix::square(size);
            let mut b_add = DVector::zeros(size);

            for component in self.components.iter_mut() {
                let mut step = StepContext {
                    netlist,
                    elimination: &elimination,
                    time: i as f64 * tstep,
                    dt: tstep,
                    previous: &previous,
                    variables: &variables,
                    conductance: &mut g_add,
                    capacitance: &mut cap_add,
                    rhs: &mut b_add,
                };
                component.update(&mut step)?;
            }

            let storage = cap.sum(&cap_add);
            let lhs = g.sum(&g_add).scaled(tstep).sum(&storage);
            let rhs = (&b + &b_add) * tstep + storage.mul_vec(&previous);

            let x = solve(&lhs, &rhs, &self.config)?;
            signals.set_column(i + 1, &x);
            time.push((i + 1) as f64 * tstep);
            previous = x;
        }

        log::info!("Transient finished at t={}s", time.last().copied().unwrap_or(0.0));

        Ok(TransientResult {
            variables,
            signals,
            time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::GND;
    use crate::components::{Capacitor, Resistor};
    use crate::solver::SolverConfig;
    use approx::assert_relative_eq;

    /// Capacitor charged to 1V discharging through a resistor (tau = 1ms).
    fn rc_discharge() -> Circuit {
        let c1 = Capacitor::new("C1", 1e-6).with_dc(1.0);
        let r1 = Resistor::new("R1", 1e3);
        let mut circuit = Circuit::new();
        circuit.connect(c1.p(), r1.p());
        circuit.connect(c1.n(), r1.n());
        circuit.connect(r1.n(), GND);
        circuit.add(c1);
        circuit.add(r1);
        circuit
    }

    #[test]
    fn test_step_count() {
        assert_eq!(step_count(1.0, 0.25).unwrap(), 4);
        assert_eq!(step_count(1.1, 0.25).unwrap(), 5);
        assert_eq!(step_count(0.0, 0.1).unwrap(), 0);
        assert!(matches!(
            step_count(1.0, 0.0),
            Err(NodalError::InvalidSimulationParam { .. })
        ));
        assert!(step_count(-1.0, 0.1).is_err());
        assert!(step_count(f64::NAN, 0.1).is_err());
        assert!(step_count(1.0, 1e-300).is_err());
    }

    #[test]
    fn test_time_points_limits() {
        assert_eq!(time_points(10, 3, 100).unwrap(), 11);
        assert!(time_points(100, 3, 100).is_err());
        assert!(time_points(usize::MAX, 1, usize::MAX).is_err());
        assert!(matches!(
            time_points(usize::MAX / 4, 4, usize::MAX),
            Err(NodalError::InvalidSimulationParam { .. })
        ));
    }

    #[test]
    fn test_initial_condition_by_occurrence() {
        let op = OpResult {
            variables: vec!["a".into(), "b".into(), "a".into(), "I0_1".into()],
            values: DVector::from_vec(vec![1.0, 2.0, 3.0, 4.0]),
        };
        let variables: Vec<String> = vec!["b".into(), "a".into(), "a".into()];
        let ic = initial_condition(&variables, &op).unwrap();
        assert_eq!(ic.as_slice(), &[2.0, 1.0, 3.0]);

        let variables: Vec<String> = vec!["a".into(), "a".into(), "a".into()];
        assert_eq!(
            initial_condition(&variables, &op),
            Err(NodalError::MissingInitialCondition {
                variable: "a".to_string()
            })
        );
    }

    #[test]
    fn test_rc_discharge() {
        let mut circuit = rc_discharge();
        let tstep = 1e-6;
        let result = circuit.analyse_tran(5e-3, tstep, 0.0, None).unwrap();

        assert_eq!(result.variables, vec!["V0"]);
        assert_eq!(result.len(), 5001);
        let v = result.signal("V0").unwrap();
        assert_relative_eq!(v[0], 1.0, epsilon = 1e-12);

        // Backward Euler: v[n] = (1 + h/tau)^-n
        let decay: f64 = 1.0 / (1.0 + tstep / 1e-3);
        assert_relative_eq!(v[1000], decay.powi(1000), epsilon = 1e-9);
        assert_relative_eq!(v[1000], (-1.0f64).exp(), epsilon = 1e-3);
        assert!(v.windows(2).all(|w| w[1] < w[0]));
    }

    #[test]
    fn test_time_axis_ignores_tstart() {
        let mut circuit = rc_discharge();
        let shifted = circuit.analyse_tran(2e-3, 1e-3, 1e-3, None).unwrap();
        assert_eq!(shifted.len(), 3);
        assert_eq!(shifted.time, vec![0.0, 1e-3, 2e-3]);
        assert!(shifted.at(2).is_some());
        assert!(shifted.at(3).is_none());

        let unshifted = circuit.analyse_tran(2e-3, 1e-3, 0.0, None).unwrap();
        assert_eq!(shifted, unshifted);
    }

    #[test]
    fn test_zero_tstop_gives_initial_condition() {
        let mut circuit = rc_discharge();
        let result = circuit.analyse_tran(0.0, 1e-3, 0.0, None).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.time, vec![0.0]);
        assert_eq!(result.signals.ncols(), 1);
        assert_relative_eq!(result.signal("V0").unwrap()[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tiny_step_is_rejected() {
        let mut circuit = rc_discharge();
        assert!(matches!(
            circuit.analyse_tran(1.0, 1e-300, 0.0, None),
            Err(NodalError::InvalidSimulationParam { .. })
        ));

        // Representable, but more points than the configured limit
        let mut circuit = rc_discharge();
        circuit.set_config(SolverConfig::new().with_max_time_points(1000));
        assert!(matches!(
            circuit.analyse_tran(1.0, 1e-6, 0.0, None),
            Err(NodalError::InvalidSimulationParam { .. })
        ));
    }
}
