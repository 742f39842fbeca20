//! Integration tests for transient analysis.

use approx::assert_relative_eq;
use nodal_core::circuit::ComponentId;
use nodal_core::components::{Capacitor, CurrentSource, Resistor, VoltageSource};
use nodal_core::solver::StepContext;
use nodal_core::{Circuit, Component, NetFactory, NodalError, Port, Result, GND};

/// Capacitor charged to 3V sitting on a 1.5V source, discharging through R1.
///
/// ```text
///   out ── C1 ── V1(1.5V) ── GND
///    └──── R1 ─────┘
/// ```
fn stacked_rc(r: f64) -> (Circuit, ComponentId, NetFactory) {
    let c1 = Capacitor::new("C1", 10e-12).with_dc(3.0);
    let r1 = Resistor::new("R1", r);
    let v1 = VoltageSource::new("V1", 1.5);

    let mut circuit = Circuit::new();
    circuit.connect(c1.p(), r1.p());
    circuit.connect(c1.n(), r1.n());
    circuit.connect(v1.p(), c1.n());
    circuit.connect(v1.n(), GND);
    let out = c1.p().id();
    circuit.add(c1);
    let resistor = circuit.add(r1);
    circuit.add(v1);

    let mut netlist = circuit.netlist();
    netlist.set_name(out, "out").unwrap();
    (circuit, resistor, netlist)
}

#[test]
fn test_stacked_rc_discharge() {
    let (mut circuit, _, netlist) = stacked_rc(100e3);
    let result = circuit.analyse_tran(10e-6, 0.3e-6, 0.0, Some(&netlist)).unwrap();

    // ceil(10 / 0.3) = 34 steps
    assert_eq!(result.len(), 35);
    let out = result.signal("out").unwrap();
    assert_relative_eq!(out[0], 4.5, epsilon = 1e-9);
    assert!(out.windows(2).all(|w| w[1] <= w[0]));
    assert_relative_eq!(out[34], 1.5, epsilon = 1e-3);
    assert_relative_eq!(result.time[34], 34.0 * 0.3e-6, epsilon = 1e-15);
}

#[test]
fn test_parameter_change_between_runs() {
    let (mut circuit, resistor, netlist) = stacked_rc(100e3);
    let slow = circuit.analyse_tran(10e-6, 0.3e-6, 0.0, Some(&netlist)).unwrap();

    circuit.set_parameter(resistor, "value", 10e3).unwrap();
    let fast = circuit.analyse_tran(10e-6, 0.3e-6, 0.0, Some(&netlist)).unwrap();

    let slow = slow.signal("out").unwrap();
    let fast = fast.signal("out").unwrap();
    // One step of backward Euler: 1.5 + 3 / (1 + h/tau)
    assert_relative_eq!(slow[1], 1.5 + 3.0 / 1.3, epsilon = 1e-9);
    assert_relative_eq!(fast[1], 1.5 + 3.0 / 4.0, epsilon = 1e-9);
    assert!(fast[1] < slow[1]);
}

#[test]
fn test_repeated_runs_are_identical() {
    let (mut circuit, _, netlist) = stacked_rc(100e3);
    let first = circuit.analyse_tran(5e-6, 0.1e-6, 0.0, Some(&netlist)).unwrap();
    let second = circuit.analyse_tran(5e-6, 0.1e-6, 0.0, Some(&netlist)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_symbolic_value_is_rejected() {
    let c1 = Capacitor::new("C1", 1e-9);
    let r1 = Resistor::new("R1", "R");
    let mut circuit = Circuit::new();
    circuit.connect(c1.p(), r1.p());
    circuit.connect(c1.n(), GND);
    circuit.connect(r1.n(), GND);
    circuit.add(c1);
    circuit.add(r1);

    assert!(matches!(
        circuit.analyse_tran(1e-6, 1e-7, 0.0, None),
        Err(NodalError::SymbolicValue { .. })
    ));
}

/// Current-injecting comparator with hysteresis: switches a 30µA source on
/// below `low` and off above `high`.
#[derive(Debug)]
struct Relaxation {
    ports: [Port; 1],
    low: f64,
    high: f64,
    on: bool,
}

impl Relaxation {
    fn new(low: f64, high: f64) -> Self {
        Self {
            ports: [Port::current("X1", "out", 0.0)],
            low,
            high,
            on: false,
        }
    }
}

impl Component for Relaxation {
    fn name(&self) -> &str {
        "X1"
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn update(&mut self, step: &mut StepContext<'_>) -> Result<()> {
        let v = step.voltage(&self.ports[0])?;
        if self.on && v > self.high {
            self.on = false;
        } else if !self.on && v < self.low {
            self.on = true;
        }
        if self.on {
            step.inject_current(&self.ports[0], 30e-6)?;
        }
        Ok(())
    }
}

#[test]
fn test_update_hook_oscillator() {
    // Off: settles towards 1V. On: towards 4V. Thresholds at 1.5V and 2.5V.
    let c1 = Capacitor::new("C1", 10e-12).with_dc(3.0);
    let r1 = Resistor::new("R1", 100e3);
    let i1 = CurrentSource::new("I1", 10e-6);
    let x1 = Relaxation::new(1.5, 2.5);

    let mut circuit = Circuit::new();
    circuit.connect(c1.p(), r1.p());
    circuit.connect(r1.p(), i1.p());
    circuit.connect(i1.p(), x1.ports()[0].id());
    circuit.connect(c1.n(), GND);
    circuit.connect(r1.n(), GND);
    circuit.connect(i1.n(), GND);
    circuit.add(c1);
    circuit.add(r1);
    circuit.add(i1);
    circuit.add(x1);

    let result = circuit.analyse_tran(10e-6, 0.01e-6, 0.0, None).unwrap();
    assert_eq!(result.variables, vec!["V0"]);
    let v = result.signal("V0").unwrap();
    assert_relative_eq!(v[0], 3.0, epsilon = 1e-9);

    // First switch-on happens near t = tau·ln(4) ≈ 1.39µs
    let settled = &v[200..];
    assert!(settled.iter().all(|&x| (1.4..=2.6).contains(&x)));

    let crossings = settled
        .windows(2)
        .filter(|w| (w[0] - 2.0).signum() != (w[1] - 2.0).signum())
        .count();
    assert!(crossings >= 3, "only {} crossings", crossings);
}
