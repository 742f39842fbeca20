//! # Nodal Core
//!
//! A Modified Nodal Analysis (MNA) kernel for small analog circuits.
//!
//! This library provides:
//! - A circuit model of components, ports and symmetric wiring
//! - Net construction by merging wired ports into electrical nodes
//! - Operating-point, transient and symbolic (Laplace-domain) analyses
//! - A component trait open to user-defined elements, plus a small reference
//!   library (R, C, voltage/current sources, small-signal MOSFET)
//!
//! ## Architecture
//!
//! - [`circuit`] - Ports, wiring, the net factory and validation
//! - [`components`] - The stamping contract and component models
//! - [`solver`] - Sparse assembly, ground elimination and the analysis drivers
//! - [`symbolic`] - Rational functions of named symbols and their exact solver
//!
//! ## Usage
//!
//! ```no_run
//! use nodal_core::components::{Capacitor, Resistor, VoltageSource};
//! use nodal_core::{Circuit, GND};
//!
//! let v1 = VoltageSource::new("V1", 1.0).with_ac(1.0);
//! let r1 = Resistor::new("R1", 1.0);
//! let c1 = Capacitor::new("C1", 1.0);
//!
//! let mut circuit = Circuit::new();
//! circuit.connect(v1.p(), r1.p());
//! circuit.connect(r1.n(), c1.p());
//! circuit.connect(c1.n(), GND);
//! circuit.connect(v1.n(), GND);
//! let out = c1.p().id();
//! circuit.add(v1);
//! circuit.add(r1);
//! circuit.add(c1);
//!
//! let mut netlist = circuit.netlist();
//! netlist.set_name(out, "vout")?;
//! let result = circuit.analyse_symbolic(Some(&netlist))?;
//! println!("vout = {}", result["vout"]);
//! # Ok::<(), nodal_core::NodalError>(())
//! ```
//!
//! ## Method
//!
//! Every analysis follows the same sequence:
//!
//! 1. Build the netlist and size the system (one row per net plus the extra
//!    unknowns each component declares)
//! 2. Let every component add its stamp
//! 3. Delete the rows and columns of grounded nets
//! 4. Solve, numerically or symbolically
//!
//! Transient analysis integrates `G·v + Cap·dv/dt = B` with backward Euler,
//! starting from the operating point.

pub mod circuit;
pub mod components;
pub mod error;
pub mod solver;
pub mod symbolic;

// Re-export main types for convenience
pub use circuit::{validate_circuit, Circuit, NetFactory, Port, PortId, Value, GND};
pub use components::Component;
pub use error::{NodalError, Result};
pub use solver::{OpResult, SolverConfig, SymbolicResult, TransientResult};
pub use symbolic::{Expr, LAPLACE_VARIABLE};
