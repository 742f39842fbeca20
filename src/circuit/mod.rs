//! Circuit representation: ports, wiring, components and nets.
//!
//! A [`Circuit`] holds the components in insertion order together with the
//! symmetric wiring between their ports. [`Circuit::netlist`] turns the wiring
//! into a [`NetFactory`] whose nets are the electrical nodes of the system.

mod graph;
mod netlist;
mod types;
mod validate;

pub use graph::Circuit;
pub use netlist::{Net, NetFactory};
pub use types::*;
pub use validate::validate_circuit;
