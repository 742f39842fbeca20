//! Circuit validation.

use crate::error::{NodalError, Result};

use super::{Circuit, GND};

/// Validate a circuit before analysis.
///
/// Checks:
/// - The circuit has at least one component
/// - Every declared port is wired to something
///
/// A circuit with nothing wired to ground is legal but almost always
/// singular, so it is only reported through the log.
pub fn validate_circuit(circuit: &Circuit) -> Result<()> {
    if circuit.is_empty() {
        return Err(NodalError::EmptyCircuit);
    }

    for component in circuit.components() {
        for port in component.ports() {
            if circuit.connections(port.id()).is_empty() {
                return Err(NodalError::unconnected(port));
            }
        }
    }

    if circuit.connections(GND).is_empty() {
        log::warn!("No port is wired to GND; the system will have no reference node");
    }

    Ok(())
}
