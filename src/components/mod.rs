//! Component models and the stamping contract.
//!
//! This module provides the [`Component`] trait every circuit element
//! implements, plus a small reference library:
//! - Linear: Resistor, Capacitor
//! - Sources: Voltage Source, Current Source
//! - Small-signal: MOSFET
//!
//! Each component adds its contribution into the shared MNA matrices at the
//! rows of its own nets and extra rows. Contributions are only ever added,
//! so the order in which components stamp does not matter.

mod linear;
mod mosfet;
mod sources;

pub use linear::{Capacitor, Resistor};
pub use mosfet::Mosfet;
pub use sources::{CurrentSource, VoltageSource};

use std::fmt;

use crate::circuit::{Analysis, Port, PortKind, Value};
use crate::error::{NodalError, Result};
use crate::solver::{SparseMatrix, StampContext, StepContext};
use crate::symbolic::Expr;

/// A circuit element.
///
/// Only [`Component::name`] and [`Component::ports`] are required. The
/// default stamps treat fixed-current ports as sources and reject any other
/// port kind, so ordinary components override the stamps they support.
pub trait Component: fmt::Debug {
    /// Component name (used in error messages).
    fn name(&self) -> &str;

    /// Ports in declaration order. The order is fixed at construction.
    fn ports(&self) -> &[Port];

    /// Look up a port by name.
    fn port(&self, name: &str) -> Result<&Port> {
        self.ports()
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| NodalError::UnknownPort {
                component: self.name().to_string(),
                port: name.to_string(),
            })
    }

    /// Change a parameter between analyses.
    fn set_parameter(&mut self, parameter: &str, _value: Value) -> Result<()> {
        Err(NodalError::unknown_parameter(self.name(), parameter))
    }

    /// Number of extra unknowns (and constraint rows) needed for `analysis`.
    fn extra_unknowns(&self, _analysis: Analysis) -> usize {
        0
    }

    /// Stamp into the operating-point system.
    fn stamp_op(&self, ctx: &mut StampContext<'_, f64>, _m: &mut SparseMatrix<f64>) -> Result<()> {
        stamp_port_sources(self.name(), self.ports(), ctx)
    }

    /// Stamp into the transient system (`g` conductance, `cap` storage).
    fn stamp_transient(
        &self,
        ctx: &mut StampContext<'_, f64>,
        _g: &mut SparseMatrix<f64>,
        _cap: &mut SparseMatrix<f64>,
    ) -> Result<()> {
        stamp_port_sources(self.name(), self.ports(), ctx)
    }

    /// Stamp into the symbolic (Laplace-domain) system.
    fn stamp_symbolic(
        &self,
        ctx: &mut StampContext<'_, Expr>,
        _m: &mut SparseMatrix<Expr>,
    ) -> Result<()> {
        Err(NodalError::not_specialized(self.name(), ctx.analysis()))
    }

    /// Per-step transient hook. Adds step-local perturbations only.
    fn update(&mut self, _step: &mut StepContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Default stamping: each fixed-current port drives its `dc` level into the
/// rhs row of its net. Any other port kind needs a specialized stamp.
pub fn stamp_port_sources(
    component: &str,
    ports: &[Port],
    ctx: &mut StampContext<'_, f64>,
) -> Result<()> {
    for port in ports {
        match port.kind() {
            PortKind::Current { dc } => {
                let row = ctx.net_id(port)?;
                ctx.add_rhs(row, dc);
            }
            PortKind::Plain | PortKind::Voltage { .. } => {
                return Err(NodalError::not_specialized(component, ctx.analysis()));
            }
        }
    }
    Ok(())
}

/// Two-terminal helper: the `[p, n]` port pair of a component.
pub(crate) fn two_terminal(owner: &str) -> [Port; 2] {
    [Port::new(owner, "p"), Port::new(owner, "n")]
}
