//! Small-signal MOSFET model.
//!
//! The transistor is linearised around its bias point:
//! - `gm`: transconductance, drain current per gate-source volt
//! - `gds`: output conductance between drain and source
//! - `gmb`: body transconductance (kept for completeness, not stamped)
//!
//! The current drawn out of the drain node through the device is
//! `gds·(Vd - Vs) - gm·(Vg - Vs)`, so a positive gate drive raises the drain.

use super::Component;
use crate::circuit::{Port, Value};
use crate::error::{NodalError, Result};
use crate::solver::{Scalar, SparseMatrix, StampContext};
use crate::symbolic::Expr;

/// Small-signal MOSFET with gate, drain, source and bulk terminals.
#[derive(Debug, Clone)]
pub struct Mosfet {
    pub name: String,
    pub gm: Option<Value>,
    pub gds: Option<Value>,
    pub gmb: Option<Value>,
    ports: [Port; 4],
}

impl Mosfet {
    /// Create a MOSFET with no small-signal parameters set.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            gm: None,
            gds: None,
            gmb: None,
            ports: [
                Port::new(name, "g"),
                Port::new(name, "d"),
                Port::new(name, "s"),
                Port::new(name, "b"),
            ],
        }
    }

    pub fn with_gm(mut self, gm: impl Into<Value>) -> Self {
        self.gm = Some(gm.into());
        self
    }

    pub fn with_gds(mut self, gds: impl Into<Value>) -> Self {
        self.gds = Some(gds.into());
        self
    }

    pub fn with_gmb(mut self, gmb: impl Into<Value>) -> Self {
        self.gmb = Some(gmb.into());
        self
    }

    pub fn g(&self) -> &Port {
        &self.ports[0]
    }

    pub fn d(&self) -> &Port {
        &self.ports[1]
    }

    pub fn s(&self) -> &Port {
        &self.ports[2]
    }

    pub fn b(&self) -> &Port {
        &self.ports[3]
    }

    fn require_gm(&self) -> Result<&Value> {
        self.gm
            .as_ref()
            .ok_or_else(|| NodalError::missing_parameter(&self.name, "gm"))
    }

    /// Numeric parameters; an absent `gds` means an ideal current source.
    fn numeric(&self) -> Result<(f64, Option<f64>)> {
        let gm = self.require_gm()?.number(&self.name, "gm")?;
        let gds = self
            .gds
            .as_ref()
            .map(|v| v.number(&self.name, "gds"))
            .transpose()?;
        Ok((gm, gds))
    }

    fn stamp<T: Scalar>(
        &self,
        ctx: &StampContext<'_, T>,
        m: &mut SparseMatrix<T>,
        gm: T,
        gds: Option<T>,
    ) -> Result<()> {
        let id_g = ctx.net_id(self.g())?;
        let id_d = ctx.net_id(self.d())?;
        let id_s = ctx.net_id(self.s())?;
        // Bulk must still be wired even though gmb is not stamped
        ctx.net_id(self.b())?;

        if let Some(gds) = gds {
            m.stamp_conductance(id_d, id_s, gds);
        }
        m.stamp_transconductance(id_s, id_d, id_g, id_s, gm);
        Ok(())
    }
}

impl Component for Mosfet {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn set_parameter(&mut self, parameter: &str, value: Value) -> Result<()> {
        let slot = match parameter {
            "gm" => &mut self.gm,
            "gds" => &mut self.gds,
            "gmb" => &mut self.gmb,
            _ => return Err(NodalError::unknown_parameter(&self.name, parameter)),
        };
        *slot = Some(value);
        Ok(())
    }

    fn stamp_op(&self, ctx: &mut StampContext<'_, f64>, m: &mut SparseMatrix<f64>) -> Result<()> {
        let (gm, gds) = self.numeric()?;
        self.stamp(ctx, m, gm, gds)
    }

    fn stamp_transient(
        &self,
        ctx: &mut StampContext<'_, f64>,
        g: &mut SparseMatrix<f64>,
        _cap: &mut SparseMatrix<f64>,
    ) -> Result<()> {
        let (gm, gds) = self.numeric()?;
        self.stamp(ctx, g, gm, gds)
    }

    fn stamp_symbolic(
        &self,
        ctx: &mut StampContext<'_, Expr>,
        m: &mut SparseMatrix<Expr>,
    ) -> Result<()> {
        let gm = self.require_gm()?.to_expr();
        let gds = self.gds.as_ref().map(Value::to_expr);
        self.stamp(ctx, m, gm, gds)
    }
}
