//! Voltage and current sources.

use super::{two_terminal, Component};
use crate::circuit::{Analysis, Port, Value};
use crate::error::{NodalError, Result};
use crate::solver::{Scalar, SparseMatrix, StampContext};
use crate::symbolic::Expr;

/// An independent voltage source.
///
/// Voltage sources require an extra row/column in the MNA matrix for the
/// branch current `I<n>_<p>`. The source enforces: V(p) - V(n) = value,
/// where the value is `dc` in numeric analyses and `ac` in symbolic analysis.
#[derive(Debug, Clone)]
pub struct VoltageSource {
    pub name: String,
    pub dc: f64,
    /// Small-signal amplitude used by symbolic analysis
    pub ac: Value,
    ports: [Port; 2],
}

impl VoltageSource {
    /// Create a new DC voltage source with zero small-signal amplitude.
    pub fn new(name: &str, dc: f64) -> Self {
        Self {
            name: name.to_string(),
            dc,
            ac: Value::Number(0.0),
            ports: two_terminal(name),
        }
    }

    /// Set the small-signal amplitude.
    pub fn with_ac(mut self, ac: impl Into<Value>) -> Self {
        self.ac = ac.into();
        self
    }

    pub fn p(&self) -> &Port {
        &self.ports[0]
    }

    pub fn n(&self) -> &Port {
        &self.ports[1]
    }
}

/// Shared voltage-source stamp: branch incidence, constraint value and the
/// name of the branch current.
fn stamp_source<T: Scalar>(
    name: &str,
    ports: &[Port; 2],
    ctx: &mut StampContext<'_, T>,
    m: &mut SparseMatrix<T>,
    value: T,
) -> Result<()> {
    let id_p = ctx.net_id(&ports[0])?;
    let id_n = ctx.net_id(&ports[1])?;
    let row = ctx.require_extra_row(name)?;

    m.stamp_branch(row, id_p, id_n);
    ctx.add_rhs(row, value);
    ctx.push_variable(format!("I{}_{}", id_n, id_p));
    Ok(())
}

impl Component for VoltageSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn set_parameter(&mut self, parameter: &str, value: Value) -> Result<()> {
        match parameter {
            "dc" => self.dc = value.number(&self.name, "dc")?,
            "ac" => self.ac = value,
            _ => return Err(NodalError::unknown_parameter(&self.name, parameter)),
        }
        Ok(())
    }

    fn extra_unknowns(&self, _analysis: Analysis) -> usize {
        1
    }

    fn stamp_op(&self, ctx: &mut StampContext<'_, f64>, m: &mut SparseMatrix<f64>) -> Result<()> {
        stamp_source(&self.name, &self.ports, ctx, m, self.dc)
    }

    fn stamp_transient(
        &self,
        ctx: &mut StampContext<'_, f64>,
        g: &mut SparseMatrix<f64>,
        _cap: &mut SparseMatrix<f64>,
    ) -> Result<()> {
        stamp_source(&self.name, &self.ports, ctx, g, self.dc)
    }

    fn stamp_symbolic(
        &self,
        ctx: &mut StampContext<'_, Expr>,
        m: &mut SparseMatrix<Expr>,
    ) -> Result<()> {
        stamp_source(&self.name, &self.ports, ctx, m, self.ac.to_expr())
    }
}

/// An independent current source.
///
/// Current sources add directly to the RHS vector: `dc` is driven into `p`
/// and drawn out of `n`.
#[derive(Debug, Clone)]
pub struct CurrentSource {
    pub name: String,
    pub dc: Value,
    ports: [Port; 2],
}

impl CurrentSource {
    /// Create a new current source.
    pub fn new(name: &str, dc: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            dc: dc.into(),
            ports: two_terminal(name),
        }
    }

    pub fn p(&self) -> &Port {
        &self.ports[0]
    }

    pub fn n(&self) -> &Port {
        &self.ports[1]
    }

    fn stamp_rhs<T: Scalar>(&self, ctx: &mut StampContext<'_, T>, value: T) -> Result<()> {
        let id_p = ctx.net_id(self.p())?;
        let id_n = ctx.net_id(self.n())?;
        ctx.add_rhs(id_p, value.clone());
        ctx.add_rhs(id_n, -value);
        Ok(())
    }
}

impl Component for CurrentSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn set_parameter(&mut self, parameter: &str, value: Value) -> Result<()> {
        match parameter {
            "dc" => self.dc = value,
            _ => return Err(NodalError::unknown_parameter(&self.name, parameter)),
        }
        Ok(())
    }

    fn stamp_op(&self, ctx: &mut StampContext<'_, f64>, _m: &mut SparseMatrix<f64>) -> Result<()> {
        let dc = self.dc.number(&self.name, "dc")?;
        self.stamp_rhs(ctx, dc)
    }

    fn stamp_transient(
        &self,
        ctx: &mut StampContext<'_, f64>,
        _g: &mut SparseMatrix<f64>,
        _cap: &mut SparseMatrix<f64>,
    ) -> Result<()> {
        let dc = self.dc.number(&self.name, "dc")?;
        self.stamp_rhs(ctx, dc)
    }

    fn stamp_symbolic(
        &self,
        ctx: &mut StampContext<'_, Expr>,
        _m: &mut SparseMatrix<Expr>,
    ) -> Result<()> {
        self.stamp_rhs(ctx, self.dc.to_expr())
    }
}
