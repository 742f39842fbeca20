//! Linear passive components: Resistor, Capacitor.

use super::{two_terminal, Component};
use crate::circuit::{Analysis, Port, Value};
use crate::error::{NodalError, Result};
use crate::solver::{SparseMatrix, StampContext};
use crate::symbolic::Expr;

/// A resistor between `p` and `n`.
#[derive(Debug, Clone)]
pub struct Resistor {
    pub name: String,
    /// Resistance in ohms, or a symbol
    pub value: Value,
    ports: [Port; 2],
}

impl Resistor {
    /// Create a new resistor.
    pub fn new(name: &str, value: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            ports: two_terminal(name),
        }
    }

    pub fn p(&self) -> &Port {
        &self.ports[0]
    }

    pub fn n(&self) -> &Port {
        &self.ports[1]
    }

    /// Get the conductance (1/R).
    pub fn conductance(&self) -> Result<f64> {
        Ok(1.0 / self.value.number(&self.name, "value")?)
    }

    fn stamp_numeric(&self, ctx: &StampContext<'_, f64>, m: &mut SparseMatrix<f64>) -> Result<()> {
        let id_p = ctx.net_id(self.p())?;
        let id_n = ctx.net_id(self.n())?;
        m.stamp_conductance(id_p, id_n, self.conductance()?);
        Ok(())
    }
}

impl Component for Resistor {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn set_parameter(&mut self, parameter: &str, value: Value) -> Result<()> {
        match parameter {
            "value" => self.value = value,
            _ => return Err(NodalError::unknown_parameter(&self.name, parameter)),
        }
        Ok(())
    }

    fn stamp_op(&self, ctx: &mut StampContext<'_, f64>, m: &mut SparseMatrix<f64>) -> Result<()> {
        self.stamp_numeric(ctx, m)
    }

    fn stamp_transient(
        &self,
        ctx: &mut StampContext<'_, f64>,
        g: &mut SparseMatrix<f64>,
        _cap: &mut SparseMatrix<f64>,
    ) -> Result<()> {
        self.stamp_numeric(ctx, g)
    }

    fn stamp_symbolic(
        &self,
        ctx: &mut StampContext<'_, Expr>,
        m: &mut SparseMatrix<Expr>,
    ) -> Result<()> {
        let id_p = ctx.net_id(self.p())?;
        let id_n = ctx.net_id(self.n())?;
        m.stamp_conductance(id_p, id_n, Expr::one() / self.value.to_expr());
        Ok(())
    }
}

/// A capacitor between `p` and `n`.
///
/// In the operating point the capacitor holds its initial voltage `dc`, so it
/// is stamped like a voltage source with its own current unknown
/// `I_initial_<n>_<p>`. In transient analysis it only contributes `C` to the
/// storage matrix, and in symbolic analysis it is the admittance `s·C`.
#[derive(Debug, Clone)]
pub struct Capacitor {
    pub name: String,
    /// Capacitance in farads, or a symbol
    pub value: Value,
    /// Initial voltage across the capacitor (p - n)
    pub dc: f64,
    ports: [Port; 2],
}

impl Capacitor {
    /// Create a new, initially discharged capacitor.
    pub fn new(name: &str, value: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
            dc: 0.0,
            ports: two_terminal(name),
        }
    }

    /// Set the initial voltage.
    pub fn with_dc(mut self, dc: f64) -> Self {
        self.dc = dc;
        self
    }

    pub fn p(&self) -> &Port {
        &self.ports[0]
    }

    pub fn n(&self) -> &Port {
        &self.ports[1]
    }
}

impl Component for Capacitor {
    fn name(&self) -> &str {
        &self.name
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }

    fn set_parameter(&mut self, parameter: &str, value: Value) -> Result<()> {
        match parameter {
            "value" => self.value = value,
            "dc" => self.dc = value.number(&self.name, "dc")?,
            _ => return Err(NodalError::unknown_parameter(&self.name, parameter)),
        }
        Ok(())
    }

    fn extra_unknowns(&self, analysis: Analysis) -> usize {
        match analysis {
            Analysis::OperatingPoint => 1,
            Analysis::Transient | Analysis::Symbolic => 0,
        }
    }

    fn stamp_op(&self, ctx: &mut StampContext<'_, f64>, m: &mut SparseMatrix<f64>) -> Result<()> {
        let id_p = ctx.net_id(self.p())?;
        let id_n = ctx.net_id(self.n())?;
        let row = ctx.require_extra_row(&self.name)?;

        m.stamp_branch(row, id_p, id_n);
        ctx.add_rhs(row, self.dc);
        ctx.push_variable(format!("I_initial_{}_{}", id_n, id_p));
        Ok(())
    }

    fn stamp_transient(
        &self,
        ctx: &mut StampContext<'_, f64>,
        _g: &mut SparseMatrix<f64>,
        cap: &mut SparseMatrix<f64>,
    ) -> Result<()> {
        let id_p = ctx.net_id(self.p())?;
        let id_n = ctx.net_id(self.n())?;
        cap.stamp_conductance(id_p, id_n, self.value.number(&self.name, "value")?);
        Ok(())
    }

    fn stamp_symbolic(
        &self,
        ctx: &mut StampContext<'_, Expr>,
        m: &mut SparseMatrix<Expr>,
    ) -> Result<()> {
        let id_p = ctx.net_id(self.p())?;
        let id_n = ctx.net_id(self.n())?;
        m.stamp_conductance(id_p, id_n, Expr::laplace() * self.value.to_expr());
        Ok(())
    }
}
