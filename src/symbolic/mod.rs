//! Symbolic backend: rational functions of named symbols.
//!
//! Component values given as symbols (and the Laplace variable `s` for
//! reactive elements) become [`Expr`] entries of the MNA matrix, and
//! [`solve_symbolic`] returns each unknown as a simplified rational function.
//!
//! Coefficients are `f64`. Eliminations are fraction-free, so round-off only
//! enters through the coefficients themselves; cancellation residues are
//! dropped with a relative tolerance (see [`SolverConfig::zero_tolerance`]).
//!
//! [`SolverConfig::zero_tolerance`]: crate::solver::SolverConfig::zero_tolerance

mod expr;
mod poly;
mod solve;

pub use expr::Expr;
pub use poly::{Monomial, Poly};
pub use solve::solve_symbolic;

/// Name of the Laplace variable used by reactive stamps.
pub const LAPLACE_VARIABLE: &str = "s";
