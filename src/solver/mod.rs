//! MNA (Modified Nodal Analysis) assembly and analysis drivers.
//!
//! ## Modified Nodal Analysis
//!
//! MNA assembles a system of equations Mx = b where:
//! - x contains one voltage per net followed by the extra unknowns
//!   (branch currents) that components declare
//! - M is the conductance/coefficient matrix
//! - b is the source vector
//!
//! Every component adds its contribution at the rows of its nets and of its
//! own extra rows. The ground net's row and column are deleted afterwards,
//! which is what makes the system non-singular.
//!
//! Transient analysis keeps a second matrix `Cap` for charge storage and
//! integrates `G·v + Cap·dv/dt = B` with backward Euler.

mod config;
mod linear;
mod mna;
mod operating_point;
mod sparse;
mod symbolic;
mod transient;

pub use config::SolverConfig;
pub use linear::{solve, solve_dense, solve_sparse};
pub use mna::{GroundElimination, StampContext, StepContext};
pub use operating_point::OpResult;
pub use sparse::{remove_entries, Scalar, SparseMatrix};
pub use symbolic::SymbolicResult;
pub use transient::TransientResult;

/// Systems with this many or more unknowns use the sparse solver path.
pub const DEFAULT_SPARSE_THRESHOLD: usize = 50;

/// Transient progress log interval, in percent.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 3;

/// Relative tolerance for dropping symbolic coefficients.
pub const DEFAULT_ZERO_TOLERANCE: f64 = 1e-12;

/// Largest number of stored transient time points.
pub const DEFAULT_MAX_TIME_POINTS: usize = 10_000_000;
