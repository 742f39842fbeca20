//! Error types for the nodal analysis kernel.
//!
//! This module provides a unified error type [`NodalError`] that covers
//! configuration mistakes made while building a circuit, numerical failures
//! reported by the solvers, and broken invariants in component stamping.

use thiserror::Error;

use crate::circuit::Analysis;

/// Result type alias using [`NodalError`].
pub type Result<T> = std::result::Result<T, NodalError>;

/// Unified error type for all kernel operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodalError {
    // ============ Configuration Errors ============
    /// A port with no connections was looked up during stamping
    #[error("Port '{port}' is not connected to anything")]
    UnconnectedPort { port: String },

    /// A component has no port with the requested name
    #[error("Component '{component}' has no port named '{port}'")]
    UnknownPort { component: String, port: String },

    /// No component in the circuit has the requested id
    #[error("Circuit has no component {id}")]
    UnknownComponent { id: String },

    /// A component has no parameter with the requested name
    #[error("Component '{component}' has no parameter named '{parameter}'")]
    UnknownParameter { component: String, parameter: String },

    /// A parameter needed by the requested analysis was not supplied
    #[error("Component '{component}' needs a value for '{parameter}' in this analysis")]
    MissingParameter { component: String, parameter: String },

    /// A symbolic parameter reached a numeric analysis
    #[error("Parameter '{parameter}' of '{component}' is the symbol '{symbol}'; numeric analyses need a number")]
    SymbolicValue {
        component: String,
        parameter: String,
        symbol: String,
    },

    /// An expression was evaluated without a value for one of its symbols
    #[error("No value bound to symbol '{symbol}'")]
    UnboundSymbol { symbol: String },

    /// The default stamping behaviour was reached for a port kind it cannot handle
    #[error("Component '{component}' must specialize {analysis} stamping")]
    NotSpecialized { component: String, analysis: Analysis },

    /// Circuit has no components
    #[error("Circuit has no components")]
    EmptyCircuit,

    /// Invalid simulation parameter
    #[error("Invalid simulation parameter: {message}")]
    InvalidSimulationParam { message: String },

    // ============ Numerical Errors ============
    /// Matrix is singular and cannot be solved
    #[error("Singular matrix - circuit may have a floating node or a loop of voltage sources")]
    SingularMatrix,

    /// Operands of a solve do not agree in size
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Exact polynomial division failed during symbolic elimination
    #[error("Symbolic elimination lost exactness (coefficients too ill-conditioned)")]
    InexactDivision,

    // ============ Invariant Violations ============
    /// A transient unknown has no counterpart in the operating point
    #[error("Transient variable '{variable}' has no operating-point value")]
    MissingInitialCondition { variable: String },

    /// A component appended a different number of unknowns than it declared
    #[error("Component '{component}' declared {declared} extra unknowns but added {added}")]
    ExtraRowMismatch {
        component: String,
        declared: usize,
        added: usize,
    },

    /// A component asked for its extra row without declaring one
    #[error("Component '{component}' has no extra row in {analysis} analysis")]
    MissingExtraRow { component: String, analysis: Analysis },

    /// Net ids were read before `assign_net_ids` (or after a later merge)
    #[error("Net ids are not assigned; call assign_net_ids after the last connection")]
    NetIdsNotAssigned,
}

impl NodalError {
    /// Create an unconnected port error
    pub fn unconnected(port: impl ToString) -> Self {
        Self::UnconnectedPort {
            port: port.to_string(),
        }
    }

    /// Create a missing parameter error
    pub fn missing_parameter(component: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::MissingParameter {
            component: component.into(),
            parameter: parameter.into(),
        }
    }

    /// Create an unknown parameter error
    pub fn unknown_parameter(component: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::UnknownParameter {
            component: component.into(),
            parameter: parameter.into(),
        }
    }

    /// Create a not-specialized error
    pub fn not_specialized(component: impl Into<String>, analysis: Analysis) -> Self {
        Self::NotSpecialized {
            component: component.into(),
            analysis,
        }
    }

    /// Create an invalid simulation parameter error
    pub fn invalid_param(message: impl Into<String>) -> Self {
        Self::InvalidSimulationParam {
            message: message.into(),
        }
    }
}
