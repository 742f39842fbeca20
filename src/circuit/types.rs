//! Core types for circuit representation.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{NodalError, Result};
use crate::symbolic::Expr;

/// Source of fresh port identities. Identity 0 is reserved for ground.
static NEXT_PORT_ID: AtomicUsize = AtomicUsize::new(1);

/// Identity of a port. Ports compare by identity, never by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortId(pub usize);

impl PortId {
    /// The ground singleton (always identity 0).
    pub const GROUND: PortId = PortId(0);

    /// Allocate a new, process-unique port identity.
    pub fn fresh() -> Self {
        PortId(NEXT_PORT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Check if this is the ground port.
    pub fn is_ground(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ground() {
            write!(f, "GND")
        } else {
            write!(f, "P{}", self.0)
        }
    }
}

/// The ground terminal. It belongs to no component.
pub const GND: PortId = PortId::GROUND;

/// What the default stamping behaviour knows about a port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PortKind {
    /// An ordinary terminal; its component must stamp it explicitly.
    Plain,
    /// A terminal injecting a fixed current into its net.
    Current { dc: f64 },
    /// A terminal held at a fixed voltage.
    Voltage { dc: f64 },
}

/// A named terminal of a component.
#[derive(Debug, Clone)]
pub struct Port {
    id: PortId,
    name: String,
    owner: Option<String>,
    kind: PortKind,
}

impl Port {
    /// Create a plain port owned by `owner`.
    pub fn new(owner: &str, name: &str) -> Self {
        Self::with_kind(owner, name, PortKind::Plain)
    }

    /// Create a fixed-current port.
    pub fn current(owner: &str, name: &str, dc: f64) -> Self {
        Self::with_kind(owner, name, PortKind::Current { dc })
    }

    /// Create a fixed-voltage port.
    pub fn voltage(owner: &str, name: &str, dc: f64) -> Self {
        Self::with_kind(owner, name, PortKind::Voltage { dc })
    }

    fn with_kind(owner: &str, name: &str, kind: PortKind) -> Self {
        Self {
            id: PortId::fresh(),
            name: name.to_string(),
            owner: Some(owner.to_string()),
            kind,
        }
    }

    /// A handle on the ground singleton.
    pub fn ground() -> Self {
        Self {
            id: PortId::GROUND,
            name: "GND".to_string(),
            owner: None,
            kind: PortKind::Plain,
        }
    }

    pub fn id(&self) -> PortId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning component (`None` only for ground).
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn kind(&self) -> PortKind {
        self.kind
    }

    pub fn is_ground(&self) -> bool {
        self.id.is_ground()
    }
}

impl PartialEq for Port {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Port {}

impl From<&Port> for PortId {
    fn from(port: &Port) -> Self {
        port.id
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{}.{}", owner, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// A unique identifier for a component in the circuit (its position in the
/// component list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentId(pub usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// The analysis a stamping call is made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Analysis {
    /// DC steady state
    OperatingPoint,
    /// Time-domain stepping
    Transient,
    /// Laplace-domain, parametric
    Symbolic,
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Analysis::OperatingPoint => write!(f, "operating-point"),
            Analysis::Transient => write!(f, "transient"),
            Analysis::Symbolic => write!(f, "symbolic"),
        }
    }
}

/// A component parameter: either a number or a named symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Symbol(String),
}

impl Value {
    /// The numeric value, or an error naming the component and parameter.
    pub fn number(&self, component: &str, parameter: &str) -> Result<f64> {
        match self {
            Value::Number(v) => Ok(*v),
            Value::Symbol(symbol) => Err(NodalError::SymbolicValue {
                component: component.to_string(),
                parameter: parameter.to_string(),
                symbol: symbol.clone(),
            }),
        }
    }

    /// The value as a symbolic expression.
    pub fn to_expr(&self) -> Expr {
        match self {
            Value::Number(v) => Expr::constant(*v),
            Value::Symbol(symbol) => Expr::symbol(symbol),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(symbol: &str) -> Self {
        Value::Symbol(symbol.to_string())
    }
}

impl From<String> for Value {
    fn from(symbol: String) -> Self {
        Value::Symbol(symbol)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(v) => write!(f, "{}", v),
            Value::Symbol(s) => write!(f, "{}", s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ports_are_distinct() {
        let a = Port::new("R1", "p");
        let b = Port::new("R1", "p");
        assert_ne!(a, b);
        assert!(!a.is_ground());
        assert_eq!(a.to_string(), "R1.p");
    }

    #[test]
    fn test_ground_singleton() {
        assert_eq!(Port::ground(), Port::ground());
        assert_eq!(Port::ground().id(), GND);
        assert_eq!(Port::ground().to_string(), "GND");
        assert!(Port::ground().owner().is_none());
    }

    #[test]
    fn test_symbolic_value_in_numeric_context() {
        let v = Value::from("gm");
        assert!(matches!(
            v.number("M1", "gm"),
            Err(NodalError::SymbolicValue { .. })
        ));
        assert_eq!(Value::from(2.0).number("R1", "value").unwrap(), 2.0);
    }
}
