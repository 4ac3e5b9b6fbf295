//! State inspection for debugging and tests.
//!
//! Every component exposes its internal state through dotted query paths.
//! Queries never affect emulation state: reading the IFR through `query`
//! does not clear anything, unlike a processor read of the same register.

use std::fmt;

/// A dynamically-typed value returned by a state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Line level or mode flag.
    Bool(bool),
    /// Register contents.
    U8(u8),
    /// Timer latch or 16-bit counter view.
    U16(u16),
    /// Raw signed counter (may be transiently negative).
    I32(i32),
    /// Descriptive text, e.g. a decoded mode name.
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U16(v) => write!(f, "{v:#06X}"),
            Value::I32(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A component whose state can be inspected.
pub trait Observable {
    /// Query a property by dotted path, e.g. `t1.counter` or `via.ifr`.
    ///
    /// Returns `None` if the path is not recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// All paths accepted by `query()`.
    fn query_paths(&self) -> &'static [&'static str];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_registers_as_hex() {
        assert_eq!(Value::U8(0x0A).to_string(), "0x0A");
        assert_eq!(Value::U16(0x1234).to_string(), "0x1234");
        assert_eq!(Value::I32(-2).to_string(), "-2");
        assert_eq!(Value::from("one-shot").to_string(), "one-shot");
    }
}
