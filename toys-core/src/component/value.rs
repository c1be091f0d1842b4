//! Property values and attribute coercion.
//!
//! Attributes are strings; properties are loosely typed. A property value
//! read from an attribute goes through two steps: the literal-token table in
//! [`coerce_attribute`], then the coercion function the component declared
//! for that property (one of the [`coerce`] functions, or its own).

use std::fmt;

use crate::reactive::StrictEq;

/// A loosely typed property value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

/// Every variant is a primitive, so strict equality is value equality.
impl StrictEq for Value {
    fn strict_eq(&self, other: &Self) -> bool {
        self == other
    }
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// `null` or `undefined`.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{n:.0}")
    } else {
        n.to_string()
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Per-property coercion declared by a component.
pub type Coercer = fn(Value) -> Value;

/// Map a raw attribute through the literal-token table.
///
/// | attribute        | value              |
/// |------------------|--------------------|
/// | `"null"`         | `Null`             |
/// | `"undefined"`    | `Undefined`        |
/// | `"NaN"`          | `Number(NaN)`      |
/// | `"false"`        | `Bool(false)`      |
/// | `"true"`         | `Bool(true)`       |
/// | empty or missing | `String("")`       |
/// | anything else    | the string as is   |
pub fn coerce_attribute(raw: Option<&str>) -> Value {
    match raw.unwrap_or_default() {
        "null" => Value::Null,
        "undefined" => Value::Undefined,
        "NaN" => Value::Number(f64::NAN),
        "false" => Value::Bool(false),
        "true" => Value::Bool(true),
        other => Value::String(other.to_string()),
    }
}

/// Coercion functions with the usual loose-typing semantics.
pub mod coerce {
    use super::Value;

    /// Convert to a string.
    pub fn string(value: Value) -> Value {
        match value {
            Value::String(_) => value,
            other => Value::String(other.to_string()),
        }
    }

    /// Convert to a number; unparseable strings become `NaN`.
    pub fn number(value: Value) -> Value {
        Value::Number(match value {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(b)),
            Value::Number(n) => n,
            Value::String(s) => parse_number(&s),
        })
    }

    /// Convert to a boolean by truthiness.
    pub fn boolean(value: Value) -> Value {
        Value::Bool(value.is_truthy())
    }

    /// Keep the value as the attribute table produced it.
    pub fn identity(value: Value) -> Value {
        value
    }

    fn parse_number(s: &str) -> f64 {
        let s = s.trim();
        if s.is_empty() {
            return 0.0;
        }
        match s {
            "Infinity" | "+Infinity" => return f64::INFINITY,
            "-Infinity" => return f64::NEG_INFINITY,
            _ => {}
        }
        let radix = match s.get(..2) {
            Some("0x") | Some("0X") => Some(16),
            Some("0o") | Some("0O") => Some(8),
            Some("0b") | Some("0B") => Some(2),
            _ => None,
        };
        if let Some(radix) = radix {
            return u64::from_str_radix(&s[2..], radix).map_or(f64::NAN, |n| n as f64);
        }
        let plain = s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));
        if !plain {
            return f64::NAN;
        }
        s.parse().unwrap_or(f64::NAN)
    }
}
