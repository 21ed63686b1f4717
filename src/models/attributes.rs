//! Typed attribute values used when assigning attributes by name.

use std::fmt;

use serde_json::Value;

/// Declared type of an assignable attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Text,
    OptionalText,
    Integer,
    Float,
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrType::Text => write!(f, "a string"),
            AttrType::OptionalText => write!(f, "a string"),
            AttrType::Integer => write!(f, "an integer"),
            AttrType::Float => write!(f, "a float"),
        }
    }
}

/// A parsed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
}

impl AttrValue {
    /// Convert to the declared type. Integers widen to floats; every other
    /// mismatch is rejected.
    pub fn coerce(self, ty: AttrType) -> Option<AttrValue> {
        match (ty, self) {
            (AttrType::Text | AttrType::OptionalText, v @ AttrValue::Str(_)) => Some(v),
            (AttrType::Integer, v @ AttrValue::Int(_)) => Some(v),
            (AttrType::Float, v @ AttrValue::Float(_)) => Some(v),
            (AttrType::Float, AttrValue::Int(i)) => Some(AttrValue::Float(i as f64)),
            _ => None,
        }
    }

    /// Parse console text into the declared type.
    pub fn parse_as(raw: &str, ty: AttrType) -> Option<AttrValue> {
        match ty {
            AttrType::Text | AttrType::OptionalText => Some(AttrValue::Str(raw.to_string())),
            AttrType::Integer => raw.parse().ok().map(AttrValue::Int),
            AttrType::Float => raw
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(AttrValue::Float),
        }
    }

    /// Convert a JSON scalar.
    pub fn from_json(value: &Value) -> Option<AttrValue> {
        match value {
            Value::String(s) => Some(AttrValue::Str(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(AttrValue::Int)
                .or_else(|| n.as_f64().map(AttrValue::Float)),
            _ => None,
        }
    }

    pub(crate) fn into_text(self) -> Option<String> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub(crate) fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(f) => Some(*f),
            AttrValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}
