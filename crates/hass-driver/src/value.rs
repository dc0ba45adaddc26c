//! Typed point values and the casts between them.

use crate::error::{DriverError, DriverResult};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Value written to a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PointValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl PointValue {
    /// Integer view; booleans count as 0/1.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Boolean(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Numeric view over integers, floats and booleans.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Boolean(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// JSON number for a numeric value, keeping integers integral.
    pub fn to_json_number(&self) -> Option<JsonValue> {
        match self {
            Self::Integer(v) => Some(JsonValue::from(*v)),
            Self::Boolean(v) => Some(JsonValue::from(i64::from(*v))),
            Self::Float(v) => serde_json::Number::from_f64(*v).map(JsonValue::Number),
            Self::String(_) => None,
        }
    }

    /// Convert a JSON scalar into a point value.
    ///
    /// Arrays, objects and null have no point representation.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Bool(b) => Some(Self::Boolean(*b)),
            JsonValue::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            JsonValue::String(s) => Some(Self::String(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for PointValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for PointValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for PointValue {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<f64> for PointValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for PointValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for PointValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<bool> for PointValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<PointValue> for JsonValue {
    fn from(v: PointValue) -> Self {
        match v {
            PointValue::Integer(i) => JsonValue::from(i),
            PointValue::Float(f) => serde_json::Number::from_f64(f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            PointValue::String(s) => JsonValue::String(s),
            PointValue::Boolean(b) => JsonValue::Bool(b),
        }
    }
}

/// Declared type of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointType {
    #[default]
    String,
    Integer,
    Float,
    Boolean,
}

impl PointType {
    /// Parse a registry type name. Unknown names fall back to string.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "int" | "integer" => Self::Integer,
            "float" => Self::Float,
            "bool" | "boolean" => Self::Boolean,
            _ => Self::String,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
        }
    }

    /// Cast a value to this type.
    pub fn cast(&self, value: &PointValue) -> DriverResult<PointValue> {
        let cast = match (self, value) {
            (Self::String, v) => Some(PointValue::String(v.to_string())),

            (Self::Integer, PointValue::Integer(v)) => Some(PointValue::Integer(*v)),
            (Self::Integer, PointValue::Float(v)) if v.is_finite() => {
                Some(PointValue::Integer(v.trunc() as i64))
            }
            (Self::Integer, PointValue::Boolean(v)) => Some(PointValue::Integer(i64::from(*v))),
            (Self::Integer, PointValue::String(s)) => {
                s.trim().parse::<i64>().ok().map(PointValue::Integer)
            }

            (Self::Float, PointValue::String(s)) => {
                s.trim().parse::<f64>().ok().map(PointValue::Float)
            }
            (Self::Float, v) => v.as_f64().map(PointValue::Float),

            (Self::Boolean, PointValue::Boolean(v)) => Some(PointValue::Boolean(*v)),
            (Self::Boolean, PointValue::Integer(v)) => Some(PointValue::Boolean(*v != 0)),
            (Self::Boolean, PointValue::Float(v)) => Some(PointValue::Boolean(*v != 0.0)),
            (Self::Boolean, PointValue::String(s)) => parse_bool(s).map(PointValue::Boolean),

            _ => None,
        };

        cast.ok_or_else(|| DriverError::Cast {
            value: format!("{:?}", value),
            target: *self,
        })
    }
}

impl fmt::Display for PointType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}
