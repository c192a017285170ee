// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "UPPERCASE")]
pub enum Value {
    Float(f64),
    Sint64(i64),
    Uint64(u64),
    Boolean(bool),
    String(String),
    Timestamp(DateTime<Utc>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{}", v),
            Value::Sint64(v) => write!(f, "{}", v),
            Value::Uint64(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Timestamp(v) => f.write_str(&v.to_rfc3339()),
        }
    }
}

/// Parameter definition as shown next to its value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub qualified_name: String,

    #[serde(default)]
    pub short_description: Option<String>,

    #[serde(default)]
    pub units: Option<String>,
}

impl Parameter {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            short_description: None,
            units: None,
        }
    }
}

/// Current value of a parameter in both representations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterValue {
    pub raw_value: Value,

    /// Engineering units representation
    pub eng_value: Value,

    #[serde(default)]
    pub generation_time: Option<DateTime<Utc>>,
}

impl ParameterValue {
    pub fn new(raw_value: Value, eng_value: Value) -> Self {
        Self {
            raw_value,
            eng_value,
            generation_time: None,
        }
    }
}
