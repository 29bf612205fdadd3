//! Campaign feature records: canonical schema, validation and categorical encoding.

mod encoder;
mod schema;

pub use encoder::{CategoricalEncoder, Vocabularies};
pub use schema::{ColumnIssue, FeatureKind, FeatureSchema, SchemaError, CONVERSIONS_FIELD};

use crate::error::PredictError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Feature name → raw value, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRecord {
    fields: Map<String, Value>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Numeric view of a field; strings are parsed, anything else is `None`.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.fields.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// String view of a field.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Record with every field coerced to `f64`, ready for column selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodedRecord {
    values: HashMap<String, f64>,
}

impl EncodedRecord {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }
}

/// Which metrics a prediction request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Conversions,
    Roi,
    #[default]
    Both,
}

impl ModelType {
    pub fn includes_conversions(self) -> bool {
        matches!(self, ModelType::Conversions | ModelType::Both)
    }

    pub fn includes_roi(self) -> bool {
        matches!(self, ModelType::Roi | ModelType::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModelType::Conversions => "conversions",
            ModelType::Roi => "roi",
            ModelType::Both => "both",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = PredictError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "conversions" => Ok(ModelType::Conversions),
            "roi" => Ok(ModelType::Roi),
            "both" => Ok(ModelType::Both),
            other => Err(PredictError::InvalidModelType(other.to_string())),
        }
    }
}
