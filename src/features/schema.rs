//! Canonical campaign feature schema and input validation.
//!
//! Column order is the order the models were trained with; encoders and the
//! prediction engine select columns through [`FeatureSchema::names`].

use super::{FeatureRecord, Vocabularies};
use serde_json::{Number, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Extra column the ROI model consumes after the 13 canonical features.
pub const CONVERSIONS_FIELD: &str = "Conversions";

const FEATURES: [(&str, FeatureKind); 13] = [
    ("Ad Spend", FeatureKind::Numeric),
    ("Clicks", FeatureKind::Numeric),
    ("Impressions", FeatureKind::Numeric),
    ("Conversion Rate", FeatureKind::Numeric),
    ("Click-Through Rate (CTR)", FeatureKind::Numeric),
    ("Cost Per Click (CPC)", FeatureKind::Numeric),
    ("Cost Per Conversion", FeatureKind::Numeric),
    ("Customer Acquisition Cost (CAC)", FeatureKind::Numeric),
    ("Campaign Type", FeatureKind::Categorical),
    ("Region", FeatureKind::Categorical),
    ("Industry", FeatureKind::Categorical),
    ("Company Size", FeatureKind::Categorical),
    ("Seasonality Factor", FeatureKind::Numeric),
];

const VOCABULARIES: [(&str, &[&str]); 4] = [
    ("Campaign Type", &["Search Ads", "Display Ads", "Email", "Social Media"]),
    ("Region", &["South America", "North America", "Asia", "Europe"]),
    ("Industry", &["Tech", "Healthcare", "Finance", "Retail", "Manufacturing"]),
    ("Company Size", &["Small"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("expected {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },

    #[error("missing feature `{0}`")]
    MissingFeature(String),

    #[error("unknown feature `{0}`")]
    UnknownFeature(String),

    #[error("invalid category for {feature}: {value}")]
    InvalidCategory { feature: String, value: String },

    #[error("invalid numeric value for {feature}")]
    InvalidNumeric { feature: String },

    #[error("invalid columns; expected {expected:?}, got {got:?}")]
    Columns { expected: Vec<String>, got: Vec<String> },

    #[error("{}", join_issues(.0))]
    Table(Vec<ColumnIssue>),
}

/// One offending column found while validating a batch table.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColumnIssue {
    #[error("invalid category in {column}: {values:?}")]
    InvalidCategories { column: String, values: Vec<String> },

    /// `rows` are 1-based data row numbers.
    #[error("non-numeric values in {column} (rows {rows:?})")]
    NonNumeric { column: String, rows: Vec<usize> },
}

impl ColumnIssue {
    pub fn column(&self) -> &str {
        match self {
            ColumnIssue::InvalidCategories { column, .. } | ColumnIssue::NonNumeric { column, .. } => {
                column
            }
        }
    }
}

fn join_issues(issues: &[ColumnIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn numeric_value(value: &Value) -> Option<Number> {
    let v = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_number(s)?,
        _ => return None,
    };
    Number::from_f64(v)
}

#[derive(Debug, Clone)]
pub struct FeatureSchema {
    features: Vec<(String, FeatureKind)>,
    vocabularies: HashMap<String, Vec<String>>,
}

impl Default for FeatureSchema {
    fn default() -> Self {
        Self::marketing()
    }
}

impl FeatureSchema {
    /// The 13-feature campaign schema the production models were trained on.
    pub fn marketing() -> Self {
        Self {
            features: FEATURES
                .iter()
                .map(|(name, kind)| (name.to_string(), *kind))
                .collect(),
            vocabularies: VOCABULARIES
                .iter()
                .map(|(name, values)| {
                    (name.to_string(), values.iter().map(|v| v.to_string()).collect())
                })
                .collect(),
        }
    }

    /// Canonical feature names, in model column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn kind(&self, name: &str) -> Option<FeatureKind> {
        self.features
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, k)| *k)
    }

    pub fn categorical(&self) -> impl Iterator<Item = &str> {
        self.by_kind(FeatureKind::Categorical)
    }

    pub fn numeric(&self) -> impl Iterator<Item = &str> {
        self.by_kind(FeatureKind::Numeric)
    }

    fn by_kind(&self, kind: FeatureKind) -> impl Iterator<Item = &str> {
        self.features
            .iter()
            .filter(move |(_, k)| *k == kind)
            .map(|(n, _)| n.as_str())
    }

    /// Closed validation vocabulary for a categorical feature.
    pub fn vocabulary(&self, feature: &str) -> Option<&[String]> {
        self.vocabularies.get(feature).map(Vec::as_slice)
    }

    /// Label-encoder class order for each categorical feature: the validation
    /// vocabulary sorted lexicographically.
    pub fn sorted_vocabularies(&self) -> Vocabularies {
        self.vocabularies
            .iter()
            .map(|(feature, values)| {
                let mut sorted = values.clone();
                sorted.sort();
                (feature.clone(), sorted)
            })
            .collect()
    }

    /// Build a record from a positional list of 13 values and validate it.
    pub fn record_from_values(&self, values: &[Value]) -> Result<FeatureRecord, SchemaError> {
        if values.len() != self.len() {
            return Err(SchemaError::FeatureCount {
                expected: self.len(),
                got: values.len(),
            });
        }
        let record = FeatureRecord::from_pairs(self.names().zip(values.iter().cloned()));
        self.validate(&record)
    }

    /// Validate a record, failing on the first violation.
    ///
    /// On success returns the record normalized to canonical order, with
    /// numeric fields as JSON numbers.
    pub fn validate(&self, record: &FeatureRecord) -> Result<FeatureRecord, SchemaError> {
        if let Some(unknown) = record.names().find(|n| self.kind(n).is_none()) {
            return Err(SchemaError::UnknownFeature(unknown.to_string()));
        }
        if let Some(missing) = self.names().find(|n| !record.contains(n)) {
            return Err(SchemaError::MissingFeature(missing.to_string()));
        }

        for feature in self.categorical() {
            let value = record.get(feature).unwrap_or(&Value::Null);
            let known = value
                .as_str()
                .zip(self.vocabulary(feature))
                .is_some_and(|(v, vocab)| vocab.iter().any(|c| c == v));
            if !known {
                return Err(SchemaError::InvalidCategory {
                    feature: feature.to_string(),
                    value: display_value(value),
                });
            }
        }

        let mut out = FeatureRecord::new();
        for (name, kind) in &self.features {
            let value = record.get(name).unwrap_or(&Value::Null);
            match kind {
                FeatureKind::Categorical => {
                    out.insert(name.as_str(), value.clone());
                }
                FeatureKind::Numeric => {
                    let n = numeric_value(value).ok_or_else(|| SchemaError::InvalidNumeric {
                        feature: name.clone(),
                    })?;
                    out.insert(name.as_str(), Value::Number(n));
                }
            }
        }
        Ok(out)
    }

    /// Validate an uploaded table.
    ///
    /// The header must equal the canonical column list exactly, order
    /// included. Every offending column is collected before the table is
    /// rejected.
    pub fn validate_table(
        &self,
        columns: &[String],
        rows: &[Vec<String>],
    ) -> Result<Vec<FeatureRecord>, SchemaError> {
        if !columns.iter().map(String::as_str).eq(self.names()) {
            return Err(SchemaError::Columns {
                expected: self.names().map(str::to_string).collect(),
                got: columns.to_vec(),
            });
        }

        let mut issues = Vec::new();

        for (col, (name, kind)) in self.features.iter().enumerate() {
            if *kind != FeatureKind::Categorical {
                continue;
            }
            let vocab = self.vocabulary(name).unwrap_or(&[]);
            let mut invalid: Vec<String> = Vec::new();
            for row in rows {
                let v = cell(row, col);
                if !vocab.iter().any(|c| c == v) && !invalid.iter().any(|i| i == v) {
                    invalid.push(v.to_string());
                }
            }
            if !invalid.is_empty() {
                issues.push(ColumnIssue::InvalidCategories {
                    column: name.clone(),
                    values: invalid,
                });
            }
        }

        for (col, (name, kind)) in self.features.iter().enumerate() {
            if *kind != FeatureKind::Numeric {
                continue;
            }
            let bad: Vec<usize> = rows
                .iter()
                .enumerate()
                .filter(|(_, row)| parse_number(cell(row, col)).is_none())
                .map(|(i, _)| i + 1)
                .collect();
            if !bad.is_empty() {
                issues.push(ColumnIssue::NonNumeric {
                    column: name.clone(),
                    rows: bad,
                });
            }
        }

        if !issues.is_empty() {
            return Err(SchemaError::Table(issues));
        }

        rows.iter()
            .map(|row| {
                let record = FeatureRecord::from_pairs(
                    self.names()
                        .enumerate()
                        .map(|(col, name)| (name, Value::String(cell(row, col).to_string()))),
                );
                self.validate(&record)
            })
            .collect()
    }

    /// Reference campaign used to seed the dashboard before any input arrives.
    pub fn default_record(&self) -> FeatureRecord {
        FeatureRecord::from_pairs([
            ("Ad Spend", Value::from(5000.0)),
            ("Clicks", Value::from(1000.0)),
            ("Impressions", Value::from(50000.0)),
            ("Conversion Rate", Value::from(0.05)),
            ("Click-Through Rate (CTR)", Value::from(0.02)),
            ("Cost Per Click (CPC)", Value::from(5.0)),
            ("Cost Per Conversion", Value::from(100.0)),
            ("Customer Acquisition Cost (CAC)", Value::from(200.0)),
            ("Campaign Type", Value::from("Search Ads")),
            ("Region", Value::from("North America")),
            ("Industry", Value::from("Retail")),
            ("Company Size", Value::from("Small")),
            ("Seasonality Factor", Value::from(1.0)),
        ])
    }
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
