//! Categorical encoding: trained label-encoder vocabularies → integer codes.

use super::{EncodedRecord, FeatureRecord};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Feature name → class list in the order the trained encoder assigned codes.
pub type Vocabularies = HashMap<String, Vec<String>>;

#[derive(Debug, Clone, Default)]
pub struct CategoricalEncoder {
    vocabularies: Vocabularies,
}

impl CategoricalEncoder {
    pub fn new(vocabularies: Vocabularies) -> Self {
        Self { vocabularies }
    }

    pub fn vocabularies(&self) -> &Vocabularies {
        &self.vocabularies
    }

    /// Code for one categorical value. Unseen values map to 0, the first
    /// trained class.
    pub fn code(&self, feature: &str, value: &str) -> Option<usize> {
        let classes = self.vocabularies.get(feature)?;
        Some(classes.iter().position(|c| c == value).unwrap_or(0))
    }

    /// Encode every field of `record` to `f64`.
    ///
    /// Categorical fields become their vocabulary index (0 when unseen).
    /// Other fields are coerced to numbers; anything non-numeric becomes 0.0.
    /// Never fails.
    pub fn encode(&self, record: &FeatureRecord) -> EncodedRecord {
        let mut out = EncodedRecord::default();
        for (name, value) in record.iter() {
            let encoded = match self.vocabularies.get(name) {
                Some(classes) => {
                    let raw = match value {
                        Value::String(s) => s.as_str(),
                        _ => "",
                    };
                    match classes.iter().position(|c| c == raw) {
                        Some(idx) => idx as f64,
                        None => {
                            warn!(feature = name, value = %value, "unseen category; using class 0");
                            0.0
                        }
                    }
                }
                None => match record.number(name) {
                    Some(v) if v.is_finite() => v,
                    _ => {
                        debug!(feature = name, value = %value, "non-numeric field zeroed");
                        0.0
                    }
                },
            };
            out.set(name, encoded);
        }
        out
    }
}
