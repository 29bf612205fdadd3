//! Deviation status: how a prediction compares with its baseline model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative deviation beyond which a prediction counts as a change.
pub const DEVIATION_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Positive,
    Negative,
    Moderate,
}

impl Status {
    /// Classify `predicted` against `actual`.
    ///
    /// A zero baseline is always moderate. Otherwise the relative difference
    /// `(predicted - actual) / |actual|` must strictly exceed the band.
    pub fn classify(predicted: f64, actual: f64) -> Self {
        if actual == 0.0 {
            return Status::Moderate;
        }
        let relative_diff = (predicted - actual) / actual.abs();
        if relative_diff > DEVIATION_BAND {
            Status::Positive
        } else if relative_diff < -DEVIATION_BAND {
            Status::Negative
        } else {
            Status::Moderate
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Positive => "positive",
            Status::Negative => "negative",
            Status::Moderate => "moderate",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
