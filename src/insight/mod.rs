//! Natural-language explanations for a prediction: prompt construction and
//! the suggestion source that answers it.

mod gemini;

pub use gemini::GeminiClient;

use crate::features::FeatureRecord;
use crate::predict::Status;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuggestionError {
    #[error("request failed: {0}")]
    Http(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("failed to parse suggestion response")]
    MalformedResponse,
}

/// Produces explanatory text for a prompt.
pub trait SuggestionSource: Send + Sync {
    fn suggest(&self, prompt: &str) -> Result<String, SuggestionError>;
}

impl<F> SuggestionSource for F
where
    F: Fn(&str) -> Result<String, SuggestionError> + Send + Sync,
{
    fn suggest(&self, prompt: &str) -> Result<String, SuggestionError> {
        self(prompt)
    }
}

/// Text stored in place of a suggestion when the source fails.
pub fn unavailable_message(err: &SuggestionError) -> String {
    format!("Unable to fetch suggestions ({err})")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Conversions,
    Roi,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Metric::Conversions => "conversions",
            Metric::Roi => "ROI",
        })
    }
}

/// Prompt asking for a one-sentence explanation of the deviation and two strategies.
pub fn build_prompt(
    metric: Metric,
    status: Status,
    predicted: f64,
    actual: f64,
    record: &FeatureRecord,
) -> String {
    let (comparison, cause, goal) = match status {
        Status::Positive => (
            "exceeds",
            "why this improvement occurred",
            format!("sustain or further increase {metric}"),
        ),
        Status::Negative => (
            "is below",
            "why this decline occurred",
            format!("improve {metric}"),
        ),
        Status::Moderate => (
            "is stable compared to",
            "why performance is stable",
            format!("enhance {metric}"),
        ),
    };
    let text = |name: &str| record.text(name).unwrap_or("unknown").to_string();
    let num = |name: &str| record.number(name).unwrap_or(0.0);

    format!(
        "Predicted {metric} of {predicted:.2} {comparison} actual {metric} of {actual:.2} for a {} campaign \
         in {} targeting the {} industry. Explain (1 sentence) {cause}, referencing key metrics: \
         Ad Spend={:.2}, CTR={:.2}, CPC={:.2}, Conversion Rate={:.2}. Then, suggest 2 strategies to {goal}.",
        text("Campaign Type"),
        text("Region"),
        text("Industry"),
        num("Ad Spend"),
        num("Click-Through Rate (CTR)"),
        num("Cost Per Click (CPC)"),
        num("Conversion Rate"),
    )
}
