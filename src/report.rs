//! Report summaries for single and batch predictions.
//!
//! Produces the data a performance report is rendered from: headline
//! figures, a per-row table for uploads and the collected suggestions.

use crate::features::ModelType;
use crate::predict::PredictionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const NO_SUGGESTIONS: &str = "No specific suggestions provided.";
const NO_BATCH_SUGGESTIONS: &str = "No specific suggestions available based on the provided results.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error("no prediction results provided")]
    NoResults,

    #[error("missing fields in results: {}", .fields.join(", "))]
    MissingFields {
        /// 1-based row for batch reports
        row: Option<usize>,
        fields: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_conversions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversions: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_roi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub model_type: ModelType,
    /// Number of result rows summarized (1 for a single prediction)
    pub rows: usize,
    pub actual_conversions: f64,
    pub predicted_conversions: f64,
    pub actual_roi: f64,
    pub predicted_roi: f64,
    pub summary: String,
    /// Per-row figures; empty for single predictions
    pub table: Vec<ReportRow>,
    pub suggestions: Vec<String>,
}

fn missing_fields(result: &PredictionResult, model_type: ModelType) -> Vec<String> {
    let mut fields = Vec::new();
    if model_type.includes_roi() {
        if result.roi.is_none() {
            fields.push("roi".to_string());
        }
        if result.actual_roi.is_none() {
            fields.push("actual_roi".to_string());
        }
    }
    if model_type.includes_conversions() {
        if result.conversions.is_none() {
            fields.push("conversions".to_string());
        }
        if result.actual_conversions.is_none() {
            fields.push("actual_conversions".to_string());
        }
    }
    fields
}

fn suggestion_text(result: &PredictionResult, model_type: ModelType) -> Vec<&str> {
    let mut texts = Vec::new();
    if model_type.includes_conversions() {
        texts.extend(result.conversions_suggestions.as_deref());
    }
    if model_type.includes_roi() {
        texts.extend(result.roi_suggestions.as_deref());
    }
    texts
}

fn split_suggestions<'a>(texts: impl IntoIterator<Item = &'a str>, fallback: &str) -> Vec<String> {
    let lines: Vec<String> = texts
        .into_iter()
        .flat_map(str::lines)
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if lines.is_empty() {
        vec![fallback.to_string()]
    } else {
        lines
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

impl ReportSummary {
    /// Summary for one prediction. Metrics outside `model_type` read as 0.
    pub fn single(result: &PredictionResult, model_type: ModelType) -> Result<Self, ReportError> {
        let fields = missing_fields(result, model_type);
        if !fields.is_empty() {
            return Err(ReportError::MissingFields { row: None, fields });
        }

        let pick = |include: bool, v: Option<f64>| if include { v.unwrap_or(0.0) } else { 0.0 };
        let actual_roi = pick(model_type.includes_roi(), result.actual_roi);
        let predicted_roi = pick(model_type.includes_roi(), result.roi);
        let actual_conversions = pick(model_type.includes_conversions(), result.actual_conversions);
        let predicted_conversions = pick(model_type.includes_conversions(), result.conversions);

        let summary = match model_type {
            ModelType::Roi => format!(
                "This report analyzes ROI predictions for the given input. \
                 Actual ROI: {actual_roi:.2}, Predicted ROI: {predicted_roi:.2}."
            ),
            ModelType::Conversions => format!(
                "This report analyzes Conversions predictions for the given input. \
                 Actual Conversions: {actual_conversions:.2}, Predicted Conversions: {predicted_conversions:.2}."
            ),
            ModelType::Both => format!(
                "This report analyzes ROI and Conversions predictions for the given input. \
                 Actual ROI: {actual_roi:.2}, Predicted ROI: {predicted_roi:.2}, \
                 Actual Conversions: {actual_conversions:.2}, Predicted Conversions: {predicted_conversions:.2}."
            ),
        };

        Ok(Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            model_type,
            rows: 1,
            actual_conversions,
            predicted_conversions,
            actual_roi,
            predicted_roi,
            summary,
            table: Vec::new(),
            suggestions: split_suggestions(suggestion_text(result, model_type), NO_SUGGESTIONS),
        })
    }

    /// Summary over uploaded rows: averages, a per-row table and every row's suggestions.
    pub fn batch(results: &[PredictionResult], model_type: ModelType) -> Result<Self, ReportError> {
        if results.is_empty() {
            return Err(ReportError::NoResults);
        }
        for (i, result) in results.iter().enumerate() {
            let fields = missing_fields(result, model_type);
            if !fields.is_empty() {
                return Err(ReportError::MissingFields {
                    row: Some(i + 1),
                    fields,
                });
            }
        }

        let actual_roi = mean(results.iter().map(|r| r.actual_roi.unwrap_or(0.0)));
        let predicted_roi = mean(results.iter().map(|r| r.roi.unwrap_or(0.0)));
        let actual_conversions = mean(results.iter().map(|r| r.actual_conversions.unwrap_or(0.0)));
        let predicted_conversions = mean(results.iter().map(|r| r.conversions.unwrap_or(0.0)));

        let table = results
            .iter()
            .enumerate()
            .map(|(i, r)| ReportRow {
                row: i + 1,
                actual_conversions: r.actual_conversions.filter(|_| model_type.includes_conversions()),
                conversions: r.conversions.filter(|_| model_type.includes_conversions()),
                actual_roi: r.actual_roi.filter(|_| model_type.includes_roi()),
                roi: r.roi.filter(|_| model_type.includes_roi()),
            })
            .collect();

        let label = match model_type {
            ModelType::Conversions => "Conversions",
            ModelType::Roi => "Roi",
            ModelType::Both => "Both",
        };
        let summary = format!(
            "This report analyzes {label} predictions for {} data row(s). \
             Average actual ROI: {actual_roi:.2}, predicted ROI: {predicted_roi:.2}, \
             average actual conversions: {actual_conversions:.2}, predicted conversions: {predicted_conversions:.2}.",
            results.len()
        );

        Ok(Self {
            id: Uuid::new_v4(),
            generated_at: Utc::now(),
            model_type,
            rows: results.len(),
            actual_conversions,
            predicted_conversions,
            actual_roi,
            predicted_roi,
            summary,
            table,
            suggestions: split_suggestions(
                results.iter().flat_map(|r| suggestion_text(r, model_type)),
                NO_BATCH_SUGGESTIONS,
            ),
        })
    }
}
