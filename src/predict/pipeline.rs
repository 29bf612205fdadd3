//! Single-record pipeline: validate → cache → chained predictions → statuses → suggestions.

use super::{PredictionEngine, Status};
use crate::cache::LastInputCache;
use crate::error::Result;
use crate::features::{FeatureRecord, ModelType, CONVERSIONS_FIELD};
use crate::insight::{build_prompt, unavailable_message, Metric, SuggestionSource};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// Predictions for one record. Metrics outside the requested model type are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversions: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversions_status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_conversions: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi_status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_roi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversions_suggestions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi_suggestions: Option<String>,
}

pub struct Predictor {
    engine: Arc<PredictionEngine>,
    cache: Arc<LastInputCache>,
    suggestions: Option<Arc<dyn SuggestionSource>>,
}

impl Predictor {
    pub fn new(engine: Arc<PredictionEngine>, cache: Arc<LastInputCache>) -> Self {
        Self {
            engine,
            cache,
            suggestions: None,
        }
    }

    pub fn with_suggestions(mut self, source: Arc<dyn SuggestionSource>) -> Self {
        self.suggestions = Some(source);
        self
    }

    pub fn engine(&self) -> &Arc<PredictionEngine> {
        &self.engine
    }

    pub fn cache(&self) -> &Arc<LastInputCache> {
        &self.cache
    }

    pub fn has_suggestions(&self) -> bool {
        self.suggestions.is_some()
    }

    /// API entry point: 13 positional values in canonical feature order.
    pub fn predict_values(
        &self,
        values: &[Value],
        model_type: ModelType,
    ) -> Result<PredictionResult> {
        let record = self.engine.schema().record_from_values(values)?;
        self.predict_validated(record, model_type)
    }

    /// Validate a named record, then predict.
    pub fn predict_record(
        &self,
        record: &FeatureRecord,
        model_type: ModelType,
    ) -> Result<PredictionResult> {
        let record = self.engine.schema().validate(record)?;
        self.predict_validated(record, model_type)
    }

    fn predict_validated(
        &self,
        record: FeatureRecord,
        model_type: ModelType,
    ) -> Result<PredictionResult> {
        self.cache.store(record.clone());
        let mut result = self.evaluate(&record, model_type)?;
        self.attach_suggestions(&mut result, &record, model_type);
        info!(model_type = %model_type, "prediction complete");
        Ok(result)
    }

    /// Run the model chain for an already validated record.
    ///
    /// ROI needs predicted conversions as an input column, so conversions are
    /// predicted for `roi` requests too but only reported for `conversions`
    /// and `both`.
    pub fn evaluate(
        &self,
        record: &FeatureRecord,
        model_type: ModelType,
    ) -> Result<PredictionResult> {
        let engine = &self.engine;
        let mut result = PredictionResult::default();

        let mut conversions = None;
        if model_type.includes_conversions() {
            let predicted = engine.predict_conversions(record)?;
            let actual = engine.predict_actual_conversions(record)?;
            result.conversions = Some(predicted);
            result.actual_conversions = Some(actual);
            result.conversions_status = Some(Status::classify(predicted, actual));
            conversions = Some(predicted);
        }

        if model_type.includes_roi() {
            let conv = match conversions {
                Some(c) => c,
                None => engine.predict_conversions(record)?,
            };
            let mut roi_record = record.clone();
            roi_record.insert(CONVERSIONS_FIELD, conv);
            let predicted = engine.predict_roi(&roi_record)?;
            let actual = engine.predict_actual_roi(record)?;
            result.roi = Some(predicted);
            result.actual_roi = Some(actual);
            result.roi_status = Some(Status::classify(predicted, actual));
        }

        Ok(result)
    }

    /// Fill the suggestion fields for every metric present in `result`.
    /// Failures become a short message; the prediction itself stands.
    pub fn attach_suggestions(
        &self,
        result: &mut PredictionResult,
        record: &FeatureRecord,
        model_type: ModelType,
    ) {
        self.attach_suggestions_paced(result, record, model_type, || {});
    }

    /// Like [`Self::attach_suggestions`], calling `before_request` ahead of
    /// every outgoing suggestion request.
    pub fn attach_suggestions_paced(
        &self,
        result: &mut PredictionResult,
        record: &FeatureRecord,
        model_type: ModelType,
        mut before_request: impl FnMut(),
    ) {
        let Some(source) = self.suggestions.as_deref() else {
            return;
        };
        if model_type.includes_conversions() {
            let prompt = prompt_for(
                Metric::Conversions,
                result.conversions,
                result.actual_conversions,
                result.conversions_status,
                record,
            );
            if let Some(prompt) = prompt {
                before_request();
                result.conversions_suggestions = Some(fetch(source, &prompt));
            }
        }
        if model_type.includes_roi() {
            let prompt = prompt_for(
                Metric::Roi,
                result.roi,
                result.actual_roi,
                result.roi_status,
                record,
            );
            if let Some(prompt) = prompt {
                before_request();
                result.roi_suggestions = Some(fetch(source, &prompt));
            }
        }
    }
}

fn prompt_for(
    metric: Metric,
    predicted: Option<f64>,
    actual: Option<f64>,
    status: Option<Status>,
    record: &FeatureRecord,
) -> Option<String> {
    Some(build_prompt(metric, status?, predicted?, actual?, record))
}

fn fetch(source: &dyn SuggestionSource, prompt: &str) -> String {
    match source.suggest(prompt) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "suggestion request failed");
            unavailable_message(&e)
        }
    }
}
