//! Prediction engine: encode → select training columns → invoke one of four models.

use crate::error::{PredictError, Result};
use crate::features::{
    CategoricalEncoder, EncodedRecord, FeatureRecord, FeatureSchema, CONVERSIONS_FIELD,
};
use crate::model::{ArtifactBundle, ModelKind, ModelSet};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct PredictionEngine {
    schema: Arc<FeatureSchema>,
    encoder: CategoricalEncoder,
    models: ModelSet,
}

impl PredictionEngine {
    pub fn new(schema: Arc<FeatureSchema>, encoder: CategoricalEncoder, models: ModelSet) -> Self {
        Self {
            schema,
            encoder,
            models,
        }
    }

    pub fn from_bundle(schema: Arc<FeatureSchema>, bundle: ArtifactBundle) -> Self {
        Self::new(schema, CategoricalEncoder::new(bundle.vocabularies), bundle.models)
    }

    pub fn schema(&self) -> &Arc<FeatureSchema> {
        &self.schema
    }

    pub fn encoder(&self) -> &CategoricalEncoder {
        &self.encoder
    }

    pub fn models(&self) -> &ModelSet {
        &self.models
    }

    pub fn predict_conversions(&self, record: &FeatureRecord) -> Result<f64> {
        self.run(ModelKind::Conversions, record)
    }

    /// `record` must already carry `Conversions`, normally the output of
    /// [`Self::predict_conversions`].
    pub fn predict_roi(&self, record: &FeatureRecord) -> Result<f64> {
        if !record.contains(CONVERSIONS_FIELD) {
            return Err(PredictError::MissingConversions);
        }
        self.run(ModelKind::Roi, record)
    }

    pub fn predict_actual_conversions(&self, record: &FeatureRecord) -> Result<f64> {
        self.run(ModelKind::ActualConversions, record)
    }

    pub fn predict_actual_roi(&self, record: &FeatureRecord) -> Result<f64> {
        self.run(ModelKind::ActualRoi, record)
    }

    /// Encoded columns in training order for `kind`. The ROI model takes the
    /// 13 features followed by `Conversions`.
    pub fn columns(&self, kind: ModelKind, encoded: &EncodedRecord) -> Vec<f64> {
        let extra = (kind == ModelKind::Roi).then_some(CONVERSIONS_FIELD);
        self.schema
            .names()
            .chain(extra)
            .map(|name| {
                encoded.get(name).unwrap_or_else(|| {
                    warn!(model = %kind, feature = name, "missing column zero-filled");
                    0.0
                })
            })
            .collect()
    }

    /// Compact identification of a record: its categorical fields in schema order.
    fn describe(&self, record: &FeatureRecord) -> String {
        self.schema
            .categorical()
            .map(|name| format!("{name}={}", record.text(name).unwrap_or("?")))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn run(&self, kind: ModelKind, record: &FeatureRecord) -> Result<f64> {
        let model = self
            .models
            .get(kind)
            .ok_or(PredictError::ModelUnavailable { model: kind })?;
        let encoded = self.encoder.encode(record);
        let row = self.columns(kind, &encoded);
        let value = model.predict(&row).map_err(|source| PredictError::Inference {
            model: kind,
            record: self.describe(record),
            source,
        })?;
        debug!(model = %kind, value, "prediction");
        Ok(value)
    }
}
