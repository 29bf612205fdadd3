//! Crate-level error taxonomy.

use crate::features::SchemaError;
use crate::model::{LoadError, ModelError, ModelKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    /// Input rejected before any model was invoked
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The artifact for this prediction type failed to load at startup
    #[error("{model} model unavailable")]
    ModelUnavailable { model: ModelKind },

    #[error("{model} model failed for [{record}]: {source}")]
    Inference {
        model: ModelKind,
        /// Categorical fields of the offending record, e.g. `Region=Europe`
        record: String,
        #[source]
        source: ModelError,
    },

    #[error("`Conversions` must be present in the record before ROI prediction")]
    MissingConversions,

    #[error("unknown model type `{0}` (expected conversions, roi or both)")]
    InvalidModelType(String),

    #[error("batch contains no rows")]
    EmptyBatch,

    #[error("batch has {rows} rows; limit is {limit}")]
    BatchTooLarge { rows: usize, limit: usize },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PredictError>;
