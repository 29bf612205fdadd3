//! Finvix prediction engine — campaign conversions and ROI with baseline comparison.
//!
//! Modular structure:
//! - [`features`] — Feature schema, validation and categorical encoding
//! - [`model`] — Regressor contract, artifact loading (ONNX, JSON linear)
//! - [`predict`] — Prediction engine, deviation status, single-record pipeline
//! - [`batch`] — Spreadsheet batch processing and CSV export
//! - [`insight`] — Explanation prompts and the suggestion API client
//! - [`report`] — Report summaries
//! - [`cache`] — Last submitted input
//! - [`logging`] — Structured JSON logging

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod features;
pub mod insight;
pub mod logging;
pub mod model;
pub mod predict;
pub mod report;

pub use batch::{BatchProcessor, BatchRow, RawTable};
pub use cache::LastInputCache;
pub use config::ServiceConfig;
pub use error::{PredictError, Result};
pub use features::{CategoricalEncoder, FeatureRecord, FeatureSchema, ModelType};
pub use logging::StructuredLogger;
pub use model::{ModelKind, ModelSet, Regressor};
pub use predict::{PredictionEngine, PredictionResult, Predictor, Status};
pub use report::ReportSummary;
