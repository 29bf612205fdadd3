//! Prediction engine, deviation status and the single-record pipeline.

mod engine;
mod pipeline;
mod status;

pub use engine::PredictionEngine;
pub use pipeline::{PredictionResult, Predictor};
pub use status::{Status, DEVIATION_BAND};
