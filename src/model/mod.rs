//! Pre-trained regressors behind a single `predict(row) -> f64` contract.
//!
//! Artifacts are loaded once at startup and shared read-only. Adapters:
//! - [`onnx`] — ONNX Runtime sessions (`.onnx`)
//! - [`linear`] — JSON linear models (`.json`)

mod bundle;
mod linear;
#[cfg(feature = "onnx")]
mod onnx;

pub use bundle::{load_vocabularies, sha256_file, ArtifactBundle};
pub use linear::LinearRegressor;
#[cfg(feature = "onnx")]
pub use onnx::OnnxRegressor;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("expected {expected} input columns, got {got}")]
    Shape { expected: usize, got: usize },

    #[error("model produced no output")]
    EmptyOutput,

    #[error("inference backend: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported model format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("checksum mismatch for {}: expected {expected}, got {actual}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("invalid artifact {}: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A trained regressor. `row` holds the encoded feature columns in training order.
pub trait Regressor: Send + Sync {
    fn predict(&self, row: &[f64]) -> Result<f64, ModelError>;
}

impl<F> Regressor for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        Ok(self(row))
    }
}

/// The four models the prediction engine chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Conversions,
    Roi,
    ActualConversions,
    ActualRoi,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::Conversions,
        ModelKind::Roi,
        ModelKind::ActualConversions,
        ModelKind::ActualRoi,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Conversions => "conversions",
            ModelKind::Roi => "roi",
            ModelKind::ActualConversions => "actual_conversions",
            ModelKind::ActualRoi => "actual_roi",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loaded models keyed by kind. A kind with no entry is unavailable.
#[derive(Clone, Default)]
pub struct ModelSet {
    models: HashMap<ModelKind, Arc<dyn Regressor>>,
}

impl ModelSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, kind: ModelKind, model: Arc<dyn Regressor>) -> Self {
        self.insert(kind, model);
        self
    }

    pub fn insert(&mut self, kind: ModelKind, model: Arc<dyn Regressor>) {
        self.models.insert(kind, model);
    }

    pub fn get(&self, kind: ModelKind) -> Option<&Arc<dyn Regressor>> {
        self.models.get(&kind)
    }

    pub fn is_available(&self, kind: ModelKind) -> bool {
        self.models.contains_key(&kind)
    }

    pub fn available(&self) -> Vec<ModelKind> {
        ModelKind::ALL
            .into_iter()
            .filter(|k| self.is_available(*k))
            .collect()
    }
}

impl fmt::Debug for ModelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSet")
            .field("available", &self.available())
            .finish()
    }
}

/// Load one artifact, picking the adapter from the file extension.
pub fn load_model(path: &Path) -> Result<Arc<dyn Regressor>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Ok(Arc::new(LinearRegressor::load(path)?)),
        #[cfg(feature = "onnx")]
        Some("onnx") => Ok(Arc::new(OnnxRegressor::load(path)?)),
        _ => Err(LoadError::UnsupportedFormat(path.to_path_buf())),
    }
}
