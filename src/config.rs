//! Service configuration: model artifacts, batch limits, suggestions, logging.

use crate::model::ModelKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Trained model artifacts and encoder vocabularies
    pub models: ModelsConfig,
    /// Spreadsheet upload processing
    pub batch: BatchConfig,
    /// Generative-text suggestions (external API)
    pub suggestions: SuggestionsConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding every artifact below
    pub dir: PathBuf,
    pub conversions: String,
    pub roi: String,
    pub actual_conversions: String,
    pub actual_roi: String,
    /// Label-encoder class lists (feature → ordered classes)
    pub encoders: String,
    /// Optional file name → lowercase hex SHA-256, checked before loading
    pub checksums: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Run rows on the rayon pool instead of sequentially
    pub parallel: bool,
    /// Uploads with more data rows are rejected
    pub max_rows: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionsConfig {
    pub enabled: bool,
    /// API base URL, without the model path
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Pause between consecutive requests during batch processing
    pub request_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("models"),
            conversions: "conversions_model.onnx".to_string(),
            roi: "roi_model.onnx".to_string(),
            actual_conversions: "actual_conversions_model.onnx".to_string(),
            actual_roi: "actual_roi_model.onnx".to_string(),
            encoders: "label_encoders.json".to_string(),
            checksums: HashMap::new(),
        }
    }
}

impl ModelsConfig {
    pub fn file_name(&self, kind: ModelKind) -> &str {
        match kind {
            ModelKind::Conversions => &self.conversions,
            ModelKind::Roi => &self.roi,
            ModelKind::ActualConversions => &self.actual_conversions,
            ModelKind::ActualRoi => &self.actual_roi,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_rows: 10_000,
        }
    }
}

impl Default for SuggestionsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 30,
            request_interval_ms: 1000,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl ServiceConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<ServiceConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    /// `FINVIX_MODELS_DIR` and `FINVIX_LOG_LEVEL` take precedence over the file.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("FINVIX_MODELS_DIR") {
            self.models.dir = PathBuf::from(dir);
        }
        if let Ok(level) = std::env::var("FINVIX_LOG_LEVEL") {
            self.log.level = level;
        }
        self
    }
}
