//! Artifact bundle: the four regressors plus the label-encoder vocabularies,
//! loaded from one models directory at startup.

use super::{load_model, LoadError, ModelKind, ModelSet};
use crate::config::ModelsConfig;
use crate::features::{FeatureSchema, Vocabularies};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{info, warn};

/// Lowercase hex SHA-256 of a file's contents.
pub fn sha256_file(path: &Path) -> Result<String, LoadError> {
    let data = std::fs::read(path)?;
    let mut h = Sha256::new();
    h.update(&data);
    Ok(format!("{:x}", h.finalize()))
}

/// Read `label_encoders.json` (feature → ordered class list).
pub fn load_vocabularies(path: &Path) -> Result<Vocabularies, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(|e| LoadError::Invalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub struct ArtifactBundle {
    pub models: ModelSet,
    pub vocabularies: Vocabularies,
}

impl ArtifactBundle {
    /// Load every artifact named in `config`. A model that fails to load is
    /// logged and left out; predictions against it report it unavailable.
    pub fn load(config: &ModelsConfig, schema: &FeatureSchema) -> Self {
        let mut models = ModelSet::new();
        for kind in ModelKind::ALL {
            let file = config.file_name(kind);
            let path = config.dir.join(file);
            let loaded = verify_checksum(config, file, &path).and_then(|_| load_model(&path));
            match loaded {
                Ok(model) => {
                    info!(model = %kind, path = %path.display(), "model loaded");
                    models.insert(kind, model);
                }
                Err(LoadError::NotFound(p)) => {
                    warn!(model = %kind, path = %p.display(), "model file not found; predictions disabled");
                }
                Err(e) => {
                    warn!(model = %kind, error = %e, "model failed to load; predictions disabled");
                }
            }
        }

        let encoders_path = config.dir.join(&config.encoders);
        let vocabularies = match load_vocabularies(&encoders_path) {
            Ok(v) => complete_vocabularies(v, schema),
            Err(e) => {
                warn!(error = %e, "label encoders unavailable; using sorted schema vocabularies");
                schema.sorted_vocabularies()
            }
        };

        Self {
            models,
            vocabularies,
        }
    }
}

/// Fill any categorical feature the encoder file leaves out with its sorted
/// schema vocabulary, so it is still encoded as a category.
fn complete_vocabularies(mut loaded: Vocabularies, schema: &FeatureSchema) -> Vocabularies {
    let mut fallback = schema.sorted_vocabularies();
    for feature in schema.categorical() {
        if loaded.contains_key(feature) {
            continue;
        }
        if let Some(classes) = fallback.remove(feature) {
            warn!(feature, "no trained classes in label encoders; using sorted schema vocabulary");
            loaded.insert(feature.to_string(), classes);
        }
    }
    loaded
}

fn verify_checksum(config: &ModelsConfig, file: &str, path: &Path) -> Result<(), LoadError> {
    let Some(expected) = config.checksums.get(file) else {
        return Ok(());
    };
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let actual = sha256_file(path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(LoadError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.clone(),
            actual,
        });
    }
    Ok(())
}
