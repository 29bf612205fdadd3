//! ONNX Runtime regressor. Input: [1, n_features] f32, output: first element of the first output.
//! The runtime library is loaded dynamically on first use.

use super::{LoadError, ModelError, Regressor};
use ndarray::Array2;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use std::sync::OnceLock;

static ORT_ENV: OnceLock<()> = OnceLock::new();

fn init_env() {
    ORT_ENV.get_or_init(|| {
        if let Err(e) = ort::init().with_name("finvix-predict").commit() {
            tracing::warn!(error = %e, "ONNX Runtime environment init failed");
        }
    });
}

fn backend(e: ort::Error) -> ModelError {
    ModelError::Backend(e.to_string())
}

pub struct OnnxRegressor {
    session: Session,
    input_name: String,
    output_name: String,
}

impl OnnxRegressor {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        init_env();
        let invalid = |e: ort::Error| LoadError::Invalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let session = Session::builder()
            .map_err(invalid)?
            .commit_from_file(path)
            .map_err(invalid)?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "input".to_string());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        tracing::info!(path = %path.display(), input = %input_name, "ONNX model loaded");
        Ok(Self {
            session,
            input_name,
            output_name,
        })
    }
}

impl Regressor for OnnxRegressor {
    fn predict(&self, row: &[f64]) -> Result<f64, ModelError> {
        let values: Vec<f32> = row.iter().map(|v| *v as f32).collect();
        let arr = Array2::from_shape_vec((1, values.len()), values).map_err(|e| {
            ModelError::Backend(e.to_string())
        })?;
        let input = Tensor::from_array(arr).map_err(backend)?;

        let outputs = self
            .session
            .run(ort::inputs![self.input_name.as_str() => input].map_err(backend)?)
            .map_err(backend)?;

        let (_, data) = outputs[self.output_name.as_str()]
            .try_extract_raw_tensor::<f32>()
            .map_err(backend)?;
        data.first()
            .map(|v| f64::from(*v))
            .ok_or(ModelError::EmptyOutput)
    }
}
