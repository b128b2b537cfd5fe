//! ONNX Runtime sessions backing the pretrained models.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use ndarray::{Array, Dimension};
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use tracing::info;

use super::interface::ImageClassifierInterface;
use crate::media::FrameTensor;

/// A loaded ONNX model with a single f32 input and a single f32 output.
///
/// Running a session needs exclusive access, so calls to the same model are
/// serialised; different models run independently.
pub struct OnnxModel {
    path: PathBuf,
    output_name: String,
    session: Mutex<Session>,
}

impl OnnxModel {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Model file not found at {}", path.display());
        }

        info!("Loading ONNX model from: {}", path.display());
        let session = Session::builder()
            .map_err(|e| anyhow!("Failed to create session builder: {}", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| anyhow!("Failed to set optimization level: {}", e))?
            .commit_from_file(path)
            .map_err(|e| anyhow!("Failed to load model {}: {}", path.display(), e))?;

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| anyhow!("Model {} defines no outputs", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            output_name,
            session: Mutex::new(session),
        })
    }

    /// Run the model on `input` and return its flattened first output.
    pub fn run<D: Dimension + 'static>(&self, input: Array<f32, D>) -> Result<Vec<f32>> {
        let input_tensor =
            Value::from_array(input).map_err(|e| anyhow!("Tensor error: {}", e))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| anyhow!("Inference failed: {}", e))?;

        let output = outputs
            .get(&self.output_name)
            .ok_or_else(|| anyhow!("Model output {} missing", self.output_name))?;
        let (_, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| anyhow!("Extract error: {}", e))?;

        let values = data.to_vec();
        Ok(values)
    }

    /// Run the model and return its single scalar output.
    pub fn run_scalar<D: Dimension + 'static>(&self, input: Array<f32, D>) -> Result<f32> {
        let values = self.run(input)?;
        values
            .first()
            .copied()
            .ok_or_else(|| anyhow!("Model {} returned an empty output", self.path.display()))
    }
}

/// Keras-style image classifier exported to ONNX: NHWC (1, 128, 128, 3) in,
/// (1, 1) sigmoid score out.
pub struct OnnxImageClassifier {
    model: OnnxModel,
}

impl OnnxImageClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            model: OnnxModel::load(path)?,
        })
    }
}

impl ImageClassifierInterface for OnnxImageClassifier {
    fn predict(&self, frame: &FrameTensor) -> Result<f32> {
        self.model.run_scalar(frame.as_array().clone())
    }
}
