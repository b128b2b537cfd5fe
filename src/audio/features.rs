use std::path::Path;

use anyhow::Result;
use ndarray::{Array2, Array3};

use super::interface::{AudioClassifierInterface, FeatureExtractorInterface};
use crate::classifier::onnx::OnnxModel;

/// Width of the frame-level feature vectors produced by wav2vec2-base.
pub const AUDIO_FEATURE_DIM: usize = 768;

/// Zero-mean, unit-variance normalisation expected by wav2vec2 models.
pub fn normalize_waveform(waveform: &[f32]) -> Vec<f32> {
    if waveform.is_empty() {
        return Vec::new();
    }

    let n = waveform.len() as f32;
    let mean = waveform.iter().sum::<f32>() / n;
    let variance = waveform.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / n;
    let scale = (variance + 1e-7).sqrt();

    waveform.iter().map(|x| (x - mean) / scale).collect()
}

/// wav2vec2 feature extractor exported to ONNX: (1, N) waveform in,
/// `last_hidden_state` (1, T, 768) out.
pub struct OnnxFeatureExtractor {
    model: OnnxModel,
    feature_dim: usize,
}

impl OnnxFeatureExtractor {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            model: OnnxModel::load(path)?,
            feature_dim: AUDIO_FEATURE_DIM,
        })
    }
}

impl FeatureExtractorInterface for OnnxFeatureExtractor {
    fn extract(&self, waveform: &[f32]) -> Result<Array3<f32>> {
        if waveform.is_empty() {
            anyhow::bail!("Cannot extract features from an empty waveform");
        }

        let normalized = normalize_waveform(waveform);
        let input = Array2::from_shape_vec((1, normalized.len()), normalized)?;
        let values = self.model.run(input)?;

        if values.is_empty() || values.len() % self.feature_dim != 0 {
            anyhow::bail!(
                "Feature extractor returned {} values, not a multiple of {}",
                values.len(),
                self.feature_dim
            );
        }
        let frames = values.len() / self.feature_dim;
        Ok(Array3::from_shape_vec((1, frames, self.feature_dim), values)?)
    }
}

/// Deepfake audio classifier exported to ONNX: a 2-layer GRU (hidden 256)
/// over the feature sequence, its final hidden state projected to one logit
/// and squashed by a sigmoid.
pub struct OnnxAudioClassifier {
    model: OnnxModel,
}

impl OnnxAudioClassifier {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self {
            model: OnnxModel::load(path)?,
        })
    }
}

impl AudioClassifierInterface for OnnxAudioClassifier {
    fn predict(&self, features: &Array3<f32>) -> Result<f32> {
        self.model.run_scalar(features.clone())
    }
}
