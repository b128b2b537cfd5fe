use std::path::Path;

use async_trait::async_trait;
use ndarray::Array3;

/// Pulls the audio track out of a video file.
#[async_trait]
pub trait AudioExtractorInterface: Send + Sync {
    /// Mono waveform in [-1, 1] at the extractor's sample rate.
    async fn extract(&self, video_path: &Path) -> Result<Vec<f32>, anyhow::Error>;
}

/// Pretrained speech representation model (wav2vec2-style).
pub trait FeatureExtractorInterface: Send + Sync {
    /// Frame-level features of shape (1, T, feature_dim) for a raw waveform.
    fn extract(&self, waveform: &[f32]) -> Result<Array3<f32>, anyhow::Error>;
}

/// Recurrent classifier over a feature sequence.
pub trait AudioClassifierInterface: Send + Sync {
    /// Sigmoid output in [0, 1] for the whole sequence.
    fn predict(&self, features: &Array3<f32>) -> Result<f32, anyhow::Error>;
}
