use crate::media::FrameTensor;

/// Pretrained binary image classifier. Implementations are synchronous and are
/// driven from the blocking pool by [`super::ImageClassifier`].
pub trait ImageClassifierInterface: Send + Sync {
    /// Deepfake score in [0, 1] for one preprocessed frame.
    fn predict(&self, frame: &FrameTensor) -> Result<f32, anyhow::Error>;
}
