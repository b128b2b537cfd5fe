use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tracing::warn;

use super::blocking_inference;
use super::fallback::FallbackPolicy;
use super::interface::ImageClassifierInterface;
use crate::detection::ModalityResult;
use crate::media::FrameTensor;

/// Scores above this are reported as deepfake.
pub const IMAGE_DEEPFAKE_THRESHOLD: f32 = 0.5;

pub const IMAGE_MODEL_UNAVAILABLE_NOTE: &str = "Using random detection as model is not available";
pub const IMAGE_INFERENCE_FAILED_NOTE: &str = "Error in image analysis. Using random result.";

/// Availability of the image model, fixed at startup.
pub enum ImageModelState {
    Unavailable { reason: String },
    Ready(Arc<dyn ImageClassifierInterface>),
}

/// Adapter that turns frames into visual verdicts, falling back to random
/// output when the model is missing or a call fails.
pub struct ImageClassifier {
    state: ImageModelState,
    fallback: Arc<dyn FallbackPolicy>,
    timeout: Duration,
}

impl ImageClassifier {
    pub fn new(
        state: ImageModelState,
        fallback: Arc<dyn FallbackPolicy>,
        timeout: Duration,
    ) -> Self {
        Self {
            state,
            fallback,
            timeout,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, ImageModelState::Ready(_))
    }

    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            ImageModelState::Unavailable { reason } => Some(reason),
            ImageModelState::Ready(_) => None,
        }
    }

    /// Fallback verdict when the model is Unavailable, `None` when Ready.
    /// Lets callers answer without decoding media they cannot score anyway.
    pub fn unavailable_result(&self) -> Option<ModalityResult> {
        match &self.state {
            ImageModelState::Unavailable { .. } => Some(self.unavailable_fallback()),
            ImageModelState::Ready(_) => None,
        }
    }

    fn unavailable_fallback(&self) -> ModalityResult {
        ModalityResult::fallback(self.fallback.draw(), IMAGE_MODEL_UNAVAILABLE_NOTE, None)
    }

    pub async fn classify(&self, frame: FrameTensor) -> ModalityResult {
        let model = match &self.state {
            ImageModelState::Unavailable { .. } => return self.unavailable_fallback(),
            ImageModelState::Ready(model) => Arc::clone(model),
        };

        let score = blocking_inference(self.timeout, move || model.predict(&frame))
            .await
            .and_then(|score| {
                if score.is_finite() {
                    Ok(score)
                } else {
                    Err(anyhow!("Image model returned a non-finite score: {}", score))
                }
            });

        match score {
            Ok(score) => image_decision(score),
            Err(e) => {
                warn!(error = %e, "Image inference failed, using fallback");
                ModalityResult::fallback(
                    self.fallback.draw(),
                    IMAGE_INFERENCE_FAILED_NOTE,
                    Some(format!("{:#}", e)),
                )
            }
        }
    }
}

/// Verdict for a raw image model score: the score itself is the confidence.
pub fn image_decision(score: f32) -> ModalityResult {
    let score = score.clamp(0.0, 1.0);
    ModalityResult::new(score > IMAGE_DEEPFAKE_THRESHOLD, score)
}
