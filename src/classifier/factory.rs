use std::sync::Arc;

use tracing::{info, warn};

use super::adapter::{ImageClassifier, ImageModelState};
use super::fallback::FallbackPolicy;
use super::onnx::OnnxImageClassifier;
use crate::config::ModelConfig;

/// Factory for the image classifier adapter
pub struct ClassifierFactory;

impl ClassifierFactory {
    /// Load the image model once for the process lifetime.
    ///
    /// A missing or broken model is not fatal: the adapter starts Unavailable
    /// and answers every request through `fallback`.
    pub fn create_image_classifier(
        model_config: &ModelConfig,
        fallback: Arc<dyn FallbackPolicy>,
    ) -> ImageClassifier {
        let path = &model_config.image_model_path;
        let state = match OnnxImageClassifier::load(path) {
            Ok(model) => {
                info!("Image model loaded from {}", path.display());
                ImageModelState::Ready(Arc::new(model))
            }
            Err(e) => {
                warn!("Image model unavailable, using random detection: {:#}", e);
                ImageModelState::Unavailable {
                    reason: format!("{:#}", e),
                }
            }
        };

        ImageClassifier::new(state, fallback, model_config.inference_timeout())
    }
}
