use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tracing::{info, warn};

use super::extractor::FfmpegAudioExtractor;
use super::features::{OnnxAudioClassifier, OnnxFeatureExtractor};
use super::pipeline::{AudioPipeline, AudioUnavailable, ReadyAudioPipeline};
use crate::config::Config;

/// Factory for the audio pipeline
pub struct AudioPipelineFactory;

impl AudioPipelineFactory {
    /// Check every availability gate once at startup: ffmpeg runnable,
    /// feature extractor loadable, classifier loadable.
    pub async fn create_pipeline(config: &Config) -> AudioPipeline {
        let models = &config.model_config;

        if !ffmpeg_available(&models.ffmpeg_path).await {
            warn!(
                "Audio analysis will not be available: {} could not be executed",
                models.ffmpeg_path
            );
            return AudioPipeline::Unavailable(AudioUnavailable::DependenciesMissing);
        }

        let features = match OnnxFeatureExtractor::load(&models.audio_feature_extractor_path) {
            Ok(features) => features,
            Err(e) => {
                warn!("Audio feature extractor unavailable, using random detection: {:#}", e);
                return AudioPipeline::Unavailable(AudioUnavailable::ModelsMissing);
            }
        };

        let classifier = match OnnxAudioClassifier::load(&models.audio_classifier_path) {
            Ok(classifier) => classifier,
            Err(e) => {
                warn!("Audio classifier unavailable, using random detection: {:#}", e);
                return AudioPipeline::Unavailable(AudioUnavailable::ModelsMissing);
            }
        };

        info!("Audio pipeline ready");
        AudioPipeline::Ready(ReadyAudioPipeline {
            extractor: Arc::new(FfmpegAudioExtractor::new(
                models.ffmpeg_path.clone(),
                models.audio_sample_rate,
                config.system_config.temp_dir(),
            )),
            features: Arc::new(features),
            classifier: Arc::new(classifier),
        })
    }
}

/// Whether `ffmpeg -version` runs successfully.
pub async fn ffmpeg_available(ffmpeg_path: &str) -> bool {
    Command::new(ffmpeg_path)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}
