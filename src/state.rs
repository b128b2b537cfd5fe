use std::sync::Arc;

use tracing::info;

use crate::audio::{AudioAnalyzer, AudioPipelineFactory};
use crate::classifier::{ClassifierFactory, FallbackPolicy, ImageClassifier, RandomFallback};
use crate::config::Config;
use crate::media::{FfmpegFrameSource, FrameSource};

/// Process-wide state, built once at startup and shared read-only by requests.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub image_classifier: Arc<ImageClassifier>,
    pub audio_analyzer: Arc<AudioAnalyzer>,
    pub frame_source: Arc<dyn FrameSource>,
}

impl AppState {
    /// Load every model adapter. Missing models leave their adapter in fallback
    /// mode rather than failing startup.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let model_config = &config.model_config;
        let fallback: Arc<dyn FallbackPolicy> =
            Arc::new(RandomFallback::new(model_config.fallback_deepfake_probability));

        let image_classifier =
            ClassifierFactory::create_image_classifier(model_config, Arc::clone(&fallback));
        let audio_pipeline = AudioPipelineFactory::create_pipeline(&config).await;
        let audio_analyzer = AudioAnalyzer::new(
            audio_pipeline,
            Arc::clone(&fallback),
            model_config.inference_timeout(),
        );
        let frame_source = Arc::new(FfmpegFrameSource::new(model_config.ffmpeg_path.clone()));

        info!(
            "Adapters initialised: image model ready={}, audio pipeline ready={}",
            image_classifier.is_ready(),
            audio_analyzer.is_ready()
        );

        Ok(Self::from_parts(
            config,
            image_classifier,
            audio_analyzer,
            frame_source,
        ))
    }

    pub fn from_parts(
        config: Config,
        image_classifier: ImageClassifier,
        audio_analyzer: AudioAnalyzer,
        frame_source: Arc<dyn FrameSource>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            image_classifier: Arc::new(image_classifier),
            audio_analyzer: Arc::new(audio_analyzer),
            frame_source,
        }
    }
}
