use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use super::interface::{
    AudioClassifierInterface, AudioExtractorInterface, FeatureExtractorInterface,
};
use crate::classifier::blocking_inference;
use crate::classifier::fallback::FallbackPolicy;
use crate::detection::ModalityResult;

/// Predictions at or below this are reported as deepfake audio.
pub const AUDIO_DEEPFAKE_THRESHOLD: f32 = 0.5;

pub const AUDIO_COMPLETE_NOTE: &str = "Audio analysis complete";
pub const AUDIO_ERROR_NOTE: &str = "Error in audio analysis. Using random result.";

/// Why the audio pipeline could not be assembled at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioUnavailable {
    /// The external tooling (ffmpeg) is missing.
    DependenciesMissing,
    /// The feature extractor or the classifier weights failed to load.
    ModelsMissing,
}

impl AudioUnavailable {
    pub fn note(&self) -> &'static str {
        match self {
            AudioUnavailable::DependenciesMissing => {
                "Audio analysis not available. Using random result."
            }
            AudioUnavailable::ModelsMissing => "Audio models not available. Using random result.",
        }
    }
}

pub struct ReadyAudioPipeline {
    pub extractor: Arc<dyn AudioExtractorInterface>,
    pub features: Arc<dyn FeatureExtractorInterface>,
    pub classifier: Arc<dyn AudioClassifierInterface>,
}

/// Audio capability, resolved once at startup and never re-checked.
pub enum AudioPipeline {
    Unavailable(AudioUnavailable),
    Ready(ReadyAudioPipeline),
}

/// Runs the audio modality for a video. Never fails: any problem becomes a
/// fallback result with the error attached.
pub struct AudioAnalyzer {
    pipeline: AudioPipeline,
    fallback: Arc<dyn FallbackPolicy>,
    timeout: Duration,
}

impl AudioAnalyzer {
    pub fn new(
        pipeline: AudioPipeline,
        fallback: Arc<dyn FallbackPolicy>,
        timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            fallback,
            timeout,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.pipeline, AudioPipeline::Ready(_))
    }

    pub async fn analyze(&self, video_path: &Path) -> ModalityResult {
        let ready = match &self.pipeline {
            AudioPipeline::Unavailable(reason) => {
                return ModalityResult::fallback(self.fallback.draw(), reason.note(), None);
            }
            AudioPipeline::Ready(ready) => ready,
        };

        match self.predict(ready, video_path).await {
            Ok(prediction) => {
                debug!("Audio prediction {:.4}", prediction);
                audio_decision(prediction)
            }
            Err(e) => {
                warn!(error = %e, "Error in audio analysis, using fallback");
                ModalityResult::fallback(
                    self.fallback.draw(),
                    AUDIO_ERROR_NOTE,
                    Some(format!("{:#}", e)),
                )
            }
        }
    }

    async fn predict(&self, ready: &ReadyAudioPipeline, video_path: &Path) -> Result<f32> {
        let waveform = tokio::time::timeout(self.timeout, ready.extractor.extract(video_path))
            .await
            .map_err(|_| {
                anyhow!(
                    "Audio extraction timed out after {:.1}s",
                    self.timeout.as_secs_f32()
                )
            })??;

        let features = Arc::clone(&ready.features);
        let sequence = blocking_inference(self.timeout, move || features.extract(&waveform)).await?;

        let classifier = Arc::clone(&ready.classifier);
        let prediction =
            blocking_inference(self.timeout, move || classifier.predict(&sequence)).await?;

        if !prediction.is_finite() {
            anyhow::bail!("Audio classifier returned a non-finite prediction: {}", prediction);
        }
        Ok(prediction)
    }
}

/// Verdict for the audio classifier's sigmoid output.
///
/// Low predictions mean deepfake, and confidence is the distance from the
/// decision boundary rescaled to [0, 1].
pub fn audio_decision(prediction: f32) -> ModalityResult {
    let prediction = prediction.clamp(0.0, 1.0);
    let confidence = ((prediction - 0.5).abs() * 2.0).min(1.0);
    ModalityResult::new(prediction <= AUDIO_DEEPFAKE_THRESHOLD, confidence)
        .with_note(AUDIO_COMPLETE_NOTE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::fallback::FallbackDraw;
    use async_trait::async_trait;
    use ndarray::Array3;

    struct FixedFallback;

    impl FallbackPolicy for FixedFallback {
        fn draw(&self) -> FallbackDraw {
            FallbackDraw {
                is_deepfake: false,
                confidence: 0.11,
            }
        }
    }

    struct StaticExtractor(Result<Vec<f32>, &'static str>);

    #[async_trait]
    impl AudioExtractorInterface for StaticExtractor {
        async fn extract(&self, _video_path: &Path) -> Result<Vec<f32>> {
            self.0.clone().map_err(|e| anyhow!(e))
        }
    }

    struct MeanFeatures;

    impl FeatureExtractorInterface for MeanFeatures {
        fn extract(&self, waveform: &[f32]) -> Result<Array3<f32>> {
            Ok(Array3::from_elem((1, waveform.len(), 2), 0.5))
        }
    }

    struct FixedPrediction(f32);

    impl AudioClassifierInterface for FixedPrediction {
        fn predict(&self, features: &Array3<f32>) -> Result<f32> {
            assert_eq!(features.shape()[0], 1);
            Ok(self.0)
        }
    }

    fn ready(extracted: Result<Vec<f32>, &'static str>, prediction: f32) -> AudioAnalyzer {
        AudioAnalyzer::new(
            AudioPipeline::Ready(ReadyAudioPipeline {
                extractor: Arc::new(StaticExtractor(extracted)),
                features: Arc::new(MeanFeatures),
                classifier: Arc::new(FixedPrediction(prediction)),
            }),
            Arc::new(FixedFallback),
            Duration::from_secs(1),
        )
    }

    #[test]
    fn low_prediction_is_deepfake_with_rescaled_confidence() {
        let result = audio_decision(0.1);
        assert!(result.is_deepfake);
        assert!((result.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn high_prediction_is_authentic() {
        let result = audio_decision(0.9);
        assert!(!result.is_deepfake);
        assert!((result.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn boundary_prediction_is_deepfake_with_zero_confidence() {
        let result = audio_decision(0.5);
        assert!(result.is_deepfake);
        assert_eq!(result.confidence, 0.0);
    }

    #[tokio::test]
    async fn ready_pipeline_reports_model_verdict() {
        let analyzer = ready(Ok(vec![0.1, -0.2, 0.3]), 0.2);
        assert!(analyzer.is_ready());

        let result = analyzer.analyze(Path::new("clip.mp4")).await;
        assert!(result.is_deepfake);
        assert!((result.confidence - 0.6).abs() < 1e-6);
        assert_eq!(result.note.as_deref(), Some(AUDIO_COMPLETE_NOTE));
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn extraction_failure_becomes_fallback_with_error() {
        let analyzer = ready(Err("no audio stream"), 0.2);

        let result = analyzer.analyze(Path::new("clip.mp4")).await;
        assert_eq!(result.confidence, 0.11);
        assert_eq!(result.note.as_deref(), Some(AUDIO_ERROR_NOTE));
        assert_eq!(result.error.as_deref(), Some("no audio stream"));
    }

    #[tokio::test]
    async fn unavailable_pipeline_explains_why() {
        for reason in [AudioUnavailable::DependenciesMissing, AudioUnavailable::ModelsMissing] {
            let analyzer = AudioAnalyzer::new(
                AudioPipeline::Unavailable(reason),
                Arc::new(FixedFallback),
                Duration::from_secs(1),
            );
            let result = analyzer.analyze(Path::new("clip.mp4")).await;
            assert_eq!(result.note.as_deref(), Some(reason.note()));
            assert!(result.error.is_none());
            assert_eq!(result.confidence, 0.11);
        }
    }
}
