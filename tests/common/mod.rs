#![allow(dead_code)]

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use ndarray::Array3;
use parking_lot::Mutex;
use serde_json::Value;
use tower::ServiceExt;

use deepfake_detector::audio::{
    AudioAnalyzer, AudioClassifierInterface, AudioExtractorInterface, AudioPipeline,
    AudioUnavailable, FeatureExtractorInterface, ReadyAudioPipeline, AUDIO_FEATURE_DIM,
};
use deepfake_detector::classifier::{
    FallbackDraw, FallbackPolicy, ImageClassifier, ImageClassifierInterface, ImageModelState,
};
use deepfake_detector::config::Config;
use deepfake_detector::media::{FrameSampler, FrameSource, FrameTensor, FRAME_BYTES};
use deepfake_detector::routes;
use deepfake_detector::state::AppState;

/// Fallback that always answers "not a deepfake" with confidence 0.42.
pub struct FixedFallback;

impl FallbackPolicy for FixedFallback {
    fn draw(&self) -> FallbackDraw {
        FallbackDraw {
            is_deepfake: false,
            confidence: 0.42,
        }
    }
}

pub struct FixedImageModel(pub f32);

impl ImageClassifierInterface for FixedImageModel {
    fn predict(&self, _frame: &FrameTensor) -> anyhow::Result<f32> {
        Ok(self.0)
    }
}

pub struct StubAudioExtractor;

#[async_trait]
impl AudioExtractorInterface for StubAudioExtractor {
    async fn extract(&self, _video_path: &Path) -> anyhow::Result<Vec<f32>> {
        Ok(vec![0.1; 1600])
    }
}

pub struct StubFeatures;

impl FeatureExtractorInterface for StubFeatures {
    fn extract(&self, _waveform: &[f32]) -> anyhow::Result<Array3<f32>> {
        Ok(Array3::zeros((1, 4, AUDIO_FEATURE_DIM)))
    }
}

pub struct FixedAudioModel(pub f32);

impl AudioClassifierInterface for FixedAudioModel {
    fn predict(&self, _features: &Array3<f32>) -> anyhow::Result<f32> {
        Ok(self.0)
    }
}

pub enum FrameBehavior {
    Frames(usize),
    Empty,
    Fail,
    Panic,
}

/// Frame source that records the file it was handed and whether the file
/// existed at that point.
pub struct StubFrameSource {
    behavior: FrameBehavior,
    seen: Mutex<Option<(PathBuf, bool)>>,
}

impl StubFrameSource {
    pub fn new(behavior: FrameBehavior) -> Arc<Self> {
        Arc::new(Self {
            behavior,
            seen: Mutex::new(None),
        })
    }

    pub fn seen(&self) -> Option<(PathBuf, bool)> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl FrameSource for StubFrameSource {
    async fn sample_frames(
        &self,
        video_path: &Path,
        _sampler: FrameSampler,
    ) -> anyhow::Result<Vec<FrameTensor>> {
        *self.seen.lock() = Some((video_path.to_path_buf(), video_path.exists()));

        match self.behavior {
            FrameBehavior::Frames(count) => (0..count)
                .map(|_| FrameTensor::from_rgb_bytes(&vec![128u8; FRAME_BYTES]))
                .collect(),
            FrameBehavior::Empty => Ok(Vec::new()),
            FrameBehavior::Fail => Err(anyhow::anyhow!("decoder crashed")),
            FrameBehavior::Panic => panic!("decoder panicked"),
        }
    }
}

/// Config whose temporary media lands in `temp_dir`.
pub fn test_config(temp_dir: &Path) -> Config {
    let mut config = Config::default();
    config.system_config.host = "127.0.0.1".to_string();
    config.system_config.port = 0;
    config.system_config.temp_dir = Some(temp_dir.to_path_buf());
    config.model_config.inference_timeout_secs = 5;
    config
}

pub fn image_classifier(score: Option<f32>) -> ImageClassifier {
    let state = match score {
        Some(score) => ImageModelState::Ready(Arc::new(FixedImageModel(score))),
        None => ImageModelState::Unavailable {
            reason: "model file missing".to_string(),
        },
    };
    ImageClassifier::new(state, Arc::new(FixedFallback), Duration::from_secs(5))
}

pub fn audio_analyzer(prediction: Option<f32>) -> AudioAnalyzer {
    let pipeline = match prediction {
        Some(prediction) => AudioPipeline::Ready(ReadyAudioPipeline {
            extractor: Arc::new(StubAudioExtractor),
            features: Arc::new(StubFeatures),
            classifier: Arc::new(FixedAudioModel(prediction)),
        }),
        None => AudioPipeline::Unavailable(AudioUnavailable::ModelsMissing),
    };
    AudioAnalyzer::new(pipeline, Arc::new(FixedFallback), Duration::from_secs(5))
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(
    temp_dir: &Path,
    image_score: Option<f32>,
    audio_prediction: Option<f32>,
    frame_source: Arc<dyn FrameSource>,
) -> Router {
    let state = AppState::from_parts(
        test_config(temp_dir),
        image_classifier(image_score),
        audio_analyzer(audio_prediction),
        frame_source,
    );
    routes::create_app(state)
}

pub async fn post_json(app: Router, uri: &str, body: &Value) -> Response<Body> {
    post_raw(app, uri, body.to_string()).await
}

pub async fn post_raw(app: Router, uri: &str, body: String) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Base64 of a small solid-colour PNG.
pub fn png_base64() -> String {
    let image = image::RgbImage::from_pixel(16, 16, image::Rgb([200, 40, 40]));
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .unwrap();
    STANDARD.encode(buffer.into_inner())
}

pub fn video_base64() -> String {
    STANDARD.encode(b"\x00\x00\x00\x18ftypmp42 not really a video")
}

pub fn dir_is_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

pub fn approx(value: &Value, expected: f64) -> bool {
    (value.as_f64().unwrap() - expected).abs() < 1e-4
}
