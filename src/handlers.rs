use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Map, Value};
use tracing::{debug, info, Instrument};
use uuid::Uuid;

use crate::detection::{fuse, visual_from_frames, DetectionResponse};
use crate::error::DetectError;
use crate::media::{decode_base64, preprocess_image, FrameSampler, TempVideo};
use crate::state::AppState;

/// Media carried by a validated detection request, still base64-encoded
#[derive(Debug, PartialEq)]
pub enum DetectionRequest<'a> {
    Image(&'a str),
    Video(&'a str),
}

/// Check that the body is an object with exactly one string `image` or `video`.
pub fn parse_request(body: &Value) -> Result<DetectionRequest<'_>, DetectError> {
    let object = body
        .as_object()
        .ok_or_else(|| DetectError::Validation("No data provided".to_string()))?;

    match (media_field(object, "image")?, media_field(object, "video")?) {
        (Some(image), None) => Ok(DetectionRequest::Image(image)),
        (None, Some(video)) => Ok(DetectionRequest::Video(video)),
        (Some(_), Some(_)) => Err(DetectError::Validation(
            "Provide exactly one of 'image' or 'video'".to_string(),
        )),
        (None, None) => Err(DetectError::Validation(
            "No image or video data provided".to_string(),
        )),
    }
}

fn media_field<'a>(
    object: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a str>, DetectError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(data)) if data.trim().is_empty() => Err(DetectError::Validation(
            format!("'{}' payload is empty", key),
        )),
        Some(Value::String(data)) => Ok(Some(data)),
        Some(_) => Err(DetectError::Validation(format!(
            "'{}' must be a base64-encoded string",
            key
        ))),
    }
}

pub async fn detect_deepfake(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DetectionResponse>, DetectError> {
    let Json(body) = payload.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            DetectError::PayloadTooLarge(state.config.system_config.max_body_bytes)
        } else {
            debug!("Rejected request body: {}", rejection.body_text());
            DetectError::Validation("No data provided".to_string())
        }
    })?;

    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("detect", %request_id);

    async {
        let response = match parse_request(&body)? {
            DetectionRequest::Image(data) => detect_image(&state, data).await?,
            DetectionRequest::Video(data) => detect_video(&state, data).await?,
        };
        info!(
            media_type = ?response.media_type,
            is_deepfake = response.is_deepfake,
            confidence = response.confidence,
            "Detection complete"
        );
        Ok::<_, DetectError>(Json(response))
    }
    .instrument(span)
    .await
}

async fn detect_image(state: &AppState, data: &str) -> Result<DetectionResponse, DetectError> {
    let bytes = decode_base64(data)?;
    if let Some(result) = state.image_classifier.unavailable_result() {
        debug!("Image model unavailable, skipping decode of {} bytes", bytes.len());
        return Ok(DetectionResponse::image(result));
    }
    let frame = preprocess_image(&bytes)?;
    let result = state.image_classifier.classify(frame).await;
    Ok(DetectionResponse::image(result))
}

async fn detect_video(state: &AppState, data: &str) -> Result<DetectionResponse, DetectError> {
    let system = &state.config.system_config;
    let models = &state.config.model_config;

    let video = {
        let bytes = decode_base64(data)?;
        TempVideo::create(&bytes, &system.temp_dir())?
        // decoded bytes dropped here, the file is the only copy
    };

    let sampler = FrameSampler::new(models.frame_interval, models.max_frames);
    let frames = tokio::time::timeout(
        models.inference_timeout(),
        state.frame_source.sample_frames(video.path(), sampler),
    )
    .await
    .map_err(|_| {
        anyhow::anyhow!(
            "Frame extraction timed out after {}s",
            models.inference_timeout_secs
        )
    })??;

    if frames.is_empty() {
        return Err(DetectError::NoFrames);
    }
    debug!("Classifying {} sampled frames", frames.len());

    let mut frame_results = Vec::with_capacity(frames.len());
    for frame in frames {
        frame_results.push(state.image_classifier.classify(frame).await);
    }
    let visual = visual_from_frames(&frame_results);
    let audio = state.audio_analyzer.analyze(video.path()).await;
    let verdict = fuse(&visual, &audio);

    Ok(DetectionResponse::video(verdict, visual, audio))
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "image_model": state.image_classifier.is_ready(),
        "audio_pipeline": state.audio_analyzer.is_ready(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_exactly_one_media_key() {
        let body = json!({"image": "aGk="});
        assert_eq!(parse_request(&body).unwrap(), DetectionRequest::Image("aGk="));

        let body = json!({"video": "aGk=", "image": null});
        assert_eq!(parse_request(&body).unwrap(), DetectionRequest::Video("aGk="));
    }

    #[test]
    fn rejects_missing_and_ambiguous_keys() {
        let err = parse_request(&json!({"audio": "aGk="})).unwrap_err();
        assert_eq!(err.to_string(), "No image or video data provided");

        let err = parse_request(&json!({"image": "aGk=", "video": "aGk="})).unwrap_err();
        assert!(matches!(err, DetectError::Validation(_)));
    }

    #[test]
    fn rejects_non_object_and_non_string_payloads() {
        let err = parse_request(&json!(["image"])).unwrap_err();
        assert_eq!(err.to_string(), "No data provided");

        let err = parse_request(&json!({"image": 42})).unwrap_err();
        assert_eq!(err.to_string(), "'image' must be a base64-encoded string");

        let err = parse_request(&json!({"video": "  "})).unwrap_err();
        assert_eq!(err.to_string(), "'video' payload is empty");
    }
}
