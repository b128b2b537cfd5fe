use serde::{Deserialize, Serialize};

use crate::classifier::fallback::FallbackDraw;

/// Verdict of one modality (visual or audio)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityResult {
    pub is_deepfake: bool,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModalityResult {
    pub fn new(is_deepfake: bool, confidence: f32) -> Self {
        Self {
            is_deepfake,
            confidence,
            note: None,
            error: None,
        }
    }

    /// Result produced when the real model path could not be used.
    pub fn fallback(draw: FallbackDraw, note: &str, error: Option<String>) -> Self {
        Self {
            is_deepfake: draw.is_deepfake,
            confidence: draw.confidence,
            note: Some(note.to_string()),
            error,
        }
    }

    pub fn with_note(mut self, note: &str) -> Self {
        self.note = Some(note.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DominantFactor {
    Audio,
    Visual,
}

/// Body of a successful `/detect-deepfake` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResponse {
    pub is_deepfake: bool,
    pub confidence: f32,
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual_result: Option<ModalityResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_result: Option<ModalityResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dominant_factor: Option<DominantFactor>,
}

impl DetectionResponse {
    pub fn image(result: ModalityResult) -> Self {
        Self {
            is_deepfake: result.is_deepfake,
            confidence: result.confidence,
            media_type: MediaType::Image,
            note: result.note,
            error: result.error,
            visual_result: None,
            audio_result: None,
            dominant_factor: None,
        }
    }

    pub fn video(
        verdict: super::fusion::FusedVerdict,
        visual: ModalityResult,
        audio: ModalityResult,
    ) -> Self {
        Self {
            is_deepfake: verdict.is_deepfake,
            confidence: verdict.confidence,
            media_type: MediaType::Video,
            note: None,
            error: None,
            visual_result: Some(visual),
            audio_result: Some(audio),
            dominant_factor: Some(verdict.dominant_factor),
        }
    }
}
