use super::types::{DominantFactor, ModalityResult};

/// Mean frame score above this marks the visual modality as deepfake.
pub const VISUAL_DEEPFAKE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedVerdict {
    pub is_deepfake: bool,
    pub confidence: f32,
    pub dominant_factor: DominantFactor,
}

/// Collapse per-frame image results into the visual modality result.
///
/// Confidence is the mean frame score and the verdict is `mean > 0.5`; the
/// individual frame verdicts do not vote. The first fallback note and error
/// seen among the frames are carried over.
pub fn visual_from_frames(frames: &[ModalityResult]) -> ModalityResult {
    if frames.is_empty() {
        return ModalityResult::new(false, 0.0);
    }

    let mean = frames.iter().map(|f| f.confidence).sum::<f32>() / frames.len() as f32;
    ModalityResult {
        is_deepfake: mean > VISUAL_DEEPFAKE_THRESHOLD,
        confidence: mean,
        note: frames.iter().find_map(|f| f.note.clone()),
        error: frames.iter().find_map(|f| f.error.clone()),
    }
}

/// Report the modality with the higher confidence. Ties go to visual.
pub fn fuse(visual: &ModalityResult, audio: &ModalityResult) -> FusedVerdict {
    if audio.confidence > visual.confidence {
        FusedVerdict {
            is_deepfake: audio.is_deepfake,
            confidence: audio.confidence,
            dominant_factor: DominantFactor::Audio,
        }
    } else {
        FusedVerdict {
            is_deepfake: visual.is_deepfake,
            confidence: visual.confidence,
            dominant_factor: DominantFactor::Visual,
        }
    }
}
