use rand::Rng;

/// Probability that a fallback draw reports a deepfake.
pub const FALLBACK_DEEPFAKE_PROBABILITY: f64 = 0.2;

/// One randomized verdict used when a model cannot be consulted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackDraw {
    pub is_deepfake: bool,
    pub confidence: f32,
}

/// Source of verdicts for the fallback mode of every adapter.
pub trait FallbackPolicy: Send + Sync {
    fn draw(&self) -> FallbackDraw;
}

/// Uniform confidence in [0, 1) and a deepfake verdict drawn with a fixed
/// probability, independent of the confidence.
#[derive(Debug, Clone)]
pub struct RandomFallback {
    deepfake_probability: f64,
}

impl RandomFallback {
    pub fn new(deepfake_probability: f64) -> Self {
        Self {
            deepfake_probability: deepfake_probability.clamp(0.0, 1.0),
        }
    }
}

impl Default for RandomFallback {
    fn default() -> Self {
        Self::new(FALLBACK_DEEPFAKE_PROBABILITY)
    }
}

impl FallbackPolicy for RandomFallback {
    fn draw(&self) -> FallbackDraw {
        let mut rng = rand::thread_rng();
        FallbackDraw {
            is_deepfake: rng.gen_bool(self.deepfake_probability),
            confidence: rng.gen::<f32>(),
        }
    }
}
