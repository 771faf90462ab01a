//! Classifier variants
//!
//! The variant is chosen once from `ModelState` by [`select_classifier`] and
//! never re-checked per call.

use ndarray::Array4;
use notecheck_domain::service::decide;
use notecheck_types::{round_percent, Error, InferenceMode, Result, Verdict};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model_gateway::ModelState;
use crate::preprocess::{self, INPUT_SIZE};

/// Result of classifying one image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub verdict: Verdict,
    /// Percentage likelihood of `verdict`, rounded to 2 decimals
    pub confidence: f64,
    /// Raw model score (probability of counterfeit); `None` in fallback mode
    pub score: Option<f64>,
    pub mode: InferenceMode,
}

/// Anything that maps a preprocessed image tensor to a counterfeit probability
pub trait ScoreModel {
    fn score(&self, input: Array4<f32>) -> Result<f32>;
}

pub trait Classifier {
    fn classify(&self, image: &[u8]) -> Result<Classification>;

    fn mode(&self) -> InferenceMode;
}

/// Runs one forward pass of a real model
pub struct ModelBackedClassifier<'a, M: ScoreModel + ?Sized> {
    model: &'a M,
    input_size: u32,
}

impl<'a, M: ScoreModel + ?Sized> ModelBackedClassifier<'a, M> {
    pub fn new(model: &'a M) -> Self {
        Self {
            model,
            input_size: INPUT_SIZE,
        }
    }
}

impl<M: ScoreModel + ?Sized> Classifier for ModelBackedClassifier<'_, M> {
    fn classify(&self, image: &[u8]) -> Result<Classification> {
        let img = preprocess::decode(image)?;
        let tensor = preprocess::to_input_tensor(&img, self.input_size);
        let score = self.model.score(tensor)?;
        if !score.is_finite() {
            return Err(Error::Inference(format!("non-finite score {}", score)));
        }

        let score = f64::from(score);
        let (verdict, confidence) = decide(score);
        log::debug!("model score {:.4} -> {} ({}%)", score, verdict, confidence);

        Ok(Classification {
            verdict,
            confidence,
            score: Some(score),
            mode: InferenceMode::Model,
        })
    }

    fn mode(&self) -> InferenceMode {
        InferenceMode::Model
    }
}

/// Demo-mode confidence range for genuine verdicts
pub const GENUINE_CONFIDENCE_RANGE: (f64, f64) = (95.0, 99.5);

/// Demo-mode confidence range for counterfeit verdicts
pub const COUNTERFEIT_CONFIDENCE_RANGE: (f64, f64) = (90.0, 96.0);

/// Plausible-looking output when no model is loaded. Never reads the image.
pub struct StochasticFallbackClassifier {
    rng: Mutex<StdRng>,
}

impl StochasticFallbackClassifier {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl Classifier for StochasticFallbackClassifier {
    fn classify(&self, _image: &[u8]) -> Result<Classification> {
        let mut rng = self.rng.lock();
        let verdict = if rng.gen_bool(0.5) {
            Verdict::Genuine
        } else {
            Verdict::Counterfeit
        };
        let (low, high) = match verdict {
            Verdict::Genuine => GENUINE_CONFIDENCE_RANGE,
            Verdict::Counterfeit => COUNTERFEIT_CONFIDENCE_RANGE,
        };
        let confidence = round_percent(rng.gen_range(low..=high));

        Ok(Classification {
            verdict,
            confidence,
            score: None,
            mode: InferenceMode::Fallback,
        })
    }

    fn mode(&self) -> InferenceMode {
        InferenceMode::Fallback
    }
}

/// Pick the classifier variant for the process-wide model state
pub fn select_classifier(state: &ModelState, seed: Option<u64>) -> Box<dyn Classifier + '_> {
    match state {
        ModelState::Loaded(model) => Box::new(ModelBackedClassifier::new(model)),
        ModelState::Unavailable => {
            log::warn!("No model loaded: using stochastic fallback, no real inference will run");
            Box::new(StochasticFallbackClassifier::new(seed))
        }
    }
}
