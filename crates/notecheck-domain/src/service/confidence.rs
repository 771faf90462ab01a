//! Verdict decision rule for raw model scores

use notecheck_types::{round_percent, Verdict};

/// Scores strictly above this are counterfeit
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Turn a model score `s` (probability of counterfeit) into a verdict and the
/// confidence of that verdict.
///
/// The confidence is always the probability mass of the chosen class:
/// `s * 100` for counterfeit, `(1 - s) * 100` for genuine.
pub fn decide(score: f64) -> (Verdict, f64) {
    let score = score.clamp(0.0, 1.0);
    if score > DECISION_THRESHOLD {
        (Verdict::Counterfeit, round_percent(score * 100.0))
    } else {
        (Verdict::Genuine, round_percent((1.0 - score) * 100.0))
    }
}
