//! Inference Service - Core Use Case for Currency Image Checks
//!
//! This service orchestrates one classification request:
//! 1. Classify the image (model-backed or fallback, fixed at construction)
//! 2. Estimate the denomination
//! 3. Build the prediction record
//! 4. Append it to the audit log
//!
//! A failed classification never reaches the log.

use chrono::{Local, NaiveDateTime, SubsecRound};
use notecheck_domain::repository::AuditLogRepository;
use notecheck_domain::service::{DenominationEstimator, DenominationStrategy};
use notecheck_types::{InferenceMode, PredictionOutcome, PredictionRecord, Result};
use notecheck_vision::{select_classifier, Classifier, ModelState};

pub struct InferenceService<'a> {
    classifier: Box<dyn Classifier + 'a>,
    estimator: Box<dyn DenominationEstimator + 'a>,
    audit_log: &'a dyn AuditLogRepository,
}

impl<'a> InferenceService<'a> {
    pub fn new(
        classifier: Box<dyn Classifier + 'a>,
        estimator: Box<dyn DenominationEstimator + 'a>,
        audit_log: &'a dyn AuditLogRepository,
    ) -> Self {
        Self {
            classifier,
            estimator,
            audit_log,
        }
    }

    /// Wire the service from startup state. `seed` makes fallback output and
    /// random denominations reproducible.
    pub fn from_state(
        state: &'a ModelState,
        strategy: DenominationStrategy,
        seed: Option<u64>,
        audit_log: &'a dyn AuditLogRepository,
    ) -> Self {
        Self::new(
            select_classifier(state, seed),
            strategy.build(seed),
            audit_log,
        )
    }

    pub fn mode(&self) -> InferenceMode {
        self.classifier.mode()
    }

    /// Classify one upload and record it, timestamped now
    pub fn process(&self, source_name: &str, image: &[u8]) -> Result<PredictionOutcome> {
        self.process_at(source_name, image, Local::now().naive_local())
    }

    pub fn process_at(
        &self,
        source_name: &str,
        image: &[u8],
        timestamp: NaiveDateTime,
    ) -> Result<PredictionOutcome> {
        let classification = self.classifier.classify(image)?;
        let denomination = self.estimator.estimate(source_name, image);

        let record = PredictionRecord {
            timestamp: timestamp.trunc_subsecs(0),
            verdict: classification.verdict,
            confidence: classification.confidence,
            denomination,
            source_name: source_name.to_string(),
        };

        self.audit_log.append(&record)?;

        match classification.mode {
            InferenceMode::Model => log::info!(
                "{}: {} ({}%, {}, score {:.4})",
                source_name,
                record.verdict,
                record.confidence,
                record.denomination,
                classification.score.unwrap_or_default()
            ),
            InferenceMode::Fallback => log::warn!(
                "{}: {} ({}%, {}) from fallback mode, no real inference performed",
                source_name,
                record.verdict,
                record.confidence,
                record.denomination
            ),
        }

        Ok(PredictionOutcome {
            record,
            mode: classification.mode,
        })
    }
}
