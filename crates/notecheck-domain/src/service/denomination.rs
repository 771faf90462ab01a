//! Denomination estimation strategies
//!
//! Two strategies exist and exactly one is chosen per deployment:
//! a filename prefix heuristic, and a seeded uniform guess for setups where
//! no reliable signal is available.

use clap::ValueEnum;
use notecheck_types::Denomination;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Derives a denomination label for one upload
pub trait DenominationEstimator {
    fn estimate(&self, source_name: &str, image: &[u8]) -> Denomination;
}

/// Matches the upload filename against known face values (`100…`, `200…`, `500…`)
#[derive(Debug, Clone, Copy, Default)]
pub struct FilenamePrefixEstimator;

impl DenominationEstimator for FilenamePrefixEstimator {
    fn estimate(&self, source_name: &str, _image: &[u8]) -> Denomination {
        let file_name = base_name(source_name);
        Denomination::KNOWN
            .into_iter()
            .find(|d| d.face_value().is_some_and(|v| file_name.starts_with(v)))
            .unwrap_or(Denomination::Unknown)
    }
}

/// Uniform choice among the known denominations
pub struct RandomDenominationEstimator {
    rng: Mutex<StdRng>,
}

impl RandomDenominationEstimator {
    /// Seeded estimators are reproducible; `None` seeds from the OS
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

impl DenominationEstimator for RandomDenominationEstimator {
    fn estimate(&self, _source_name: &str, _image: &[u8]) -> Denomination {
        let mut rng = self.rng.lock();
        Denomination::KNOWN
            .choose(&mut *rng)
            .copied()
            .unwrap_or(Denomination::Unknown)
    }
}

/// Which estimator a deployment uses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenominationStrategy {
    #[default]
    Filename,
    Random,
}

impl DenominationStrategy {
    pub fn build(self, seed: Option<u64>) -> Box<dyn DenominationEstimator + Send + Sync> {
        match self {
            DenominationStrategy::Filename => Box::new(FilenamePrefixEstimator),
            DenominationStrategy::Random => Box::new(RandomDenominationEstimator::new(seed)),
        }
    }
}

impl std::fmt::Display for DenominationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenominationStrategy::Filename => write!(f, "filename"),
            DenominationStrategy::Random => write!(f, "random"),
        }
    }
}

/// Last path component of an untrusted name, for either separator
fn base_name(source_name: &str) -> &str {
    source_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(source_name)
}
