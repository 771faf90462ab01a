//! Domain services

pub mod confidence;
pub mod dashboard;
pub mod denomination;

pub use confidence::{decide, DECISION_THRESHOLD};
pub use dashboard::{summarize, AggregateSummary, DenominationTally, MostCommon};
pub use denomination::{
    DenominationEstimator, DenominationStrategy, FilenamePrefixEstimator,
    RandomDenominationEstimator,
};
