//! Repository trait definitions for data persistence

use notecheck_types::{PredictionRecord, Result};

/// Append-only store of past predictions
///
/// Insertion order is chronological order. Implementations never edit or
/// delete rows once written.
pub trait AuditLogRepository {
    /// Durably append one record as a single row
    fn append(&self, record: &PredictionRecord) -> Result<()>;

    /// Read every record in append order. Rows that fail to parse are skipped.
    fn replay(&self) -> Result<Vec<PredictionRecord>>;
}
