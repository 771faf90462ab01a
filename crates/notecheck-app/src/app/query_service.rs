//! Read-only queries over the audit log

use notecheck_domain::repository::AuditLogRepository;
use notecheck_domain::service::{summarize, AggregateSummary};
use notecheck_types::{Error, PredictionRecord, Result};
use std::path::{Path, PathBuf};

use crate::intake::locate_upload;

/// Recompute the dashboard from a full replay
pub fn dashboard(audit_log: &dyn AuditLogRepository) -> Result<AggregateSummary> {
    let records = audit_log.replay()?;
    Ok(summarize(&records))
}

/// Most recent records first
pub fn history(audit_log: &dyn AuditLogRepository, limit: usize) -> Result<Vec<PredictionRecord>> {
    let records = audit_log.replay()?;
    Ok(records.into_iter().rev().take(limit).collect())
}

/// Record by position counted from the newest (0 = most recent), with the
/// path its upload was stored at
pub fn find_record_upload(
    audit_log: &dyn AuditLogRepository,
    upload_dir: &Path,
    index: usize,
) -> Result<(PredictionRecord, PathBuf)> {
    let records = audit_log.replay()?;
    let position = position_from_newest(records.len(), index)?;
    let upload = locate_upload(upload_dir, &records, position)
        .ok_or_else(|| Error::FileNotFound(format!("no upload for record {}", index)))?;
    Ok((records[position].clone(), upload))
}

fn position_from_newest(total: usize, index: usize) -> Result<usize> {
    index
        .checked_add(1)
        .and_then(|n| total.checked_sub(n))
        .ok_or_else(|| {
            Error::FileNotFound(format!(
                "no audit log record at index {} ({} records)",
                index, total
            ))
        })
}
