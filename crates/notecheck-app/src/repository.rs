//! Repository adapters for persistence layer

use notecheck_infra::persistence::CsvAuditLog;
use notecheck_types::Result;

use crate::config::Config;

/// Open the configured CSV audit log
pub fn open_audit_log(config: &Config) -> Result<CsvAuditLog> {
    CsvAuditLog::open(config.log_path()?)
}
