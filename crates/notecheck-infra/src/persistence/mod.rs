//! Persistence implementations
//!
//! This module provides file-based implementations of the repository traits.

mod csv_audit_log;

pub use csv_audit_log::{CsvAuditLog, Replay, LEGACY_LOG_HEADER, LOG_HEADER};
