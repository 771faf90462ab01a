//! Upload intake
//!
//! Upload filenames are untrusted. They are only ever used as a display
//! string, and as a sanitized file name inside the upload directory.
//!
//! Each stored upload is named after its audit log record:
//! `{timestamp}_{name}` for the first upload with that timestamp and name,
//! `{timestamp}-{n}_{name}` for the n-th one after it. Stored files are
//! never overwritten.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use notecheck_types::{PredictionRecord, Result};

const UPLOAD_STAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Upper bound on uploads sharing one timestamp and name
const MAX_OCCURRENCES: usize = 1000;

/// Reduce an untrusted name to a safe single path component
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Stored file name of the `occurrence`-th upload that shares this
/// record's timestamp and sanitized name
pub fn upload_file_name(record: &PredictionRecord, occurrence: usize) -> String {
    let stamp = record.timestamp.format(UPLOAD_STAMP_FORMAT);
    let name = sanitize_filename(&record.source_name);
    if occurrence == 0 {
        format!("{}_{}", stamp, name)
    } else {
        format!("{}-{}_{}", stamp, occurrence, name)
    }
}

pub fn upload_path(upload_dir: &Path, record: &PredictionRecord, occurrence: usize) -> PathBuf {
    upload_dir.join(upload_file_name(record, occurrence))
}

/// Save the bytes behind a logged record into the first free occurrence slot
pub fn store_upload(upload_dir: &Path, record: &PredictionRecord, bytes: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(upload_dir)?;
    for occurrence in 0..MAX_OCCURRENCES {
        let path = upload_path(upload_dir, record, occurrence);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)?;
                file.sync_all()?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(std::io::Error::new(
        ErrorKind::AlreadyExists,
        format!(
            "{} uploads already stored as {}",
            MAX_OCCURRENCES,
            upload_file_name(record, 0)
        ),
    )
    .into())
}

/// Where the upload for `records[position]` was stored, assuming uploads
/// were stored in log order
pub fn locate_upload(upload_dir: &Path, records: &[PredictionRecord], position: usize) -> Option<PathBuf> {
    let record = records.get(position)?;
    let key = upload_file_name(record, 0);
    let occurrence = records[..position]
        .iter()
        .filter(|r| upload_file_name(r, 0) == key)
        .count();
    Some(upload_path(upload_dir, record, occurrence))
}
