//! CSV-backed append-only audit log
//!
//! One row per prediction with the fixed column order
//! `timestamp, verdict, confidence, denomination, source_name`. The header is
//! written together with the first row and never again.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use parking_lot::Mutex;

use notecheck_domain::repository::AuditLogRepository;
use notecheck_types::{
    Denomination, Error, PredictionRecord, Result, Verdict, TIMESTAMP_FORMAT,
};

/// Column names written on first append
pub const LOG_HEADER: [&str; 5] = [
    "timestamp",
    "verdict",
    "confidence",
    "denomination",
    "source_name",
];

/// Header written by earlier releases. Same column order.
pub const LEGACY_LOG_HEADER: [&str; 5] = [
    "timestamp",
    "result",
    "confidence",
    "denomination",
    "image_name",
];

/// Outcome of a full scan, including rows that had to be skipped
#[derive(Debug, Default)]
pub struct Replay {
    pub records: Vec<PredictionRecord>,
    /// `Error::LogCorruption` for each skipped row
    pub corrupt_rows: Vec<Error>,
}

/// Append-only prediction log stored as a UTF-8 CSV file
pub struct CsvAuditLog {
    path: PathBuf,
    // serialises appends within this process; each row is also a single
    // append-mode write so rows from other processes cannot interleave
    write_lock: Mutex<()>,
}

impl CsvAuditLog {
    /// Prepare a log at `path`. The file itself is created lazily on first append.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replay every row, collecting corrupt rows instead of aborting
    pub fn replay_detailed(&self) -> Result<Replay> {
        if !self.path.exists() {
            return Ok(Replay::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)?;

        let headers = reader.headers()?.clone();
        if !header_matches(&headers, &LOG_HEADER) && !header_matches(&headers, &LEGACY_LOG_HEADER) {
            log::warn!(
                "Unexpected audit log header in {}: {:?}",
                self.path.display(),
                headers.iter().collect::<Vec<_>>()
            );
        }

        let mut replay = Replay::default();
        for (idx, result) in reader.records().enumerate() {
            let fallback_row = idx as u64 + 2;
            let parsed = match result {
                Ok(row) => {
                    let line = row.position().map(|p| p.line()).unwrap_or(fallback_row);
                    parse_row(&row, line)
                }
                Err(e) if e.is_io_error() => return Err(e.into()),
                Err(e) => Err(Error::LogCorruption {
                    row: e.position().map(|p| p.line()).unwrap_or(fallback_row),
                    reason: e.to_string(),
                }),
            };

            match parsed {
                Ok(record) => replay.records.push(record),
                Err(e) => {
                    log::warn!("Skipping audit log row: {}", e);
                    replay.corrupt_rows.push(e);
                }
            }
        }

        Ok(replay)
    }
}

impl AuditLogRepository for CsvAuditLog {
    fn append(&self, record: &PredictionRecord) -> Result<()> {
        let _guard = self.write_lock.lock();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let needs_header = file.metadata()?.len() == 0;

        let bytes = encode_row(record, needs_header)?;
        file.write_all(&bytes)?;
        file.sync_data()?;
        Ok(())
    }

    fn replay(&self) -> Result<Vec<PredictionRecord>> {
        Ok(self.replay_detailed()?.records)
    }
}

fn header_matches(headers: &csv::StringRecord, expected: &[&str; 5]) -> bool {
    headers.len() == expected.len() && headers.iter().zip(expected).all(|(h, e)| h.trim() == *e)
}

/// Serialise one row (optionally preceded by the header) into a single buffer
fn encode_row(record: &PredictionRecord, with_header: bool) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    if with_header {
        writer.write_record(LOG_HEADER)?;
    }
    writer.write_record([
        record.formatted_timestamp(),
        record.verdict.as_str().to_string(),
        record.confidence.to_string(),
        record.denomination.label().to_string(),
        record.source_name.clone(),
    ])?;

    writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))
}

fn parse_row(row: &csv::StringRecord, line: u64) -> Result<PredictionRecord> {
    let corrupt = |reason: String| Error::LogCorruption { row: line, reason };

    if row.len() != LOG_HEADER.len() {
        return Err(corrupt(format!(
            "expected {} fields, found {}",
            LOG_HEADER.len(),
            row.len()
        )));
    }

    let field = |i: usize| row.get(i).unwrap_or("");

    let timestamp = NaiveDateTime::parse_from_str(field(0).trim(), TIMESTAMP_FORMAT)
        .map_err(|e| corrupt(format!("bad timestamp '{}': {}", field(0), e)))?;

    let verdict: Verdict = field(1).parse().map_err(corrupt)?;

    let confidence: f64 = field(2)
        .trim()
        .parse()
        .map_err(|_| corrupt(format!("bad confidence '{}'", field(2))))?;
    // 0.0 only ever comes from legacy rows, which stored the raw score for both verdicts
    if !(0.0..=100.0).contains(&confidence) {
        return Err(corrupt(format!("confidence {} out of range", confidence)));
    }

    let denomination = field(3).parse::<Denomination>().unwrap_or_else(|e| {
        log::warn!("Audit log row {}: {}, counted as Unknown", line, e);
        Denomination::Unknown
    });

    Ok(PredictionRecord {
        timestamp,
        verdict,
        confidence,
        denomination,
        source_name: field(4).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use notecheck_domain::service::{summarize, MostCommon};
    use std::sync::Arc;
    use std::thread;
    use tempfile::tempdir;

    fn record(second: u32, verdict: Verdict, source_name: &str) -> PredictionRecord {
        PredictionRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 17)
                .unwrap()
                .and_hms_opt(9, 30, second)
                .unwrap(),
            verdict,
            confidence: 93.17,
            denomination: Denomination::Rs500,
            source_name: source_name.to_string(),
        }
    }

    #[test]
    fn test_single_record_round_trip() {
        let dir = tempdir().unwrap();
        let log = CsvAuditLog::open(dir.path().join("prediction_log.csv")).unwrap();
        let r = record(1, Verdict::Counterfeit, "500_front.jpg");
        log.append(&r).unwrap();
        assert_eq!(log.replay().unwrap(), vec![r]);
    }

    #[test]
    fn test_replay_preserves_append_order() {
        let dir = tempdir().unwrap();
        let log = CsvAuditLog::open(dir.path().join("log.csv")).unwrap();
        let records: Vec<_> = (0..10)
            .map(|i| {
                let verdict = if i % 3 == 0 { Verdict::Counterfeit } else { Verdict::Genuine };
                record(i, verdict, &format!("note_{}.jpg", i))
            })
            .collect();
        for r in &records {
            log.append(r).unwrap();
        }
        assert_eq!(log.replay().unwrap(), records);
    }

    #[test]
    fn test_header_written_once_and_lazily() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("log.csv");
        let log = CsvAuditLog::open(&path).unwrap();
        assert!(!path.exists());
        assert!(log.replay().unwrap().is_empty());

        log.append(&record(1, Verdict::Genuine, "a.jpg")).unwrap();
        log.append(&record(2, Verdict::Genuine, "b.jpg")).unwrap();

        // reopening must not rewrite the header
        let reopened = CsvAuditLog::open(&path).unwrap();
        reopened.append(&record(3, Verdict::Genuine, "c.jpg")).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header = LOG_HEADER.join(",");
        assert!(content.starts_with(&header));
        assert_eq!(content.matches(&header).count(), 1);
        assert_eq!(content.lines().count(), 4);
    }

    #[test]
    fn test_awkward_source_names_round_trip() {
        let dir = tempdir().unwrap();
        let log = CsvAuditLog::open(dir.path().join("log.csv")).unwrap();
        let names = [
            "plain.jpg",
            "with,comma.jpg",
            "with \"quotes\".png",
            "multi\nline.jpg",
            "नोट ₹500.jpg",
            "",
        ];
        let records: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, n)| record(i as u32, Verdict::Genuine, n))
            .collect();
        for r in &records {
            log.append(r).unwrap();
        }
        assert_eq!(log.replay().unwrap(), records);
    }

    #[test]
    fn test_confidence_round_trips_exactly() {
        let dir = tempdir().unwrap();
        let log = CsvAuditLog::open(dir.path().join("log.csv")).unwrap();
        let values = [50.0, 99.99, 0.01, 100.0, 87.35, 66.67];
        for (i, c) in values.iter().enumerate() {
            let mut r = record(i as u32, Verdict::Counterfeit, "x.jpg");
            r.confidence = *c;
            log.append(&r).unwrap();
        }
        let replayed: Vec<f64> = log.replay().unwrap().iter().map(|r| r.confidence).collect();
        assert_eq!(replayed, values);
    }

    #[test]
    fn test_corrupt_rows_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let log = CsvAuditLog::open(&path).unwrap();
        log.append(&record(1, Verdict::Genuine, "first.jpg")).unwrap();

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(b"not-a-date,GENUINE,90,\xe2\x82\xb9100,bad.jpg\n").unwrap();
        file.write_all(b"2024-05-17 09:30:05,MAYBE,90,Unknown,bad.jpg\n").unwrap();
        file.write_all(b"2024-05-17 09:30:06,GENUINE,abc,Unknown,bad.jpg\n").unwrap();
        file.write_all(b"2024-05-17 09:30:07,GENUINE\n").unwrap();
        file.write_all(b"2024-05-17 09:30:08,GENUINE,101,Unknown,bad.jpg\n").unwrap();
        drop(file);

        log.append(&record(9, Verdict::Counterfeit, "last.jpg")).unwrap();

        let replay = log.replay_detailed().unwrap();
        assert_eq!(replay.records.len(), 2);
        assert_eq!(replay.records[0].source_name, "first.jpg");
        assert_eq!(replay.records[1].source_name, "last.jpg");
        assert_eq!(replay.corrupt_rows.len(), 5);
        assert!(replay
            .corrupt_rows
            .iter()
            .all(|e| matches!(e, Error::LogCorruption { .. })));
    }

    #[test]
    fn test_unrecognised_denomination_still_counted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prediction_log.csv");
        fs::write(
            &path,
            "timestamp,verdict,confidence,denomination,source_name\n\
             2024-03-01 10:00:00,GENUINE,97.5,₹100,a.jpg\n\
             2024-03-01 10:00:01,COUNTERFEIT,91.0,₹2000,b.jpg\n\
             2024-03-01 10:00:02,GENUINE,96.1,₹50,c.jpg\n",
        )
        .unwrap();

        let log = CsvAuditLog::open(&path).unwrap();
        let replay = log.replay_detailed().unwrap();
        assert!(replay.corrupt_rows.is_empty());
        assert_eq!(replay.records[1].denomination, Denomination::Unknown);
        assert_eq!(replay.records[2].denomination, Denomination::Unknown);

        let summary = summarize(&replay.records);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.genuine_count, 2);
        assert_eq!(summary.counterfeit_count, 1);
        assert_eq!(
            summary.most_common_denomination,
            MostCommon::Denomination(Denomination::Rs100)
        );
        let tallied: usize = summary.denomination_counts.iter().map(|t| t.count).sum();
        assert_eq!(tallied, 1);
    }

    #[test]
    fn test_legacy_zero_confidence_is_kept() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prediction_log.csv");
        fs::write(
            &path,
            "timestamp,result,confidence,denomination,image_name\n\
             2024-01-02 03:04:05,REAL CURRENCY,0.0,₹500,500_x.jpg\n",
        )
        .unwrap();

        let log = CsvAuditLog::open(&path).unwrap();
        let records = log.replay().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].verdict, Verdict::Genuine);
        assert_eq!(records[0].confidence, 0.0);
        assert_eq!(summarize(&records).genuine_count, 1);
    }

    #[test]
    fn test_reads_legacy_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prediction_log.csv");
        fs::write(
            &path,
            "timestamp,result,confidence,denomination,image_name\n\
             2024-01-02 03:04:05,FAKE CURRENCY,81.2,₹200,200_x.jpg\n\
             2024-01-02 03:05:00,REAL CURRENCY,97.0,Unknown,scan.png\n",
        )
        .unwrap();

        let log = CsvAuditLog::open(&path).unwrap();
        let records = log.replay().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].verdict, Verdict::Counterfeit);
        assert_eq!(records[0].denomination, Denomination::Rs200);
        assert_eq!(records[1].verdict, Verdict::Genuine);
        assert_eq!(records[1].denomination, Denomination::Unknown);
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = tempdir().unwrap();
        let log = Arc::new(CsvAuditLog::open(dir.path().join("log.csv")).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..25 {
                        let name = format!("thread{}_{}_{}.jpg", t, i, "x".repeat(200));
                        log.append(&record(i % 60, Verdict::Genuine, &name)).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let replay = log.replay_detailed().unwrap();
        assert!(replay.corrupt_rows.is_empty());
        assert_eq!(replay.records.len(), 200);
    }
}
