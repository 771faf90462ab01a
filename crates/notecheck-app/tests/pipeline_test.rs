//! End-to-end pipeline tests against the CSV audit log

use std::io::Cursor;
use std::path::Path;

use chrono::NaiveDate;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use ndarray::Array4;
use tempfile::tempdir;

use notecheck_app::app::{dashboard, find_record_upload, history, InferenceService};
use notecheck_app::export::ReportGenerator;
use notecheck_app::intake::store_upload;
use notecheck_domain::repository::AuditLogRepository;
use notecheck_domain::service::{DenominationStrategy, FilenamePrefixEstimator, MostCommon};
use notecheck_infra::persistence::CsvAuditLog;
use notecheck_types::{Denomination, Error, InferenceMode, Result, Verdict};
use notecheck_vision::{ModelBackedClassifier, ModelGateway, ScoreModel};

struct FixedScore(f32);

impl ScoreModel for FixedScore {
    fn score(&self, _input: Array4<f32>) -> Result<f32> {
        Ok(self.0)
    }
}

fn note_png() -> Vec<u8> {
    let img = RgbImage::from_fn(96, 48, |x, y| Rgb([(x * 2) as u8, (y * 5) as u8, 40]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn open_log(dir: &Path) -> CsvAuditLog {
    CsvAuditLog::open(dir.join("prediction_log.csv")).unwrap()
}

#[test]
fn test_fallback_pipeline_feeds_dashboard() {
    let dir = tempdir().unwrap();
    let log = open_log(dir.path());
    let gateway = ModelGateway::load(&dir.path().join("model").join("currency_model.onnx"));
    assert!(!gateway.is_available());

    let service = InferenceService::from_state(
        gateway.state(),
        DenominationStrategy::Filename,
        Some(99),
        &log,
    );

    let names = ["100_a.jpg", "100_b.jpg", "200_a.jpg", "scan.jpg", "500_a.jpg"];
    for name in names {
        let outcome = service.process(name, b"fallback never reads these bytes").unwrap();
        assert_eq!(outcome.mode, InferenceMode::Fallback);
    }

    let summary = dashboard(&log).unwrap();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.genuine_count + summary.counterfeit_count, 5);
    assert_eq!(
        summary.most_common_denomination,
        MostCommon::Denomination(Denomination::Rs100)
    );

    let latest = history(&log, 1).unwrap();
    assert_eq!(latest[0].source_name, "500_a.jpg");
}

#[test]
fn test_malformed_image_leaves_log_empty() {
    let dir = tempdir().unwrap();
    let log = open_log(dir.path());
    let model = FixedScore(0.7);
    let service = InferenceService::new(
        Box::new(ModelBackedClassifier::new(&model)),
        Box::new(FilenamePrefixEstimator),
        &log,
    );

    let result = service.process("100.jpg", b"\xff\xd8 truncated jpeg");
    assert!(matches!(result, Err(Error::InvalidImage(_))));
    assert!(log.replay().unwrap().is_empty());
    assert!(!log.path().exists());
}

#[test]
fn test_dashboard_counts_from_log() {
    let dir = tempdir().unwrap();
    let log = open_log(dir.path());
    let genuine = FixedScore(0.1);
    let counterfeit = FixedScore(0.9);
    let image = note_png();

    let genuine_service = InferenceService::new(
        Box::new(ModelBackedClassifier::new(&genuine)),
        Box::new(FilenamePrefixEstimator),
        &log,
    );
    for i in 0..3 {
        genuine_service.process(&format!("200_g{}.png", i), &image).unwrap();
    }

    let counterfeit_service = InferenceService::new(
        Box::new(ModelBackedClassifier::new(&counterfeit)),
        Box::new(FilenamePrefixEstimator),
        &log,
    );
    for i in 0..2 {
        counterfeit_service.process(&format!("500_c{}.png", i), &image).unwrap();
    }

    let summary = dashboard(&log).unwrap();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.genuine_count, 3);
    assert_eq!(summary.counterfeit_count, 2);
    assert_eq!(
        summary.most_common_denomination,
        MostCommon::Denomination(Denomination::Rs200)
    );
}

#[test]
fn test_report_from_logged_record() {
    let dir = tempdir().unwrap();
    let log = open_log(dir.path());
    let model = FixedScore(0.8);
    let service = InferenceService::new(
        Box::new(ModelBackedClassifier::new(&model)),
        Box::new(FilenamePrefixEstimator),
        &log,
    );

    let bytes = note_png();
    let upload_dir = dir.path().join("uploads");
    let at = NaiveDate::from_ymd_opt(2024, 8, 1)
        .unwrap()
        .and_hms_opt(10, 20, 30)
        .unwrap();
    let outcome = service.process_at("500_front.png", &bytes, at).unwrap();
    assert_eq!(outcome.record.verdict, Verdict::Counterfeit);
    let upload = store_upload(&upload_dir, &outcome.record, &bytes).unwrap();

    let (record, located) = find_record_upload(&log, &upload_dir, 0).unwrap();
    assert_eq!(record, outcome.record);
    assert_eq!(located, upload);

    let generator = ReportGenerator::new(dir.path().join("report.xlsx"), "Test bench");
    let path = generator.render_at(&record, &upload, at).unwrap();
    assert!(path.exists());
    assert_eq!(
        std::fs::read(&path).unwrap(),
        generator.render_to_bytes(&record, &upload, at).unwrap()
    );
}

#[test]
fn test_report_embeds_its_own_upload_when_names_repeat() {
    let dir = tempdir().unwrap();
    let log = open_log(dir.path());
    let model = FixedScore(0.3);
    let service = InferenceService::new(
        Box::new(ModelBackedClassifier::new(&model)),
        Box::new(FilenamePrefixEstimator),
        &log,
    );
    let upload_dir = dir.path().join("uploads");
    let at = NaiveDate::from_ymd_opt(2024, 8, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();

    let older = note_png();
    let newer = {
        let img = RgbImage::from_pixel(50, 50, Rgb([10, 200, 10]));
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    };
    for (name, bytes) in [("a/100.png", &older), ("b/100.png", &newer)] {
        let outcome = service.process_at(name, bytes, at).unwrap();
        store_upload(&upload_dir, &outcome.record, bytes).unwrap();
    }

    let (record, path) = find_record_upload(&log, &upload_dir, 1).unwrap();
    assert_eq!(record.source_name, "a/100.png");
    assert_eq!(std::fs::read(&path).unwrap(), older);

    let (record, path) = find_record_upload(&log, &upload_dir, 0).unwrap();
    assert_eq!(record.source_name, "b/100.png");
    assert_eq!(std::fs::read(&path).unwrap(), newer);
}
