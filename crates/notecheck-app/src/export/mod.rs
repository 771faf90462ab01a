//! Document export

mod report;

pub use report::{ReportGenerator, REPORT_TITLE, THUMBNAIL_SIZE};
