//! Single-page prediction report
//!
//! The report is an A4 portrait workbook with print setup fixed to one page.
//! It is built fully in memory and then moved into place atomically, so a
//! failed render never leaves a partial file behind.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local, NaiveDateTime, SubsecRound, Timelike};
use image::imageops::FilterType;
use image::ImageFormat;
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Image, Workbook, XlsxError};
use tempfile::NamedTempFile;

use notecheck_types::{Error, PredictionRecord, Result, TIMESTAMP_FORMAT};

pub const REPORT_TITLE: &str = "Fake Currency Detection Report";

/// Embedded thumbnail size in pixels (width, height)
pub const THUMBNAIL_SIZE: (u32, u32) = (300, 160);

/// Excel paper size code for A4
const PAPER_A4: u8 = 9;

const THUMBNAIL_ROW: u32 = 10;
const ATTRIBUTION_ROW: u32 = 20;

fn xlsx(e: XlsxError) -> Error {
    Error::ReportWrite(e.to_string())
}

/// Renders reports to a fixed output path
pub struct ReportGenerator {
    output_path: PathBuf,
    attribution: String,
}

impl ReportGenerator {
    pub fn new(output_path: impl Into<PathBuf>, attribution: impl Into<String>) -> Self {
        Self {
            output_path: output_path.into(),
            attribution: attribution.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Render and write the report, stamped with the current time
    pub fn render(&self, record: &PredictionRecord, image_path: &Path) -> Result<PathBuf> {
        self.render_at(record, image_path, Local::now().naive_local())
    }

    pub fn render_at(
        &self,
        record: &PredictionRecord,
        image_path: &Path,
        generated_at: NaiveDateTime,
    ) -> Result<PathBuf> {
        let bytes = self.render_to_bytes(record, image_path, generated_at)?;
        write_atomically(&self.output_path, &bytes)?;
        log::info!("Report written to {}", self.output_path.display());
        Ok(self.output_path.clone())
    }

    /// Build the document in memory. Identical inputs give identical bytes.
    pub fn render_to_bytes(
        &self,
        record: &PredictionRecord,
        image_path: &Path,
        generated_at: NaiveDateTime,
    ) -> Result<Vec<u8>> {
        let generated_at = generated_at.trunc_subsecs(0);
        let thumbnail = thumbnail_png(image_path)?;

        let mut workbook = Workbook::new();
        let properties = DocProperties::new()
            .set_title(REPORT_TITLE)
            .set_author(&self.attribution)
            .set_creation_datetime(&excel_datetime(generated_at)?);
        workbook.set_properties(&properties);

        let title_format = Format::new().set_bold().set_font_size(18);
        let label_format = Format::new().set_bold();

        let sheet = workbook.add_worksheet();
        sheet.set_name("Report").map_err(xlsx)?;
        sheet.set_paper_size(PAPER_A4);
        sheet.set_portrait();
        sheet.set_print_fit_to_pages(1, 1);
        sheet.set_footer(&footer_text(&self.attribution));
        sheet.set_column_width(0, 18).map_err(xlsx)?;
        sheet.set_column_width(1, 42).map_err(xlsx)?;

        sheet
            .write_string_with_format(0, 0, REPORT_TITLE, &title_format)
            .map_err(xlsx)?;

        let confidence = format!("{}%", record.confidence);
        let classified_at = record.formatted_timestamp();
        let generated = generated_at.format(TIMESTAMP_FORMAT).to_string();
        let rows: [(&str, &str); 6] = [
            ("Result:", record.verdict.label()),
            ("Confidence:", &confidence),
            ("Denomination:", record.denomination.label()),
            ("Image:", &record.source_name),
            ("Classified at:", &classified_at),
            ("Generated at:", &generated),
        ];
        for (offset, (label, value)) in rows.iter().enumerate() {
            let row = 2 + offset as u32;
            sheet
                .write_string_with_format(row, 0, *label, &label_format)
                .map_err(xlsx)?;
            sheet.write_string(row, 1, *value).map_err(xlsx)?;
        }

        let image = Image::new_from_buffer(&thumbnail)
            .map_err(xlsx)?
            .set_alt_text("Submitted currency image");
        sheet.insert_image(THUMBNAIL_ROW, 0, &image).map_err(xlsx)?;

        sheet
            .write_string(ATTRIBUTION_ROW, 0, &self.attribution)
            .map_err(xlsx)?;
        sheet
            .set_print_area(0, 0, ATTRIBUTION_ROW, 3)
            .map_err(xlsx)?;

        workbook.save_to_buffer().map_err(xlsx)
    }
}

/// Centered footer. `&` starts a control code in Excel headers and footers.
fn footer_text(attribution: &str) -> String {
    format!("&C{}", attribution.replace('&', "&&"))
}

/// Decode the source image and re-encode a fixed-size PNG thumbnail
fn thumbnail_png(image_path: &Path) -> Result<Vec<u8>> {
    if !image_path.exists() {
        return Err(Error::ReportWrite(format!(
            "source image not found: {}",
            image_path.display()
        )));
    }
    let img = image::open(image_path).map_err(|e| {
        Error::ReportWrite(format!(
            "source image unreadable: {}: {}",
            image_path.display(),
            e
        ))
    })?;
    let (width, height) = THUMBNAIL_SIZE;
    let thumb = img.resize_exact(width, height, FilterType::Triangle).to_rgb8();

    let mut buf = Vec::new();
    thumb
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| Error::ReportWrite(format!("thumbnail encoding failed: {}", e)))?;
    Ok(buf)
}

fn excel_datetime(at: NaiveDateTime) -> Result<ExcelDateTime> {
    ExcelDateTime::from_ymd(at.year() as u16, at.month() as u8, at.day() as u8)
        .and_then(|d| d.and_hms(at.hour() as u16, at.minute() as u8, at.second()))
        .map_err(xlsx)
}

/// Write to a temp file beside `path`, sync, then rename over `path`.
/// The temp file is removed if anything fails before the rename.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let io_err = |e: std::io::Error| Error::ReportWrite(format!("{}: {}", path.display(), e));

    fs::create_dir_all(&dir).map_err(io_err)?;
    let mut tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.flush().map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}
