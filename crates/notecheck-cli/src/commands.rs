//! Command implementations

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use notecheck_app::app::{dashboard, find_record_upload, history, InferenceService};
use notecheck_app::config::Config;
use notecheck_app::export::ReportGenerator;
use notecheck_app::intake::store_upload;
use notecheck_app::repository::open_audit_log;
use notecheck_app::scanner::scan_directory;
use notecheck_domain::service::DenominationStrategy;
use notecheck_types::{Error, OutputFormat, PredictionOutcome, Result};
use notecheck_vision::ModelGateway;

use crate::cli::{Cli, Commands};
use crate::output::{output_history, output_outcome, output_status, output_summary, StatusReport};

pub fn execute(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(model) = cli.model {
        config.model_path = Some(model);
    }
    if let Some(log_file) = cli.log_file {
        config.log_path = Some(log_file);
    }
    let output_format = cli.format.unwrap_or(config.output_format);

    match cli.command {
        Commands::Classify { image, report } => {
            cmd_classify(&config, &image, report, cli.seed, output_format)
        }
        Commands::Batch { folder } => cmd_batch(&config, &folder, cli.seed, output_format),
        Commands::Dashboard => cmd_dashboard(&config, output_format),
        Commands::History { limit } => cmd_history(&config, limit, output_format),
        Commands::Report { index, output } => cmd_report(&config, index, output),
        Commands::Status => cmd_status(&config, output_format),
        Commands::Config {
            show,
            set_model,
            set_log,
            set_upload_dir,
            set_report,
            set_denomination,
            set_attribution,
            set_output,
            set_keep_uploads,
            reset,
        } => cmd_config(
            show,
            set_model,
            set_log,
            set_upload_dir,
            set_report,
            set_denomination,
            set_attribution,
            set_output,
            set_keep_uploads,
            reset,
        ),
    }
}

/// Display name for an image path. Only the file name is kept.
fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_image(path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(Error::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read(path)?)
}

/// Classify and log one image, keeping a copy in the upload directory when
/// configured. Returns the outcome and the path the report should embed.
fn classify_one(
    service: &InferenceService<'_>,
    config: &Config,
    image_path: &Path,
    name: &str,
) -> Result<(PredictionOutcome, PathBuf)> {
    let bytes = read_image(image_path)?;
    let outcome = service.process(name, &bytes)?;

    let stored = if config.keep_uploads {
        store_upload(&config.upload_dir()?, &outcome.record, &bytes)?
    } else {
        image_path.to_path_buf()
    };
    Ok((outcome, stored))
}

fn cmd_classify(
    config: &Config,
    image_path: &Path,
    report: Option<Option<PathBuf>>,
    seed: Option<u64>,
    output_format: OutputFormat,
) -> Result<()> {
    let gateway = ModelGateway::load(&config.model_path()?);
    let audit_log = open_audit_log(config)?;
    let service = InferenceService::from_state(
        gateway.state(),
        config.denomination_strategy,
        seed,
        &audit_log,
    );

    let name = source_name(image_path);
    let (outcome, stored) = classify_one(&service, config, image_path, &name)?;
    output_outcome(output_format, &outcome)?;

    if let Some(report_path) = report {
        let report_path = match report_path {
            Some(path) => path,
            None => config.report_path()?,
        };
        let generator = ReportGenerator::new(report_path, config.report_attribution.as_str());
        let written = generator.render(&outcome.record, &stored)?;
        eprintln!("Report saved to: {}", written.display());
    }

    Ok(())
}

fn cmd_batch(
    config: &Config,
    folder: &Path,
    seed: Option<u64>,
    output_format: OutputFormat,
) -> Result<()> {
    if !folder.is_dir() {
        return Err(Error::FileNotFound(folder.display().to_string()));
    }

    let images = scan_directory(folder, Some(config.upload_dir()?.as_path()))?;
    if images.is_empty() {
        println!("No images found in {}", folder.display());
        return Ok(());
    }

    let gateway = ModelGateway::load(&config.model_path()?);
    let audit_log = open_audit_log(config)?;
    let service = InferenceService::from_state(
        gateway.state(),
        config.denomination_strategy,
        seed,
        &audit_log,
    );

    eprintln!(
        "Classifying {} images ({} mode)",
        images.len(),
        service.mode()
    );

    let pb = ProgressBar::new(images.len() as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }

    let mut outcomes = Vec::with_capacity(images.len());
    let mut failures = 0usize;
    for image in &images {
        pb.set_message(image.source_name.clone());
        match classify_one(&service, config, &image.path, &image.source_name) {
            Ok((outcome, _)) => outcomes.push(outcome),
            Err(e) => {
                failures += 1;
                log::warn!("{}: {}", image.path.display(), e);
                pb.println(format!("Skipped {}: {}", image.source_name, e));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if output_format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&outcomes)?);
    } else {
        let records: Vec<_> = outcomes.iter().rev().map(|o| o.record.clone()).collect();
        output_history(output_format, &records)?;
        println!(
            "\nProcessed {} images: {} recorded, {} skipped",
            images.len(),
            outcomes.len(),
            failures
        );
    }

    Ok(())
}

fn cmd_dashboard(config: &Config, output_format: OutputFormat) -> Result<()> {
    let audit_log = open_audit_log(config)?;
    let summary = dashboard(&audit_log)?;
    output_summary(output_format, &summary)
}

fn cmd_history(config: &Config, limit: usize, output_format: OutputFormat) -> Result<()> {
    let audit_log = open_audit_log(config)?;
    let records = history(&audit_log, limit)?;
    output_history(output_format, &records)
}

fn cmd_report(config: &Config, index: usize, output: Option<PathBuf>) -> Result<()> {
    let audit_log = open_audit_log(config)?;
    let (record, image_path) = find_record_upload(&audit_log, &config.upload_dir()?, index)?;
    let report_path = match output {
        Some(path) => path,
        None => config.report_path()?,
    };

    let generator = ReportGenerator::new(report_path, config.report_attribution.as_str());
    let written = generator.render(&record, &image_path)?;
    println!("Report saved to: {}", written.display());
    Ok(())
}

fn cmd_status(config: &Config, output_format: OutputFormat) -> Result<()> {
    let model_path = config.model_path()?;
    let log_path = config.log_path()?;
    let gateway = ModelGateway::load(&model_path);
    let audit_log = open_audit_log(config)?;
    let replay = audit_log.replay_detailed()?;

    let mode = if gateway.is_available() {
        notecheck_types::InferenceMode::Model
    } else {
        notecheck_types::InferenceMode::Fallback
    };

    let status = StatusReport {
        model_path: &model_path,
        model_available: gateway.is_available(),
        mode,
        log_path: &log_path,
        records: replay.records.len(),
        corrupt_rows: replay.corrupt_rows.len(),
    };
    output_status(output_format, &status)
}

#[allow(clippy::too_many_arguments)]
fn cmd_config(
    show: bool,
    set_model: Option<PathBuf>,
    set_log: Option<PathBuf>,
    set_upload_dir: Option<PathBuf>,
    set_report: Option<PathBuf>,
    set_denomination: Option<DenominationStrategy>,
    set_attribution: Option<String>,
    set_output: Option<OutputFormat>,
    set_keep_uploads: Option<bool>,
    reset: bool,
) -> Result<()> {
    if reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        println!("\n{}", config);
        return Ok(());
    }

    let mut config = Config::load()?;
    let mut modified = false;

    if let Some(model) = set_model {
        config.model_path = Some(model);
        modified = true;
    }

    if let Some(log_path) = set_log {
        config.log_path = Some(log_path);
        modified = true;
    }

    if let Some(dir) = set_upload_dir {
        config.upload_dir = Some(dir);
        modified = true;
    }

    if let Some(report) = set_report {
        config.report_path = Some(report);
        modified = true;
    }

    if let Some(strategy) = set_denomination {
        config.denomination_strategy = strategy;
        modified = true;
    }

    if let Some(attribution) = set_attribution {
        config.report_attribution = attribution;
        modified = true;
    }

    if let Some(output_format) = set_output {
        config.output_format = output_format;
        modified = true;
    }

    if let Some(keep) = set_keep_uploads {
        config.keep_uploads = keep;
        modified = true;
    }

    if modified {
        config.save()?;
        println!("Configuration saved");
    }

    if show || !modified {
        println!("{}", config);
    }

    Ok(())
}
