//! CLI definition using clap

use clap::{Parser, Subcommand};
use notecheck_domain::service::DenominationStrategy;
use notecheck_types::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "notecheck")]
#[command(version)]
#[command(about = "Counterfeit currency detection with an append-only audit log")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// ONNX model path override
    #[arg(long, global = true)]
    pub model: Option<PathBuf>,

    /// Audit log path override
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Output format (json, table). Uses config value if not specified.
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Seed for fallback mode and random denominations (reproducible demos)
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify a single image and record the result
    Classify {
        /// Path to image file
        image: PathBuf,

        /// Also render a report. Uses the configured report path if no value given.
        #[arg(long, num_args = 0..=1)]
        report: Option<Option<PathBuf>>,
    },

    /// Classify every image in a folder, one after another
    Batch {
        /// Path to folder containing images
        folder: PathBuf,
    },

    /// Show summary statistics over the whole audit log
    Dashboard,

    /// Show recent predictions
    History {
        /// Limit number of entries shown
        #[arg(long, short = 'n', default_value = "20")]
        limit: usize,
    },

    /// Render the report for a logged prediction
    Report {
        /// Record position counted from the newest (0 = most recent)
        #[arg(long, short = 'i', default_value = "0")]
        index: usize,

        /// Output file path
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Show model availability and configured paths
    Status,

    /// Manage configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set model path
        #[arg(long)]
        set_model: Option<PathBuf>,

        /// Set audit log path
        #[arg(long)]
        set_log: Option<PathBuf>,

        /// Set upload directory
        #[arg(long)]
        set_upload_dir: Option<PathBuf>,

        /// Set report output path
        #[arg(long)]
        set_report: Option<PathBuf>,

        /// Set denomination strategy
        #[arg(long)]
        set_denomination: Option<DenominationStrategy>,

        /// Set report attribution line
        #[arg(long)]
        set_attribution: Option<String>,

        /// Set default output format
        #[arg(long)]
        set_output: Option<OutputFormat>,

        /// Keep copies of classified images in the upload directory
        #[arg(long)]
        set_keep_uploads: Option<bool>,

        /// Reset to defaults
        #[arg(long)]
        reset: bool,
    },
}
