//! Configuration management for notecheck
//!
//! Config stored at: ~/.config/notecheck/config.json

use notecheck_domain::service::DenominationStrategy;
use notecheck_types::{ConfigError, OutputFormat, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// ONNX classifier artifact. Missing file means fallback mode.
    #[serde(default)]
    pub model_path: Option<PathBuf>,

    /// Audit log CSV override
    #[serde(default)]
    pub log_path: Option<PathBuf>,

    /// Directory where uploaded images are kept
    #[serde(default)]
    pub upload_dir: Option<PathBuf>,

    /// Report output path override
    #[serde(default)]
    pub report_path: Option<PathBuf>,

    /// How denominations are estimated (filename, random)
    #[serde(default)]
    pub denomination_strategy: DenominationStrategy,

    /// Static footer line printed on reports
    #[serde(default = "default_attribution")]
    pub report_attribution: String,

    /// Default output format (json, table)
    #[serde(default = "default_output_format")]
    pub output_format: OutputFormat,

    /// Copy classified images into the upload directory
    #[serde(default = "default_true")]
    pub keep_uploads: bool,
}

fn default_attribution() -> String {
    "Generated by notecheck".to_string()
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: None,
            log_path: None,
            upload_dir: None,
            report_path: None,
            denomination_strategy: DenominationStrategy::default(),
            report_attribution: default_attribution(),
            output_format: default_output_format(),
            keep_uploads: true,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("notecheck");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Base directory for the model, log, uploads and reports
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or(ConfigError::NotFound)?
            .join("notecheck");
        Ok(data_dir)
    }

    pub fn model_path(&self) -> Result<PathBuf> {
        match self.model_path {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("model").join("currency_model.onnx")),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        match self.log_path {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("prediction_log.csv")),
        }
    }

    pub fn upload_dir(&self) -> Result<PathBuf> {
        match self.upload_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => Ok(Self::data_dir()?.join("uploads")),
        }
    }

    pub fn report_path(&self) -> Result<PathBuf> {
        match self.report_path {
            Some(ref path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("report.xlsx")),
        }
    }

    /// Load config from file, or create default
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_json(&content)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        // Ensure directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

fn display_path(path: Result<PathBuf>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|_| "(error)".to_string())
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Notecheck Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "Model:          {}", display_path(self.model_path()))?;
        writeln!(f, "Audit log:      {}", display_path(self.log_path()))?;
        writeln!(f, "Upload dir:     {}", display_path(self.upload_dir()))?;
        writeln!(f, "Report:         {}", display_path(self.report_path()))?;
        writeln!(f, "Denomination:   {}", self.denomination_strategy)?;
        writeln!(f, "Attribution:    {}", self.report_attribution)?;
        writeln!(f, "Output format:  {}", self.output_format)?;
        writeln!(f, "Keep uploads:   {}", self.keep_uploads)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:    {}", path.display())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.keep_uploads);
        assert_eq!(config.denomination_strategy, DenominationStrategy::Filename);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config = Config::from_json(
            r#"{"denomination_strategy": "random", "log_path": "/tmp/log.csv", "output_format": "json"}"#,
        )
        .unwrap();
        assert_eq!(config.denomination_strategy, DenominationStrategy::Random);
        assert_eq!(config.log_path().unwrap(), PathBuf::from("/tmp/log.csv"));
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        let result = Config::from_json("{not json");
        assert!(matches!(
            result,
            Err(notecheck_types::Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_round_trip() {
        let config = Config {
            model_path: Some(PathBuf::from("model.onnx")),
            report_attribution: "Branch 12".to_string(),
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }
}
