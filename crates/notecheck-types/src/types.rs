//! Prediction record and its value types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Timestamp format used in the audit log and on reports
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Binary classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Genuine,
    Counterfeit,
}

impl Verdict {
    /// Value stored in the audit log
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Genuine => "GENUINE",
            Verdict::Counterfeit => "COUNTERFEIT",
        }
    }

    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Genuine => "Genuine currency",
            Verdict::Counterfeit => "Counterfeit currency",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    /// Accepts the canonical values plus the legacy `REAL CURRENCY` /
    /// `FAKE CURRENCY` column text. Anything mentioning FAKE is counterfeit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        match upper.as_str() {
            "GENUINE" | "REAL" | "REAL CURRENCY" => Ok(Verdict::Genuine),
            "COUNTERFEIT" | "FAKE CURRENCY" => Ok(Verdict::Counterfeit),
            other if other.contains("FAKE") => Ok(Verdict::Counterfeit),
            _ => Err(format!("unknown verdict '{}'", s)),
        }
    }
}

/// Banknote denomination. The known set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Denomination {
    #[serde(rename = "₹100")]
    Rs100,
    #[serde(rename = "₹200")]
    Rs200,
    #[serde(rename = "₹500")]
    Rs500,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl Denomination {
    /// Known denominations in canonical order. Aggregation tie-breaks follow this order.
    pub const KNOWN: [Denomination; 3] = [Denomination::Rs100, Denomination::Rs200, Denomination::Rs500];

    pub fn label(&self) -> &'static str {
        match self {
            Denomination::Rs100 => "₹100",
            Denomination::Rs200 => "₹200",
            Denomination::Rs500 => "₹500",
            Denomination::Unknown => "Unknown",
        }
    }

    /// Face value digits, used for filename prefix matching
    pub fn face_value(&self) -> Option<&'static str> {
        match self {
            Denomination::Rs100 => Some("100"),
            Denomination::Rs200 => Some("200"),
            Denomination::Rs500 => Some("500"),
            Denomination::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Denomination::Unknown)
    }
}

impl std::fmt::Display for Denomination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Denomination {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("unknown") {
            return Ok(Denomination::Unknown);
        }
        let digits = trimmed.trim_start_matches('₹');
        Denomination::KNOWN
            .into_iter()
            .find(|d| d.face_value() == Some(digits))
            .ok_or_else(|| format!("unknown denomination '{}'", s))
    }
}

/// Whether a classification came from the real model or the demo fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    Model,
    Fallback,
}

impl std::fmt::Display for InferenceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InferenceMode::Model => write!(f, "model"),
            InferenceMode::Fallback => write!(f, "fallback"),
        }
    }
}

/// One classified image, as stored in the audit log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// When the classification happened (second precision, local time)
    pub timestamp: NaiveDateTime,

    pub verdict: Verdict,

    /// Percentage likelihood of `verdict`, rounded to 2 decimals
    pub confidence: f64,

    pub denomination: Denomination,

    /// Original upload filename. Untrusted; display only.
    pub source_name: String,
}

impl PredictionRecord {
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Record produced by the pipeline together with how it was produced.
/// The mode is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub record: PredictionRecord,
    pub mode: InferenceMode,
}

/// Round a percentage to 2 decimal places
pub fn round_percent(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
