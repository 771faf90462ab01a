//! Output formatting module

use std::path::Path;

use notecheck_domain::service::AggregateSummary;
use notecheck_types::{InferenceMode, OutputFormat, PredictionOutcome, PredictionRecord, Result};
use serde::Serialize;

pub fn output_outcome(output_format: OutputFormat, outcome: &PredictionOutcome) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(outcome)?;
        println!("{}", content);
        return Ok(());
    }

    let record = &outcome.record;
    println!("\nPrediction Result");
    println!("=================");
    println!("Image:           {}", record.source_name);
    println!("Result:          {}", record.verdict.label());
    println!("Confidence:      {}%", record.confidence);
    println!("Denomination:    {}", record.denomination);
    println!("Classified at:   {}", record.formatted_timestamp());
    if outcome.mode == InferenceMode::Fallback {
        println!("\nNote: model unavailable, this result is a placeholder and not a real check.");
    }
    Ok(())
}

pub fn output_summary(output_format: OutputFormat, summary: &AggregateSummary) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(summary)?;
        println!("{}", content);
        return Ok(());
    }

    println!("\nDashboard");
    println!("=========");
    println!("Total predictions:   {}", summary.total);
    println!("Genuine:             {}", summary.genuine_count);
    println!("Counterfeit:         {}", summary.counterfeit_count);
    println!("Most common note:    {}", summary.most_common_denomination);

    println!("\n--- Denominations ---");
    for tally in &summary.denomination_counts {
        println!("{:<8} {:>6}", tally.denomination.label(), tally.count);
    }
    println!("---------------------");
    Ok(())
}

pub fn output_history(output_format: OutputFormat, records: &[PredictionRecord]) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(records)?;
        println!("{}", content);
        return Ok(());
    }

    if records.is_empty() {
        println!("No predictions recorded yet.");
        return Ok(());
    }

    println!("Prediction History");
    println!("==================\n");
    println!(
        "{:<4} {:<20} {:<12} {:>8} {:<8} {}",
        "#", "Timestamp", "Result", "Conf.", "Note", "Image"
    );
    println!("{}", "-".repeat(78));

    for (index, record) in records.iter().enumerate() {
        println!(
            "{:<4} {:<20} {:<12} {:>7}% {:<8} {}",
            index,
            record.formatted_timestamp(),
            record.verdict.as_str(),
            record.confidence,
            record.denomination.label(),
            truncate(&record.source_name, 30)
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct StatusReport<'a> {
    pub model_path: &'a Path,
    pub model_available: bool,
    pub mode: InferenceMode,
    pub log_path: &'a Path,
    pub records: usize,
    pub corrupt_rows: usize,
}

pub fn output_status(output_format: OutputFormat, status: &StatusReport<'_>) -> Result<()> {
    if output_format == OutputFormat::Json {
        let content = serde_json::to_string_pretty(status)?;
        println!("{}", content);
        return Ok(());
    }

    println!("Notecheck Status");
    println!("================\n");
    println!("Model:           {}", status.model_path.display());
    println!(
        "Model loaded:    {}",
        if status.model_available { "Yes" } else { "No" }
    );
    println!("Inference mode:  {}", status.mode);
    println!("Audit log:       {}", status.log_path.display());
    println!("Records:         {}", status.records);
    if status.corrupt_rows > 0 {
        println!("Unreadable rows: {}", status.corrupt_rows);
    }
    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
