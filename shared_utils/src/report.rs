//! Report Module
//!
//! End-of-run summary: a boxed table on stdout and an optional JSON file.

use crate::batch::BatchResult;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const BOX_WIDTH: usize = 62;

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{:.1}s", duration.as_secs_f64())
    }
}

fn row(label: &str, value: &str) -> String {
    let body = format!("  {:<24}{:>14}", label, value);
    let pad = BOX_WIDTH.saturating_sub(body.chars().count());
    format!("║{}{}║", body, " ".repeat(pad))
}

fn rule(left: char, right: char) -> String {
    format!("{}{}{}", left, "═".repeat(BOX_WIDTH), right)
}

/// Render the summary table (no trailing newline).
pub fn render_summary_report(
    result: &BatchResult,
    duration: Duration,
    outputs_written: usize,
    output_bytes: u64,
    operation_name: &str,
) -> String {
    let title = format!("📊 {} Summary", operation_name);
    let title_pad = BOX_WIDTH.saturating_sub(title.chars().count() + 2);

    let mut lines = vec![
        rule('╔', '╗'),
        format!("║  {}{}║", title, " ".repeat(title_pad)),
        rule('╠', '╣'),
        row("Files Processed:", &result.total.to_string()),
        row("Converted:", &result.succeeded.to_string()),
        row("Partially Converted:", &result.partial.to_string()),
        row("Failed:", &result.failed.to_string()),
        row("Skipped:", &result.skipped.to_string()),
    ];
    if result.cancelled > 0 {
        lines.push(row("Cancelled:", &result.cancelled.to_string()));
    }
    lines.push(row("Success Rate:", &format!("{:.1}%", result.success_rate())));
    lines.push(rule('╠', '╣'));
    lines.push(row("Outputs Written:", &outputs_written.to_string()));
    lines.push(row("Output Size:", &format_bytes(output_bytes)));
    lines.push(row("Total Time:", &format_duration(duration)));
    lines.push(rule('╚', '╝'));

    if !result.errors.is_empty() {
        lines.push(String::new());
        lines.push("❌ Errors encountered:".to_string());
        for (path, error) in &result.errors {
            lines.push(format!("   {} → {}", path.display(), error));
        }
    }

    lines.join("\n")
}

pub fn print_summary_report(
    result: &BatchResult,
    duration: Duration,
    outputs_written: usize,
    output_bytes: u64,
    operation_name: &str,
) {
    println!();
    println!(
        "{}",
        render_summary_report(result, duration, outputs_written, output_bytes, operation_name)
    );
}

#[derive(Debug, Serialize)]
pub struct FailureRecord {
    pub path: PathBuf,
    pub error: String,
}

/// Machine-readable form of the summary.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub root: PathBuf,
    pub force: bool,
    pub workers: usize,
    pub total: usize,
    pub converted: usize,
    pub partially_converted: usize,
    pub failed: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub outputs_written: usize,
    pub output_bytes: u64,
    pub duration_secs: f64,
    pub failures: Vec<FailureRecord>,
}

impl SummaryReport {
    pub fn from_batch(
        root: &Path,
        force: bool,
        workers: usize,
        result: &BatchResult,
        outputs_written: usize,
        output_bytes: u64,
        duration: Duration,
    ) -> Self {
        Self {
            root: root.to_path_buf(),
            force,
            workers,
            total: result.total,
            converted: result.succeeded,
            partially_converted: result.partial,
            failed: result.failed,
            skipped: result.skipped,
            cancelled: result.cancelled,
            outputs_written,
            output_bytes,
            duration_secs: duration.as_secs_f64(),
            failures: result
                .errors
                .iter()
                .map(|(path, error)| FailureRecord {
                    path: path.clone(),
                    error: error.clone(),
                })
                .collect(),
        }
    }

    pub fn write_json(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }
}
