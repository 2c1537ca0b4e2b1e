use crate::{
    config::TestConfig,
    metrics::percentile_label,
    results::{ResultRecord, TestSummary},
    scheduler::RunOutcome,
    utils::{format_duration, format_request_rate, format_seconds},
};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const TITLE: &str = "Chat Completion Load Test Report";

/// Failure to persist a report; fatal for the run
#[derive(Error, Debug)]
pub enum ReportWriteError {
    #[error("failed to write report to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportWriteError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// JSON export layout
#[derive(Serialize)]
struct JsonReport<'a> {
    version: &'static str,
    run_id: &'a str,
    started_at: chrono::DateTime<chrono::Local>,
    elapsed: std::time::Duration,
    config: &'a TestConfig,
    summary: &'a TestSummary,
    records: Vec<&'a ResultRecord>,
}

/// Writes run reports into one output directory
#[derive(Debug, Clone)]
pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the text report for a run started at `started_at`
    pub fn report_path(&self, started_at: &chrono::DateTime<chrono::Local>) -> PathBuf {
        self.output_dir.join(format!(
            "pressure_test_results_{}.txt",
            started_at.format("%Y%m%d_%H%M%S")
        ))
    }

    /// Write the text report and return its path
    ///
    /// The output directory is created when missing and an existing file
    /// with the same name is truncated.
    pub fn write(
        &self,
        config: &TestConfig,
        outcome: &RunOutcome,
        summary: &TestSummary,
    ) -> Result<PathBuf, ReportWriteError> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| ReportWriteError::io(&self.output_dir, e))?;

        let path = self.report_path(&outcome.started_at);
        let text = render(config, outcome, summary);
        fs::write(&path, text).map_err(|e| ReportWriteError::io(&path, e))?;

        info!("Report written to {}", path.display());
        Ok(path)
    }

    /// Write the full run as pretty-printed JSON to `path`
    pub fn write_json(
        &self,
        path: &Path,
        config: &TestConfig,
        outcome: &RunOutcome,
        summary: &TestSummary,
    ) -> Result<(), ReportWriteError> {
        let report = JsonReport {
            version: crate::VERSION,
            run_id: &outcome.run_id,
            started_at: outcome.started_at,
            elapsed: outcome.elapsed,
            config,
            summary,
            records: sorted(&outcome.records),
        };
        let json = serde_json::to_string_pretty(&report)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ReportWriteError::io(parent, e))?;
        }
        fs::write(path, json).map_err(|e| ReportWriteError::io(path, e))?;

        info!("JSON results written to {}", path.display());
        Ok(())
    }
}

fn sorted(records: &[ResultRecord]) -> Vec<&ResultRecord> {
    let mut sorted: Vec<&ResultRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.sequence_id);
    sorted
}

/// Render the text report
///
/// Request blocks appear in ascending `sequence_id` order regardless of the
/// order of `outcome.records`.
pub fn render(config: &TestConfig, outcome: &RunOutcome, summary: &TestSummary) -> String {
    let records = sorted(&outcome.records);
    debug!("Rendering report for {} records", records.len());

    // Writing into a String cannot fail.
    let mut out = String::new();
    let _ = write_header(&mut out, config, outcome, summary);
    for record in records {
        let _ = write_record(&mut out, record);
    }
    out
}

fn write_header(
    out: &mut String,
    config: &TestConfig,
    outcome: &RunOutcome,
    summary: &TestSummary,
) -> std::fmt::Result {
    writeln!(out, "{}", TITLE)?;
    writeln!(out, "{}", "=".repeat(80))?;
    writeln!(out, "Run ID: {}", outcome.run_id)?;
    writeln!(
        out,
        "Test time: {}",
        outcome.started_at.format("%Y-%m-%d %H:%M:%S")
    )?;
    writeln!(out, "Endpoint: {}", config.model.base_url)?;
    writeln!(out, "Model: {}", config.model.model)?;
    writeln!(out, "Target rate: {}", format_request_rate(config.target_rate))?;
    writeln!(out, "Duration: {}", format_duration(config.duration))?;
    writeln!(out, "Elapsed: {}", format_duration(outcome.elapsed))?;
    writeln!(out, "Total requests: {}", summary.total_requests)?;
    writeln!(out, "Successful: {}", summary.success_count)?;
    writeln!(out, "Failed: {}", summary.failure_count)?;
    writeln!(out, "Success rate: {:.2}%", summary.success_rate_percent)?;
    writeln!(out, "Average latency: {}", format_seconds(summary.avg_latency))?;
    writeln!(out, "Min latency: {}", format_seconds(summary.min_latency))?;
    writeln!(out, "Max latency: {}", format_seconds(summary.max_latency))?;
    for p in &summary.latency_percentiles {
        writeln!(
            out,
            "{} latency: {}",
            percentile_label(p.percentile),
            format_seconds(p.value)
        )?;
    }
    writeln!(out)?;
    writeln!(out, "Request details:")?;
    writeln!(out, "{}", "-".repeat(80))
}

fn write_record(out: &mut String, record: &ResultRecord) -> std::fmt::Result {
    writeln!(out, "Request {}:", record.sequence_id)?;
    writeln!(out, "Prompt: {}", record.prompt)?;
    writeln!(
        out,
        "Timestamp: {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S%.6f")
    )?;
    writeln!(
        out,
        "Scheduled at: +{:.3}s, dispatched at: +{:.3}s",
        record.scheduled_offset.as_secs_f64(),
        record.dispatch_offset.as_secs_f64()
    )?;
    writeln!(
        out,
        "Status: {}",
        if record.success { "success" } else { "failed" }
    )?;
    writeln!(out, "Latency: {}", format_seconds(record.latency))?;

    if record.success {
        writeln!(out, "Preview:")?;
        writeln!(out, "{}", record.preview)?;
        if !record.content.is_empty() {
            writeln!(out, "Content:")?;
            writeln!(out, "{}", record.content)?;
        }
        if let Some(reasoning) = &record.reasoning {
            writeln!(out, "Reasoning:")?;
            writeln!(out, "{}", reasoning)?;
        }
    } else {
        writeln!(out, "Error: {}", record.error_message)?;
    }
    writeln!(out, "{}", "-".repeat(40))
}
