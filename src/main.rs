//! # Chat Loadgen - Main Entry Point
//!
//! Drives one fixed-rate load test against an OpenAI-compatible
//! chat-completion endpoint:
//!
//! 1. **Parse arguments**: clap-derived command line
//! 2. **Initialize logging**: colorized console output, optional log file
//! 3. **Build the run configuration**: prompt pool, rate, model settings
//! 4. **Run the scheduler**: timed release and the join-all barrier
//! 5. **Aggregate and report**: console summary, text report, optional JSON
//!
//! ## Error Handling
//!
//! Individual request failures never abort a run; they are counted and
//! reported. Configuration errors and report write failures are fatal and
//! end the process with a non-zero exit status.

use anyhow::{Context, Result};
use chat_loadgen::{
    cli::Args,
    endpoint::OpenAiEndpoint,
    logging::init_logging,
    metrics::percentile_label,
    report::ReportWriter,
    results::TestSummary,
    scheduler::Scheduler,
    utils::{format_duration, format_request_rate, format_seconds},
    TestConfig,
};
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Held until exit so the file appender flushes.
    let _log_guard = init_logging(&args)?;

    info!("Starting Chat Loadgen v{}", chat_loadgen::VERSION);

    let config = TestConfig::from_args(&args)?;
    debug!(
        "Prompt pool: {} prompts, cycling {}",
        config.prompt_pool.len(),
        if config.cycle_prompts { "on" } else { "off" }
    );
    let endpoint = Arc::new(
        OpenAiEndpoint::new(&config.model).context("Failed to create endpoint client")?,
    );

    info!(
        "Target {} for {} against {} (model {})",
        format_request_rate(config.target_rate),
        format_duration(config.duration),
        endpoint.url(),
        config.model.model
    );

    let scheduler = Scheduler::new(config.clone(), endpoint);
    let outcome = scheduler.run().await;
    let summary = TestSummary::from_records(&outcome.records);

    print_summary(&summary);

    let writer = ReportWriter::new(&config.output_dir);
    let report_path = writer
        .write(&config, &outcome, &summary)
        .context("Failed to write test report")?;
    if let Some(json_path) = &config.json_output {
        writer
            .write_json(json_path, &config, &outcome, &summary)
            .context("Failed to write JSON results")?;
    }

    info!("Detailed results saved to: {}", report_path.display());
    Ok(())
}

/// Log the aggregate numbers at the end of a run
fn print_summary(summary: &TestSummary) {
    info!("{}", "=".repeat(50));
    info!("Load test complete");
    info!("Total requests: {}", summary.total_requests);
    info!("Successful: {}", summary.success_count);
    info!("Failed: {}", summary.failure_count);
    info!("Success rate: {:.2}%", summary.success_rate_percent);
    info!("Average latency: {}", format_seconds(summary.avg_latency));
    info!("Min latency: {}", format_seconds(summary.min_latency));
    info!("Max latency: {}", format_seconds(summary.max_latency));
    for p in &summary.latency_percentiles {
        info!(
            "{} latency: {}",
            percentile_label(p.percentile),
            format_seconds(p.value)
        );
    }
    info!("{}", "=".repeat(50));
}
