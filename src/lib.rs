//! # Chat Loadgen Library
//!
//! A fixed-rate load generator for OpenAI-compatible chat-completion endpoints.
//! It releases requests on a strict cadence for a bounded duration, measures the
//! latency and outcome of each one, and writes an aggregate report together with
//! a durable log of every request and response.
//!
//! ## Architecture Overview
//!
//! The library is organized into several key modules:
//!
//! - `endpoint`: The `ChatEndpoint` abstraction and its HTTP implementation
//! - `scheduler`: Request planning, timed release, and the join-all barrier
//! - `executor`: Per-request timing, error capture, and record construction
//! - `results`: Result records and the aggregated `TestSummary`
//! - `metrics`: HDR histogram latency collection and percentile analysis
//! - `report`: Text report and JSON export writers
//! - `config`, `cli`, `prompts`: Run configuration and its sources
//! - `logging`, `utils`: Console formatting, validation, and helpers
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use chat_loadgen::{Args, OpenAiEndpoint, ReportWriter, Scheduler, TestConfig, TestSummary};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TestConfig::from_args(&Args::default())?;
//!     let endpoint = Arc::new(OpenAiEndpoint::new(&config.model)?);
//!
//!     let outcome = Scheduler::new(config.clone(), endpoint).run().await;
//!     let summary = TestSummary::from_records(&outcome.records);
//!
//!     let path = ReportWriter::new(&config.output_dir).write(&config, &outcome, &summary)?;
//!     println!("Success rate {:.2}%, report at {}", summary.success_rate_percent, path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Timing Characteristics
//!
//! - **Open-loop dispatch**: each request's release time is computed from the
//!   fixed start of the run, so slow responses never delay later requests
//! - **No catch-up bursts**: a late release fires immediately without pulling
//!   the following deadlines forward
//! - **Unbounded in-flight requests**: concurrency is bounded only by
//!   `target_rate x latency`

pub mod cli;

/// Run configuration derived from the command line
///
/// Converts parsed CLI arguments into the validated `TestConfig` shared
/// read-only by every executor.
pub mod config;

/// Chat-completion endpoint abstraction
///
/// Contains the `ChatEndpoint` trait, the normalized `ChatResponse`, the
/// `EndpointError` taxonomy, and the reqwest-based `OpenAiEndpoint`.
pub mod endpoint;

pub mod executor;

pub mod logging;

/// Latency measurement and percentile analysis using HDR histograms
pub mod metrics;

pub mod prompts;

/// Text and JSON report output
pub mod report;

/// Result records and summary aggregation
pub mod results;

/// Timed request release and the join-all barrier
pub mod scheduler;

pub mod utils;

pub use cli::Args;
pub use config::{ModelSettings, TestConfig};
pub use endpoint::{ChatEndpoint, ChatResponse, EndpointError, OpenAiEndpoint};
pub use report::{ReportWriteError, ReportWriter};
pub use results::{ResultRecord, TestSummary};
pub use scheduler::{RequestSpec, RunOutcome, Scheduler};

/// The current version of the load generator
///
/// Populated from Cargo.toml and written into every report header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
///
/// These mirror the defaults a single developer box running a local
/// OpenAI-compatible server would want: one request per second for thirty
/// seconds with short completions.
pub mod defaults {
    use std::time::Duration;

    /// Default target rate in requests per second
    pub const TARGET_RATE: f64 = 1.0;

    /// Default run duration
    pub const DURATION: Duration = Duration::from_secs(30);

    /// Default API base URL; `/chat/completions` is appended per request
    pub const BASE_URL: &str = "http://127.0.0.1:8000/v1";

    /// Placeholder key for local servers that ignore authentication
    pub const API_KEY: &str = "sk-no-key-required";

    pub const MODEL: &str = "Qwen3-8B";

    pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

    pub const TEMPERATURE: f32 = 0.6;

    pub const TOP_P: f32 = 0.95;

    /// Default completion budget
    ///
    /// Kept small so the measured latency is dominated by queueing and
    /// prefill rather than long generations.
    pub const MAX_TOKENS: u32 = 100;

    pub const OUTPUT_DIR: &str = ".";

    /// Upper bound on the requests one run may plan
    ///
    /// Only reachable with `--cycle-prompts`; otherwise the prompt pool caps
    /// the run.
    pub const MAX_REQUESTS: usize = 10_000_000;

    /// Percentiles reported for successful request latency
    pub const PERCENTILES: [f64; 3] = [50.0, 95.0, 99.0];
}
