//! # Request Scheduler
//!
//! Releases requests on a fixed cadence measured from one start instant and
//! waits for all of them before handing the records back.
//!
//! ## Release Model
//!
//! Request `i` (0-based) has the nominal offset `i / target_rate`. Deadlines
//! are absolute (`start + offset`), never relative to the previous release,
//! so timer overshoot does not accumulate. A release that is already late
//! fires immediately and the following deadlines stay where they were.
//!
//! Each release spawns an independent executor task. The scheduler never
//! waits for a response before releasing the next request; after the last
//! release it awaits every task in sequence order.

use crate::{
    config::TestConfig,
    endpoint::ChatEndpoint,
    executor::{self, Progress},
    results::ResultRecord,
    utils::{format_duration, generate_run_id},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info};

/// Releases later than this are logged as late
const LATE_RELEASE_THRESHOLD: Duration = Duration::from_millis(5);

/// One planned request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestSpec {
    /// 1-based position in the dispatch sequence
    pub sequence_id: usize,
    pub prompt: String,

    /// Nominal release offset from the start of the run
    pub scheduled_offset: Duration,
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: String,

    /// Wall-clock start of the run
    pub started_at: chrono::DateTime<chrono::Local>,

    /// From the first release until the last response
    pub elapsed: Duration,

    /// One record per planned request, ordered by `sequence_id`
    pub records: Vec<ResultRecord>,
}

/// Compute the release plan for a configuration
///
/// Produces `config.total_requests()` specs with strictly increasing offsets
/// `i / target_rate`. Prompts are taken from the pool in order, wrapping
/// around only when cycling is enabled.
pub fn plan_requests(config: &TestConfig) -> Vec<RequestSpec> {
    let pool = &config.prompt_pool;
    if pool.is_empty() {
        return Vec::new();
    }

    (0..config.total_requests())
        .map(|i| RequestSpec {
            sequence_id: i + 1,
            prompt: pool[i % pool.len()].clone(),
            scheduled_offset: Duration::from_secs_f64(i as f64 / config.target_rate),
        })
        .collect()
}

/// Drives one load-test run against a chat endpoint
pub struct Scheduler {
    config: Arc<TestConfig>,
    endpoint: Arc<dyn ChatEndpoint>,
}

impl Scheduler {
    pub fn new(config: TestConfig, endpoint: Arc<dyn ChatEndpoint>) -> Self {
        Self {
            config: Arc::new(config),
            endpoint,
        }
    }

    /// Run the load test to completion
    ///
    /// Returns after every released request has produced its record. Request
    /// failures are captured in the records; the run itself cannot fail.
    pub async fn run(&self) -> RunOutcome {
        let plan = plan_requests(&self.config);
        let run_id = generate_run_id();
        let total = plan.len();

        info!(
            "Run {}: {} requests at {} req/s against {} ({})",
            run_id,
            total,
            self.config.target_rate,
            self.config.model.base_url,
            self.endpoint.name()
        );
        if total < self.config.scheduled_slots() {
            info!(
                "Prompt pool holds {} prompts; run is capped at {} of {} slots",
                self.config.prompt_pool.len(),
                total,
                self.config.scheduled_slots()
            );
        }

        let progress = Arc::new(Progress::new(total));
        let started_at = chrono::Local::now();
        let start = Instant::now();

        let mut in_flight: Vec<(RequestSpec, Duration, JoinHandle<ResultRecord>)> =
            Vec::with_capacity(total);

        for spec in plan {
            sleep_until(start + spec.scheduled_offset).await;

            let dispatch_offset = start.elapsed();
            let lag = dispatch_offset.saturating_sub(spec.scheduled_offset);
            if lag > LATE_RELEASE_THRESHOLD {
                debug!(
                    "Request {} released {} late",
                    spec.sequence_id,
                    format_duration(lag)
                );
            }

            let endpoint = Arc::clone(&self.endpoint);
            let config = Arc::clone(&self.config);
            let task_progress = Arc::clone(&progress);
            let task_spec = spec.clone();
            let handle = tokio::spawn(async move {
                executor::execute(
                    task_spec,
                    endpoint.as_ref(),
                    &config.model,
                    dispatch_offset,
                    &task_progress,
                )
                .await
            });

            in_flight.push((spec, dispatch_offset, handle));
        }

        info!(
            "All {} requests released after {}, waiting for responses",
            total,
            format_duration(start.elapsed())
        );

        let mut records = Vec::with_capacity(total);
        for (spec, dispatch_offset, handle) in in_flight {
            match handle.await {
                Ok(record) => records.push(record),
                Err(e) => {
                    error!("Executor for request {} did not finish: {}", spec.sequence_id, e);
                    records.push(abandoned_record(spec, dispatch_offset, e.to_string()));
                }
            }
        }

        let elapsed = start.elapsed();
        info!(
            "Run {} finished in {}, {} of {} requests completed",
            run_id,
            format_duration(elapsed),
            progress.completed(),
            total
        );

        RunOutcome {
            run_id,
            started_at,
            elapsed,
            records,
        }
    }
}

/// Failed record for a request whose executor task panicked or was cancelled
fn abandoned_record(spec: RequestSpec, dispatch_offset: Duration, reason: String) -> ResultRecord {
    ResultRecord {
        sequence_id: spec.sequence_id,
        prompt: spec.prompt,
        success: false,
        latency: Duration::ZERO,
        scheduled_offset: spec.scheduled_offset,
        dispatch_offset,
        timestamp: chrono::Local::now(),
        content: String::new(),
        reasoning: None,
        preview: String::new(),
        error_message: format!("executor task failed: {}", reason),
    }
}
