//! # Request Executor
//!
//! Wraps one `ChatEndpoint` call with timing, error capture, and record
//! construction. Each executor runs as its own tokio task and touches no
//! state shared with other executors apart from a completion counter used
//! for progress output.

use crate::{
    config::ModelSettings,
    endpoint::{ChatEndpoint, ChatResponse},
    results::ResultRecord,
    scheduler::RequestSpec,
    utils::{create_progress_indicator, format_seconds, truncate_preview, PREVIEW_CHARS},
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Progress shared by the executors of one run
#[derive(Debug)]
pub struct Progress {
    completed: AtomicUsize,
    total: usize,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
        }
    }

    /// Mark one request finished and return the new completed count
    fn complete_one(&self) -> usize {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }
}

/// Render the human-readable preview of a successful response
///
/// One line for content and one for reasoning, each capped at
/// `PREVIEW_CHARS` characters, with `none` standing in for absent text.
pub fn build_preview(content: &str, reasoning: Option<&str>) -> String {
    let content_line = if content.is_empty() {
        "none".to_string()
    } else {
        truncate_preview(content, PREVIEW_CHARS)
    };
    let reasoning_line = match reasoning {
        Some(text) if !text.is_empty() => truncate_preview(text, PREVIEW_CHARS),
        _ => "none".to_string(),
    };
    format!("Content: {}\nReasoning: {}", content_line, reasoning_line)
}

/// Execute one planned request and build its record
///
/// `dispatch_offset` is stamped by the scheduler at release time, so offsets
/// stay ordered by sequence no matter when the runtime first polls this task.
/// Endpoint failures become failed records; this function itself never fails.
pub async fn execute(
    spec: RequestSpec,
    endpoint: &dyn ChatEndpoint,
    settings: &ModelSettings,
    dispatch_offset: Duration,
    progress: &Progress,
) -> ResultRecord {
    let dispatched_at = Instant::now();
    info!("Starting request {}: {}", spec.sequence_id, spec.prompt);

    let outcome = endpoint.call(&spec.prompt, settings).await;

    let latency = dispatched_at.elapsed();
    let timestamp = chrono::Local::now();
    let completed = progress.complete_one();
    let bar = create_progress_indicator(completed, progress.total, 20);

    match outcome {
        Ok(ChatResponse {
            content, reasoning, ..
        }) => {
            let preview = build_preview(&content, reasoning.as_deref());
            info!(
                "[{}] {}/{} request {} succeeded in {}\n{}",
                bar,
                completed,
                progress.total,
                spec.sequence_id,
                format_seconds(latency),
                preview
            );
            ResultRecord {
                sequence_id: spec.sequence_id,
                prompt: spec.prompt,
                success: true,
                latency,
                scheduled_offset: spec.scheduled_offset,
                dispatch_offset,
                timestamp,
                content,
                reasoning,
                preview,
                error_message: String::new(),
            }
        }
        Err(e) => {
            warn!(
                "[{}] {}/{} request {} failed after {}: {}",
                bar,
                completed,
                progress.total,
                spec.sequence_id,
                format_seconds(latency),
                e
            );
            ResultRecord {
                sequence_id: spec.sequence_id,
                prompt: spec.prompt,
                success: false,
                latency,
                scheduled_offset: spec.scheduled_offset,
                dispatch_offset,
                timestamp,
                content: String::new(),
                reasoning: None,
                preview: String::new(),
                error_message: e.to_string(),
            }
        }
    }
}
