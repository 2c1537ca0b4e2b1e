//! # Utility Functions and Helper Module
//!
//! This module provides small helpers used throughout the load generator. It
//! includes formatters for human-readable output, validation functions for
//! run parameters, preview truncation for log and report output, and run
//! identifiers.
//!
//! ## Key Functionality Categories
//!
//! - **Formatting**: Human-readable display of durations and request rates
//! - **Validation**: Input parameter validation with clear error messages
//! - **Previews**: Character-bounded renderings of long model output
//! - **Display Helpers**: Progress indicators for per-request log lines
//!
//! ## Usage Examples
//!
//! ```rust
//! use chat_loadgen::utils::*;
//! use std::time::Duration;
//!
//! let duration_str = format_duration(Duration::from_micros(1500));
//! assert_eq!(duration_str, "1.50ms");
//!
//! assert_eq!(truncate_preview("hello", 50), "hello");
//!
//! # fn main() -> anyhow::Result<()> {
//! validate_target_rate(2.0)?; // OK
//! # Ok(())
//! # }
//! ```

use anyhow::Result;
use std::time::Duration;
use uuid::Uuid;

/// Maximum number of characters kept in a preview before it is truncated.
pub const PREVIEW_CHARS: usize = 50;

/// Generate a unique identifier for a load-test run
///
/// Creates a UUID v4 string that is written into the report header so runs
/// can be correlated with log files and JSON exports.
///
/// ## Returns
/// String representation of a UUID v4 (e.g., "550e8400-e29b-41d4-a716-446655440000")
pub fn generate_run_id() -> String {
    Uuid::new_v4().to_string()
}

/// Format a duration in a human-readable way
///
/// Converts a Duration to a human-readable string, automatically selecting
/// the most appropriate unit based on the magnitude.
///
/// ## Unit Selection Logic
///
/// - **Nanoseconds**: < 1,000 ns (e.g., "500ns")
/// - **Microseconds**: < 1,000,000 ns (e.g., "1.50μs")
/// - **Milliseconds**: < 1,000,000,000 ns (e.g., "25.75ms")
/// - **Seconds**: < 60 seconds (e.g., "5.25s")
/// - **Minutes and Hours**: For longer durations (e.g., "5m 30s", "2h 15m 30s")
///
/// ## Examples
///
/// ```rust
/// # use chat_loadgen::utils::format_duration;
/// # use std::time::Duration;
/// assert_eq!(format_duration(Duration::from_nanos(750)), "750ns");
/// assert_eq!(format_duration(Duration::from_nanos(1250)), "1.25μs");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let total_ns = duration.as_nanos();

    if total_ns < 1_000 {
        format!("{}ns", total_ns)
    } else if total_ns < 1_000_000 {
        format!("{:.2}μs", total_ns as f64 / 1_000.0)
    } else if total_ns < 1_000_000_000 {
        format!("{:.2}ms", total_ns as f64 / 1_000_000.0)
    } else if total_ns < 60_000_000_000 {
        format!("{:.2}s", total_ns as f64 / 1_000_000_000.0)
    } else {
        let seconds = duration.as_secs();
        let minutes = seconds / 60;
        let remaining_seconds = seconds % 60;

        if minutes < 60 {
            format!("{}m {}s", minutes, remaining_seconds)
        } else {
            let hours = minutes / 60;
            let remaining_minutes = minutes % 60;
            format!("{}h {}m {}s", hours, remaining_minutes, remaining_seconds)
        }
    }
}

/// Format a duration as seconds with two decimals, e.g. `"1.25s"`.
///
/// The report uses a single fixed unit so per-request latencies line up and
/// can be compared by eye.
pub fn format_seconds(duration: Duration) -> String {
    format!("{:.2}s", duration.as_secs_f64())
}

/// Format a request rate for display
///
/// ## Examples
///
/// ```rust
/// # use chat_loadgen::utils::format_request_rate;
/// assert_eq!(format_request_rate(2.0), "2.00 req/s");
/// assert_eq!(format_request_rate(1500.0), "1.50K req/s");
/// ```
pub fn format_request_rate(requests_per_second: f64) -> String {
    if requests_per_second < 1_000.0 {
        format!("{:.2} req/s", requests_per_second)
    } else if requests_per_second < 1_000_000.0 {
        format!("{:.2}K req/s", requests_per_second / 1_000.0)
    } else {
        format!("{:.2}M req/s", requests_per_second / 1_000_000.0)
    }
}

/// Truncate `text` to at most `max_chars` characters, appending `...` when
/// anything was cut.
///
/// Counts `char`s rather than bytes so multi-byte prompts and completions are
/// never split inside a code point.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Validate the target request rate
///
/// ## Validation Rules
///
/// - **Positive and finite**: a zero, negative, or NaN rate has no schedule
/// - **Upper bound**: 10,000 req/s; beyond that the scheduler's timer
///   granularity (1ms) cannot honour the cadence
pub fn validate_target_rate(rate: f64) -> Result<()> {
    if !rate.is_finite() || rate <= 0.0 {
        anyhow::bail!("Target rate must be a positive number, got {}", rate);
    }
    if rate > 10_000.0 {
        anyhow::bail!("Target rate {} is too high (maximum 10000 req/s)", rate);
    }
    Ok(())
}

/// Validate the run duration
pub fn validate_duration(duration: Duration) -> Result<()> {
    if duration.is_zero() {
        anyhow::bail!("Duration cannot be zero");
    }
    Ok(())
}

/// Validate sampling parameters sent with every request
///
/// ## Validation Rules
///
/// - **temperature**: 0.0 to 2.0 inclusive
/// - **top_p**: greater than 0.0, at most 1.0
/// - **max_tokens**: at least 1
pub fn validate_sampling(temperature: f32, top_p: f32, max_tokens: u32) -> Result<()> {
    if !(0.0..=2.0).contains(&temperature) {
        anyhow::bail!("Temperature {} is out of range (0.0 - 2.0)", temperature);
    }
    if !(top_p > 0.0 && top_p <= 1.0) {
        anyhow::bail!("top_p {} is out of range (0.0 exclusive - 1.0)", top_p);
    }
    if max_tokens == 0 {
        anyhow::bail!("max_tokens must be at least 1");
    }
    Ok(())
}

/// Create a progress indicator string
///
/// Generates a visual progress indicator using Unicode block characters.
///
/// ## Edge Cases
///
/// - **Zero Total**: Returns all filled blocks to avoid division by zero
/// - **Overflow**: Caps progress at 100% even if current > total
///
/// ## Examples
///
/// ```rust
/// # use chat_loadgen::utils::create_progress_indicator;
/// assert_eq!(create_progress_indicator(0, 100, 10), "░░░░░░░░░░");
/// assert_eq!(create_progress_indicator(50, 100, 10), "█████░░░░░");
/// assert_eq!(create_progress_indicator(100, 100, 10), "██████████");
/// ```
pub fn create_progress_indicator(current: usize, total: usize, width: usize) -> String {
    if total == 0 {
        return "█".repeat(width);
    }

    let progress = (current as f64 / total as f64).min(1.0);
    let filled = ((progress * width as f64) as usize).min(width);
    let empty = width - filled;

    format!("{}{}", "█".repeat(filled), "░".repeat(empty))
}
