use crate::metrics::{LatencyCollector, PercentileValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Outcome of one request, produced exactly once per planned request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultRecord {
    /// 1-based position in the dispatch sequence
    pub sequence_id: usize,
    pub prompt: String,
    pub success: bool,

    /// Wall time from dispatch to completion
    pub latency: Duration,

    /// Nominal release offset from the start of the run
    pub scheduled_offset: Duration,

    /// Actual release offset from the start of the run
    pub dispatch_offset: Duration,

    /// Completion wall-clock time
    pub timestamp: chrono::DateTime<chrono::Local>,

    /// Full answer text; empty on failure or when the server returned none
    pub content: String,

    /// Full reasoning text, present only when the server returned one
    pub reasoning: Option<String>,

    /// Bounded rendering of content and reasoning for humans; empty on failure
    pub preview: String,

    /// Error description; empty on success
    pub error_message: String,
}

/// Aggregate statistics for a run
///
/// Latency figures cover successful requests only. With no successes they
/// are all zero and `latency_percentiles` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub total_requests: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub success_rate_percent: f64,
    pub avg_latency: Duration,
    pub min_latency: Duration,
    pub max_latency: Duration,
    pub latency_std_dev: Duration,
    pub latency_percentiles: Vec<PercentileValue>,
}

impl TestSummary {
    /// Compute the summary of a set of records in any order
    pub fn from_records(records: &[ResultRecord]) -> Self {
        Self::with_percentiles(records, &crate::defaults::PERCENTILES)
    }

    /// Same as `from_records` with an explicit percentile list
    pub fn with_percentiles(records: &[ResultRecord], percentiles: &[f64]) -> Self {
        let total_requests = records.len();
        let latencies: Vec<Duration> = records
            .iter()
            .filter(|r| r.success)
            .map(|r| r.latency)
            .collect();
        let success_count = latencies.len();

        let success_rate_percent = if total_requests > 0 {
            success_count as f64 / total_requests as f64 * 100.0
        } else {
            0.0
        };

        let (avg_latency, min_latency, max_latency) = if latencies.is_empty() {
            (Duration::ZERO, Duration::ZERO, Duration::ZERO)
        } else {
            let total: Duration = latencies.iter().sum();
            (
                total / success_count as u32,
                latencies.iter().copied().min().unwrap_or_default(),
                latencies.iter().copied().max().unwrap_or_default(),
            )
        };

        let (latency_std_dev, latency_percentiles) = Self::distribution(&latencies, percentiles);

        Self {
            total_requests,
            success_count,
            failure_count: total_requests - success_count,
            success_rate_percent,
            avg_latency,
            min_latency,
            max_latency,
            latency_std_dev,
            latency_percentiles,
        }
    }

    /// Spread and percentiles from an HDR histogram; empty on any histogram error
    fn distribution(latencies: &[Duration], percentiles: &[f64]) -> (Duration, Vec<PercentileValue>) {
        let mut collector = match LatencyCollector::new() {
            Ok(collector) => collector,
            Err(e) => {
                warn!("Latency histogram unavailable: {}", e);
                return (Duration::ZERO, Vec::new());
            }
        };

        for latency in latencies {
            if let Err(e) = collector.record(*latency) {
                warn!("Dropping latency sample {:?} from histogram: {}", latency, e);
            }
        }

        (collector.std_dev(), collector.percentiles(percentiles))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(sequence_id: usize, success: bool, latency_ms: u64) -> ResultRecord {
        ResultRecord {
            sequence_id,
            prompt: format!("prompt {}", sequence_id),
            success,
            latency: Duration::from_millis(latency_ms),
            scheduled_offset: Duration::from_secs(sequence_id as u64 - 1),
            dispatch_offset: Duration::from_secs(sequence_id as u64 - 1),
            timestamp: chrono::Local::now(),
            content: if success { "answer".to_string() } else { String::new() },
            reasoning: None,
            preview: if success {
                "Content: answer\nReasoning: none".to_string()
            } else {
                String::new()
            },
            error_message: if success {
                String::new()
            } else {
                "request failed: connection refused".to_string()
            },
        }
    }

    #[test]
    fn test_summary_of_mixed_results() {
        let records = vec![
            record(1, true, 100),
            record(2, true, 300),
            record(3, false, 50),
            record(4, true, 200),
        ];

        let summary = TestSummary::from_records(&records);

        assert_eq!(summary.total_requests, 4);
        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.failure_count, 1);
        assert_eq!(summary.success_rate_percent, 75.0);
        assert_eq!(summary.avg_latency, Duration::from_millis(200));
        assert_eq!(summary.min_latency, Duration::from_millis(100));
        assert_eq!(summary.max_latency, Duration::from_millis(300));
        assert_eq!(summary.latency_percentiles.len(), 3);
    }

    #[test]
    fn test_summary_is_order_independent() {
        let mut records = vec![
            record(1, true, 120),
            record(2, false, 10),
            record(3, true, 80),
            record(4, true, 400),
        ];
        let forward = TestSummary::from_records(&records);
        records.reverse();
        let backward = TestSummary::from_records(&records);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_summary_without_successes() {
        let records = vec![record(1, false, 10), record(2, false, 20)];
        let summary = TestSummary::from_records(&records);

        assert_eq!(summary.success_count, 0);
        assert_eq!(summary.failure_count, 2);
        assert_eq!(summary.success_rate_percent, 0.0);
        assert_eq!(summary.avg_latency, Duration::ZERO);
        assert_eq!(summary.min_latency, Duration::ZERO);
        assert_eq!(summary.max_latency, Duration::ZERO);
        assert!(summary.latency_percentiles.is_empty());
    }

    #[test]
    fn test_summary_of_empty_run() {
        let summary = TestSummary::from_records(&[]);

        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.success_rate_percent, 0.0);
        assert!(!summary.success_rate_percent.is_nan());
        assert_eq!(summary.success_count + summary.failure_count, 0);
    }

    /// Failed requests never contribute to latency statistics
    #[test]
    fn test_failed_latency_is_excluded() {
        let records = vec![record(1, true, 100), record(2, false, 10_000)];
        let summary = TestSummary::from_records(&records);

        assert_eq!(summary.max_latency, Duration::from_millis(100));
        assert_eq!(summary.avg_latency, Duration::from_millis(100));
    }
}
