use anyhow::Result;
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Percentile value pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileValue {
    pub percentile: f64,
    pub value: Duration,
}

/// Latency collector using HDR histogram for accurate measurement
///
/// Values are recorded in microseconds with 3 significant figures, which
/// keeps the histogram small for multi-minute outliers while staying far
/// below the resolution anyone reads an HTTP latency at.
pub struct LatencyCollector {
    histogram: Histogram<u64>,
    sample_count: usize,
}

impl LatencyCollector {
    /// Create a new latency collector
    pub fn new() -> Result<Self> {
        let histogram = Histogram::<u64>::new(3)?;

        Ok(Self {
            histogram,
            sample_count: 0,
        })
    }

    /// Record a latency measurement
    pub fn record(&mut self, latency: Duration) -> Result<()> {
        let latency_us = latency.as_micros().min(u64::MAX as u128) as u64;
        self.histogram.record(latency_us)?;
        self.sample_count += 1;
        Ok(())
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Latency at each requested percentile; empty when nothing was recorded
    pub fn percentiles(&self, percentiles: &[f64]) -> Vec<PercentileValue> {
        if self.sample_count == 0 {
            return Vec::new();
        }

        percentiles
            .iter()
            .map(|&p| PercentileValue {
                percentile: p,
                value: Duration::from_micros(self.histogram.value_at_percentile(p)),
            })
            .collect()
    }

    /// Standard deviation of the recorded latencies
    pub fn std_dev(&self) -> Duration {
        if self.sample_count == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.histogram.stdev() / 1_000_000.0)
    }
}

/// Format a percentile label, e.g. `50.0` as `"P50"` and `99.9` as `"P99.9"`
pub fn percentile_label(percentile: f64) -> String {
    if percentile.fract() == 0.0 {
        format!("P{}", percentile as u64)
    } else {
        format!("P{}", percentile)
    }
}
