//! Recent metric values for sparklines.

use std::collections::VecDeque;

use super::metrics::{CanonicalMetric, CanonicalMetrics};

/// Maximum number of samples kept per metric.
const MAX_HISTORY_SIZE: usize = 60;

/// Rolling window of reconciled metric snapshots.
///
/// Nothing is persisted; the window starts empty on every launch.
#[derive(Debug, Clone, Default)]
pub struct MetricHistory {
    samples: [VecDeque<f64>; 4],
}

impl MetricHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reconciled snapshot.
    pub fn record(&mut self, metrics: &CanonicalMetrics) {
        for metric in CanonicalMetric::ALL {
            let series = &mut self.samples[metric.index()];
            series.push_back(metrics.get(metric));
            if series.len() > MAX_HISTORY_SIZE {
                series.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.samples[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest(&self, metric: CanonicalMetric) -> Option<f64> {
        self.samples[metric.index()].back().copied()
    }

    /// Sparkline bars for a metric, scaled to 0..=100.
    ///
    /// Values are clamped to the gauge range first, so a single bogus
    /// reading does not flatten the rest of the line.
    pub fn sparkline(&self, metric: CanonicalMetric) -> Vec<u64> {
        self.samples[metric.index()]
            .iter()
            .map(|&v| if v.is_finite() { v.clamp(0.0, 100.0).round() as u64 } else { 0 })
            .collect()
    }
}
