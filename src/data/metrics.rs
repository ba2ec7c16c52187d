//! Metric reconciliation and gauge dispatch.
//!
//! The stats endpoint is loose about key names: network load may arrive as
//! `net`, `network` or `disk`, power as `battery` or `power`. Everything is
//! folded into four canonical metrics here.

use std::time::{Duration, Instant};

use serde_json::Value;

use crate::source::StatsPayload;

/// The four metrics shown on the dashboard, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalMetric {
    Cpu,
    Mem,
    Net,
    Power,
}

impl CanonicalMetric {
    pub const ALL: [CanonicalMetric; 4] = [
        CanonicalMetric::Cpu,
        CanonicalMetric::Mem,
        CanonicalMetric::Net,
        CanonicalMetric::Power,
    ];

    /// Payload keys consulted for this metric, in priority order.
    pub fn source_keys(&self) -> &'static [&'static str] {
        match self {
            CanonicalMetric::Cpu => &["cpu"],
            CanonicalMetric::Mem => &["mem"],
            CanonicalMetric::Net => &["net", "network", "disk"],
            CanonicalMetric::Power => &["battery", "power"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CanonicalMetric::Cpu => "CPU",
            CanonicalMetric::Mem => "Memory",
            CanonicalMetric::Net => "Network",
            CanonicalMetric::Power => "Battery",
        }
    }

    /// Whether low values are the bad ones.
    pub fn is_reversed(&self) -> bool {
        matches!(self, CanonicalMetric::Power)
    }

    pub fn index(&self) -> usize {
        match self {
            CanonicalMetric::Cpu => 0,
            CanonicalMetric::Mem => 1,
            CanonicalMetric::Net => 2,
            CanonicalMetric::Power => 3,
        }
    }
}

/// Canonical metric values. Not clamped; the UI clamps for display.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CanonicalMetrics {
    pub cpu: f64,
    pub mem: f64,
    pub net: f64,
    pub power: f64,
}

impl CanonicalMetrics {
    pub fn get(&self, metric: CanonicalMetric) -> f64 {
        match metric {
            CanonicalMetric::Cpu => self.cpu,
            CanonicalMetric::Mem => self.mem,
            CanonicalMetric::Net => self.net,
            CanonicalMetric::Power => self.power,
        }
    }
}

/// Fold a stats payload into canonical metrics.
///
/// Each metric takes the first key of its chain that is present in the
/// payload, even if that key holds `null`. Numbers are used as-is, numeric
/// strings are parsed, anything else counts as `0.0`.
pub fn reconcile(payload: &StatsPayload) -> CanonicalMetrics {
    let pick = |metric: CanonicalMetric| {
        metric
            .source_keys()
            .iter()
            .find_map(|key| payload.fields.get(*key))
            .map(coerce_metric)
            .unwrap_or(0.0)
    };

    CanonicalMetrics {
        cpu: pick(CanonicalMetric::Cpu),
        mem: pick(CanonicalMetric::Mem),
        net: pick(CanonicalMetric::Net),
        power: pick(CanonicalMetric::Power),
    }
}

fn coerce_metric(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// One gauge update, to be applied `delay` after the snapshot arrived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricUpdate {
    pub metric: CanonicalMetric,
    pub value: f64,
    pub delay: Duration,
}

/// Stagger the four gauge updates: cpu first, then mem, net and power,
/// each one `stagger_unit` after the previous.
pub fn dispatch_plan(metrics: &CanonicalMetrics, stagger_unit: Duration) -> [MetricUpdate; 4] {
    CanonicalMetric::ALL.map(|metric| MetricUpdate {
        metric,
        value: metrics.get(metric),
        delay: stagger_unit * metric.index() as u32,
    })
}

/// Colour band of a gauge value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeLevel {
    Good,
    Warning,
    Critical,
}

impl GaugeLevel {
    /// Normal gauges: below 50 good, below 80 warning, else critical.
    /// Reversed gauges (battery): below 15 critical, else good.
    pub fn classify(value: f64, reversed: bool) -> Self {
        if reversed {
            if value < 15.0 {
                GaugeLevel::Critical
            } else {
                GaugeLevel::Good
            }
        } else if value < 50.0 {
            GaugeLevel::Good
        } else if value < 80.0 {
            GaugeLevel::Warning
        } else {
            GaugeLevel::Critical
        }
    }
}

/// Smooth transition of a gauge needle toward its latest target.
#[derive(Debug, Clone, Copy)]
pub struct GaugeAnimation {
    from: f64,
    to: f64,
    started: Instant,
    duration: Duration,
}

impl GaugeAnimation {
    pub fn new(initial: f64, duration: Duration) -> Self {
        Self {
            from: initial,
            to: initial,
            started: Instant::now(),
            duration,
        }
    }

    /// Retarget from wherever the needle currently is.
    pub fn retarget(&mut self, target: f64, now: Instant) {
        self.from = self.value_at(now);
        self.to = target;
        self.started = now;
    }

    pub fn target(&self) -> f64 {
        self.to
    }

    /// Needle position with quadratic ease-out.
    pub fn value_at(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        let t = (elapsed / self.duration.as_secs_f64()).clamp(0.0, 1.0);
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        self.from + (self.to - self.from) * eased
    }

    pub fn is_settled(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.duration
    }
}
