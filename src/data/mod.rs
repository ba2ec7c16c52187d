//! Event and metric processing.
//!
//! Everything in here is synchronous and free of I/O; the [`crate::source`]
//! module feeds it raw payloads and the UI reads the results.
//!
//! ## Submodules
//!
//! - [`timestamp`]: Folding loosely formatted timestamps into local instants
//! - [`event`]: The [`NormalizedEvent`] model
//! - [`visible`]: Choosing which events are currently relevant
//! - [`layout`]: Packing a day's events into non-overlapping columns
//! - [`signature`]: Content fingerprints to skip redundant rebuilds
//! - [`metrics`]: Key reconciliation and staggered gauge updates
//! - [`history`]: Recent metric values for sparklines
//!
//! ## Data Flow
//!
//! ```text
//! StatsPayload
//!     │
//!     ├──▶ reconcile() ──▶ dispatch_plan() ──▶ gauges (staggered)
//!     │
//!     └──▶ events ──▶ ContentSignature ──▶ ChangeDetector
//!                                              │ Changed
//!                                              ▼
//!                          normalize_events() ──▶ select_visible()
//!                                              └──▶ day_intervals() ──▶ layout_intervals()
//! ```

pub mod event;
pub mod history;
pub mod layout;
pub mod metrics;
pub mod signature;
pub mod timestamp;
pub mod visible;

pub use event::{normalize_events, NormalizedEvent, UNTITLED};
pub use history::MetricHistory;
pub use layout::{day_intervals, layout_intervals, Interval, LayoutSlot};
pub use metrics::{
    dispatch_plan, reconcile, CanonicalMetric, CanonicalMetrics, GaugeAnimation, GaugeLevel,
    MetricUpdate,
};
pub use signature::{Change, ChangeDetector, ContentSignature, Feed};
pub use timestamp::normalize_timestamp;
pub use visible::{select_visible, Selection, VisibilityPolicy, VisibilityWindow};
