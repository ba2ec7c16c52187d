//! # statusdeck
//!
//! A terminal status dashboard and library: four live metric gauges, the
//! list of currently relevant events, and a single-day schedule with
//! overlapping events laid out side by side.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌──────────┐  │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal │  │
//! │  │ (state) │    │(processing)   │(rendering)   │          │  │
//! │  └────┬────┘    └──────────┘    └─────────┘    └──────────┘  │
//! │       │ try_recv / oneshot                                   │
//! │       ▼                                                      │
//! │  ┌─────────┐                                                 │
//! │  │ source  │◀── PollLoop | DayRequest ◀── HTTP /stats /events│
//! │  │ (input) │                                                 │
//! │  └─────────┘                                                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state; folds poll deliveries into gauges,
//!   the event list and the schedule
//! - **[`source`]**: HTTP client ([`StatsClient`]), the background
//!   [`PollLoop`] and one-shot [`DayRequest`]s
//! - **[`data`]**: Timestamp normalization, event visibility, interval
//!   layout, change detection and metric reconciliation
//! - **[`ui`]**: Terminal rendering using ratatui
//! - **[`settings`]**: Layered configuration (defaults, TOML, env, flags)
//!
//! ## Usage
//!
//! ```bash
//! statusdeck --url http://127.0.0.1:8001
//! statusdeck --config statusdeck.toml
//! statusdeck --once   # print one reconciled snapshot as JSON
//! ```
//!
//! ### Laying out a day
//!
//! ```
//! use chrono::NaiveDate;
//! use statusdeck::data::{day_intervals, layout_intervals, normalize_events};
//! use statusdeck::source::RawEvent;
//!
//! let raw: Vec<RawEvent> = serde_json::from_str(r#"[
//!     {"title": "Standup", "from": "2024-05-20T09:00:00", "to": "2024-05-20T09:30:00"},
//!     {"title": "Review",  "from": "2024-05-20T09:15:00", "to": "2024-05-20T09:45:00"}
//! ]"#).unwrap();
//!
//! let events = normalize_events(&raw);
//! let day = NaiveDate::from_ymd_opt(2024, 5, 20).unwrap();
//! let slots = layout_intervals(&day_intervals(&events, day));
//!
//! assert_eq!(slots[0].column_index, 0);
//! assert_eq!(slots[1].column_index, 1);
//! assert!(slots.iter().all(|s| s.column_count == 2));
//! ```
//!
//! ### Polling in the background
//!
//! ```no_run
//! use std::sync::Arc;
//! use statusdeck::source::{HttpClient, PollConfig, PollDelivery, PollLoop};
//!
//! # tokio_test::block_on(async {
//! let client = HttpClient::builder().base_url("http://127.0.0.1:8001").build().unwrap();
//! let mut poll = PollLoop::spawn(Arc::new(client), PollConfig::default());
//!
//! while let Some(delivery) = poll.recv().await {
//!     match delivery {
//!         PollDelivery::Snapshot { payload, .. } => println!("{:?}", payload.fields),
//!         PollDelivery::Unavailable(err) => eprintln!("{}", err),
//!     }
//! }
//! # });
//! ```

pub mod app;
pub mod data;
pub mod events;
pub mod logging;
pub mod scheduler;
pub mod settings;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use data::{
    CanonicalMetrics, ContentSignature, LayoutSlot, NormalizedEvent, Selection, VisibilityPolicy,
};
pub use settings::Settings;
pub use source::{
    DayRequest, FetchError, PollDelivery, PollLoop, RawEvent, StatsClient, StatsPayload,
};
