//! Data sources for the dashboard.
//!
//! The stats service is reached over HTTP through the [`StatsClient`]
//! trait. Two consumers sit on top of it:
//!
//! - [`PollLoop`]: a background task fetching `/stats` on a fixed cadence
//! - [`DayRequest`]: a one-shot fetch of a single day for the schedule view
//!
//! Both run on tokio and hand results to the render thread through
//! channels; the UI never blocks on the network.

mod day;
mod error;
mod http;
mod poll;
mod snapshot;

pub use day::{events_on_day, DayEvents, DayOrigin, DayRequest};
pub use error::FetchError;
pub use http::{HttpClient, HttpClientBuilder, StatsClient};
pub use poll::{next_delay, PollConfig, PollDelivery, PollLoop, PollState};
pub use snapshot::{coerce_string, parse_day_events, RawEvent, StatsPayload};
