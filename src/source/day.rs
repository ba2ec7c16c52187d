//! One-shot fetch of a single day's events for the schedule view.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::http::StatsClient;
use super::snapshot::RawEvent;
use super::FetchError;
use crate::data::event::NormalizedEvent;
use crate::data::layout::{day_bounds, overlaps_day};

/// Where a day's events came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOrigin {
    /// The remote day endpoint answered.
    Remote,
    /// The endpoint failed; events were taken from the last poll snapshot.
    Fallback,
}

impl DayOrigin {
    pub fn label(&self) -> &'static str {
        match self {
            DayOrigin::Remote => "remote",
            DayOrigin::Fallback => "cached",
        }
    }
}

/// Completed day fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct DayEvents {
    pub date: NaiveDate,
    pub events: Vec<RawEvent>,
    pub origin: DayOrigin,
    /// Why the remote fetch was abandoned, for `Fallback` results.
    pub error: Option<FetchError>,
}

/// A day fetch running in the background.
pub struct DayRequest {
    date: NaiveDate,
    receiver: oneshot::Receiver<DayEvents>,
}

impl fmt::Debug for DayRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DayRequest").field("date", &self.date).finish()
    }
}

impl DayRequest {
    /// Start fetching `date`.
    ///
    /// `fallback` is a copy of the last periodic snapshot's events, taken by
    /// the caller at request time; nothing is shared with the poll loop.
    pub fn spawn(
        client: Arc<dyn StatsClient>,
        date: NaiveDate,
        timeout: Duration,
        fallback: Vec<RawEvent>,
    ) -> Self {
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let result = fetch_day(client.as_ref(), date, timeout, fallback).await;
            // the schedule view may have moved on
            let _ = tx.send(result);
        });

        Self { date, receiver: rx }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Non-blocking check for completion.
    ///
    /// Returns `None` while the fetch is still running, and also if the task
    /// died without answering.
    pub fn poll(&mut self) -> Option<DayEvents> {
        self.receiver.try_recv().ok()
    }

    /// Wait for completion.
    pub async fn wait(self) -> Option<DayEvents> {
        self.receiver.await.ok()
    }
}

async fn fetch_day(
    client: &dyn StatsClient,
    date: NaiveDate,
    timeout: Duration,
    fallback: Vec<RawEvent>,
) -> DayEvents {
    let outcome = tokio::time::timeout(timeout, client.fetch_day(date))
        .await
        .map_err(FetchError::from)
        .and_then(|r| r);

    match outcome {
        Ok(events) => {
            debug!(%date, count = events.len(), "day events fetched");
            DayEvents {
                date,
                events,
                origin: DayOrigin::Remote,
                error: None,
            }
        }
        Err(e) => {
            warn!(%date, error = %e, "day fetch failed, using last snapshot");
            DayEvents {
                date,
                events: events_on_day(fallback, date),
                origin: DayOrigin::Fallback,
                error: Some(e),
            }
        }
    }
}

/// Keep the raw events that touch `date`, using the same overlap rule as
/// the timeline layout.
pub fn events_on_day(events: Vec<RawEvent>, date: NaiveDate) -> Vec<RawEvent> {
    let Some((day_start, day_end)) = day_bounds(date) else {
        return Vec::new();
    };

    events
        .into_iter()
        .filter(|raw| {
            NormalizedEvent::from_raw(raw)
                .is_some_and(|event| overlaps_day(&event, day_start, day_end))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StatsPayload;
    use async_trait::async_trait;

    enum Answer {
        Events(Vec<RawEvent>),
        Fail,
        Hang,
    }

    struct DayClient(Answer);

    #[async_trait]
    impl StatsClient for DayClient {
        async fn fetch_stats(&self) -> Result<StatsPayload, FetchError> {
            Ok(StatsPayload::default())
        }

        async fn fetch_day(&self, _date: NaiveDate) -> Result<Vec<RawEvent>, FetchError> {
            match &self.0 {
                Answer::Events(events) => Ok(events.clone()),
                Answer::Fail => Err(FetchError::Connection("refused".into())),
                Answer::Hang => std::future::pending().await,
            }
        }

        fn description(&self) -> &str {
            "day-test"
        }
    }

    fn raw(title: &str, from: &str, to: &str) -> RawEvent {
        RawEvent {
            title: Some(title.into()),
            from: Some(from.into()),
            to: Some(to.into()),
            ..Default::default()
        }
    }

    fn may_20() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn snapshot_events() -> Vec<RawEvent> {
        vec![
            raw("Standup", "2024-05-20T09:00:00", "2024-05-20T09:30:00"),
            raw("Tomorrow", "2024-05-21T09:00:00", "2024-05-21T10:00:00"),
            raw("Overnight", "2024-05-19T22:00:00", "2024-05-20T01:00:00"),
            RawEvent {
                title: Some("Undated".into()),
                ..Default::default()
            },
        ]
    }

    #[tokio::test]
    async fn test_remote_result() {
        let remote = vec![raw("Review", "2024-05-20T09:15:00", "2024-05-20T09:45:00")];
        let client = Arc::new(DayClient(Answer::Events(remote.clone())));
        let request =
            DayRequest::spawn(client, may_20(), Duration::from_secs(1), snapshot_events());

        let result = request.wait().await.unwrap();
        assert_eq!(result.origin, DayOrigin::Remote);
        assert_eq!(result.events, remote);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_snapshot_filtered_by_day() {
        let client = Arc::new(DayClient(Answer::Fail));
        let request =
            DayRequest::spawn(client, may_20(), Duration::from_secs(1), snapshot_events());

        let result = request.wait().await.unwrap();
        assert_eq!(result.origin, DayOrigin::Fallback);
        let titles: Vec<_> = result.events.iter().filter_map(|e| e.title.as_deref()).collect();
        assert_eq!(titles, vec!["Standup", "Overnight"]);
        assert!(matches!(result.error, Some(FetchError::Connection(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_falls_back() {
        let client = Arc::new(DayClient(Answer::Hang));
        let request = DayRequest::spawn(client, may_20(), Duration::from_millis(1500), Vec::new());

        let result = request.wait().await.unwrap();
        assert_eq!(result.origin, DayOrigin::Fallback);
        assert_eq!(result.error, Some(FetchError::Timeout));
        assert!(result.events.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_before_and_after_completion() {
        let client = Arc::new(DayClient(Answer::Hang));
        let mut request =
            DayRequest::spawn(client, may_20(), Duration::from_millis(100), Vec::new());
        assert_eq!(request.date(), may_20());
        assert!(request.poll().is_none());

        tokio::time::sleep(Duration::from_millis(200)).await;
        let result = request.poll().unwrap();
        assert_eq!(result.origin, DayOrigin::Fallback);
    }
}
