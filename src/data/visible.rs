//! Selection of the events that are currently relevant.
//!
//! Two visibility rules exist and they disagree on events that have just
//! begun, so each call site picks exactly one [`VisibilityPolicy`].

use chrono::{DateTime, Duration, Local};
use serde::Deserialize;

use super::event::NormalizedEvent;

/// Default grace period for [`VisibilityPolicy::RecentStart`].
pub const DEFAULT_BUFFER_MINUTES: i64 = 2;

/// Rule deciding whether an event is still worth showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisibilityPolicy {
    /// Show ongoing and future events: end ≥ now, or start ≥ now when the
    /// end is missing. No buffer.
    ListView,
    /// Hide events whose start lies at least `buffer` in the past.
    #[default]
    RecentStart,
}

impl VisibilityPolicy {
    pub fn label(&self) -> &'static str {
        match self {
            VisibilityPolicy::ListView => "list-view",
            VisibilityPolicy::RecentStart => "recent-start",
        }
    }
}

/// Reference time and grace period used for a selection.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityWindow {
    pub reference_time: DateTime<Local>,
    pub buffer: Duration,
}

impl VisibilityWindow {
    /// Window at `reference_time` with the default two minute buffer.
    pub fn new(reference_time: DateTime<Local>) -> Self {
        Self {
            reference_time,
            buffer: Duration::minutes(DEFAULT_BUFFER_MINUTES),
        }
    }

    /// Replace the buffer. Values past what a `Duration` can hold saturate.
    pub fn with_buffer_minutes(mut self, minutes: i64) -> Self {
        self.buffer = Duration::try_minutes(minutes).unwrap_or(if minutes < 0 {
            Duration::MIN
        } else {
            Duration::MAX
        });
        self
    }

    fn admits(&self, event: &NormalizedEvent, policy: VisibilityPolicy) -> bool {
        let now = self.reference_time;
        match policy {
            VisibilityPolicy::ListView => match (event.start, event.end) {
                (_, Some(end)) => end >= now,
                (Some(start), None) => start >= now,
                (None, None) => false,
            },
            VisibilityPolicy::RecentStart => match event.start {
                // a cutoff before the representable range admits everything
                Some(start) => match now.checked_sub_signed(self.buffer) {
                    Some(cutoff) => start > cutoff,
                    None => true,
                },
                None => true,
            },
        }
    }
}

/// Result of a selection pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Nothing is currently relevant.
    Empty,
    /// Relevant events, ascending by sort key.
    Events(Vec<NormalizedEvent>),
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        matches!(self, Selection::Empty)
    }

    pub fn events(&self) -> &[NormalizedEvent] {
        match self {
            Selection::Empty => &[],
            Selection::Events(events) => events,
        }
    }

    pub fn len(&self) -> usize {
        self.events().len()
    }
}

/// Filter and order events against a reference time.
///
/// Events with neither start nor end are dropped. The sort key is the
/// start, else the end, else the reference time. Events with equal keys
/// keep their input order.
pub fn select_visible(
    events: &[NormalizedEvent],
    window: &VisibilityWindow,
    policy: VisibilityPolicy,
) -> Selection {
    let mut keyed: Vec<(DateTime<Local>, &NormalizedEvent)> = events
        .iter()
        .filter(|e| e.start.is_some() || e.end.is_some())
        .filter(|e| window.admits(e, policy))
        .map(|e| (sort_key(e, window.reference_time), e))
        .collect();

    // slice::sort_by_key is stable
    keyed.sort_by_key(|(key, _)| *key);

    if keyed.is_empty() {
        Selection::Empty
    } else {
        Selection::Events(keyed.into_iter().map(|(_, e)| e.clone()).collect())
    }
}

fn sort_key(event: &NormalizedEvent, reference: DateTime<Local>) -> DateTime<Local> {
    event.start.or(event.end).unwrap_or(reference)
}
