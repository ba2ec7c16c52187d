//! Normalized event model.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde_json::Value;

use super::timestamp::normalize_timestamp;
use crate::source::RawEvent;

/// Placeholder shown for events that arrive without a title.
pub const UNTITLED: &str = "(No title)";

/// An event whose timestamps have been parsed into local instants.
///
/// At least one of `start` and `end` is always present; records where
/// both fail to parse never become a `NormalizedEvent`.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub title: Option<String>,
    pub start: Option<DateTime<Local>>,
    pub end: Option<DateTime<Local>>,
    pub location: Option<String>,
    pub organizer: Option<String>,
    /// Unrecognised fields carried through from the raw record.
    pub extra: BTreeMap<String, Value>,
}

impl NormalizedEvent {
    /// Normalize a raw record, returning `None` when neither timestamp parses.
    pub fn from_raw(raw: &RawEvent) -> Option<Self> {
        let start = normalize_timestamp(raw.from.as_deref());
        let end = normalize_timestamp(raw.to.as_deref());
        if start.is_none() && end.is_none() {
            return None;
        }

        Some(Self {
            title: raw.title.clone(),
            start,
            end,
            location: raw.location.clone(),
            organizer: raw.organizer.clone(),
            extra: raw.extra.clone(),
        })
    }

    /// Title for display, falling back to a placeholder.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => UNTITLED,
        }
    }

    /// Human-readable time slot, e.g. `Today 16:30-18:00 · Room 4`.
    ///
    /// Events on other days show the weekday and date instead of "Today".
    /// Returns an empty string when the event has no start.
    pub fn slot_label(&self, now: DateTime<Local>) -> String {
        let Some(start) = self.start else {
            return String::new();
        };

        let date_part = if start.date_naive() == now.date_naive() {
            "Today".to_string()
        } else {
            start.format("%a, %d %b").to_string()
        };
        let time_part = start.format("%H:%M");
        let location_part = match self.location.as_deref() {
            Some(loc) if !loc.is_empty() => format!(" · {}", loc),
            _ => String::new(),
        };

        match self.end {
            Some(end) => format!(
                "{} {}-{}{}",
                date_part,
                time_part,
                end.format("%H:%M"),
                location_part
            ),
            None => format!("{} {}{}", date_part, time_part, location_part),
        }
    }
}

/// Normalize a batch of raw records, silently dropping the unusable ones.
///
/// Input order is preserved.
pub fn normalize_events(raw: &[RawEvent]) -> Vec<NormalizedEvent> {
    raw.iter().filter_map(NormalizedEvent::from_raw).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(title: &str, from: Option<&str>, to: Option<&str>) -> RawEvent {
        RawEvent {
            title: Some(title.to_string()),
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            ..Default::default()
        }
    }

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_both_timestamps_unparseable_is_dropped() {
        let event = raw("Broken", Some("nope"), Some(""));
        assert!(NormalizedEvent::from_raw(&event).is_none());
    }

    #[test]
    fn test_single_timestamp_is_kept() {
        let event = raw("Deadline", None, Some("2024-03-01T17:00:00"));
        let normalized = NormalizedEvent::from_raw(&event).unwrap();
        assert!(normalized.start.is_none());
        assert_eq!(normalized.end, Some(local(2024, 3, 1, 17, 0)));
    }

    #[test]
    fn test_normalize_events_preserves_order() {
        let events = vec![
            raw("A", Some("2024-03-01T10:00:00"), None),
            raw("skip", None, None),
            raw("B", Some("2024-03-01T09:00:00"), None),
        ];
        let normalized = normalize_events(&events);
        let titles: Vec<_> = normalized.iter().map(|e| e.display_title()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_display_title_placeholder() {
        let mut event = NormalizedEvent::from_raw(&raw("", Some("2024-03-01T10:00:00"), None))
            .unwrap();
        assert_eq!(event.display_title(), UNTITLED);
        event.title = None;
        assert_eq!(event.display_title(), UNTITLED);
    }

    #[test]
    fn test_slot_label_today_with_range_and_location() {
        let mut event = NormalizedEvent::from_raw(&raw(
            "Sync",
            Some("2024-03-01T16:30:00"),
            Some("2024-03-01T18:00:00"),
        ))
        .unwrap();
        event.location = Some("Room 4".to_string());

        let now = local(2024, 3, 1, 8, 0);
        assert_eq!(event.slot_label(now), "Today 16:30-18:00 · Room 4");
    }

    #[test]
    fn test_slot_label_other_day_without_end() {
        let event =
            NormalizedEvent::from_raw(&raw("Trip", Some("2024-02-05T07:15:00"), None)).unwrap();
        let now = local(2024, 3, 1, 8, 0);
        assert_eq!(event.slot_label(now), "Mon, 05 Feb 07:15");
    }

    #[test]
    fn test_slot_label_without_start_is_empty() {
        let event =
            NormalizedEvent::from_raw(&raw("Due", None, Some("2024-03-01T17:00:00"))).unwrap();
        assert_eq!(event.slot_label(local(2024, 3, 1, 8, 0)), "");
    }
}
