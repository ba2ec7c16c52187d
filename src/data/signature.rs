//! Change detection for event feeds.
//!
//! The dashboard re-renders its event list and schedule only when the
//! content actually changed. Each feed keeps the signature of the last
//! payload it accepted.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use serde_json::Value;

use crate::source::RawEvent;

/// Order-sensitive fingerprint of an event list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentSignature(u64);

impl ContentSignature {
    /// Fingerprint the given events.
    ///
    /// Fields are hashed in a fixed order with unrecognised keys sorted, so
    /// payloads that differ only in JSON key order hash the same. Reordering
    /// the events themselves changes the signature.
    pub fn of(events: &[RawEvent]) -> Self {
        let mut hasher = DefaultHasher::new();
        events.len().hash(&mut hasher);
        for event in events {
            hash_event(event, &mut hasher);
        }
        Self(hasher.finish())
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

fn hash_event(event: &RawEvent, hasher: &mut DefaultHasher) {
    event.title.hash(hasher);
    event.from.hash(hasher);
    event.to.hash(hasher);
    event.location.hash(hasher);
    event.organizer.hash(hasher);
    // BTreeMap iterates in key order
    event.extra.len().hash(hasher);
    for (key, value) in &event.extra {
        key.hash(hasher);
        canonical_json(value).hash(hasher);
    }
}

/// Serialize a JSON value with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Independent consumers of the event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feed {
    /// The dashboard's upcoming-events list.
    EventList,
    /// The day-schedule timeline.
    Schedule,
}

/// Outcome of comparing a payload against the last one seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Changed,
    Unchanged,
}

impl Change {
    pub fn is_changed(&self) -> bool {
        matches!(self, Change::Changed)
    }
}

/// Per-feed record of the last accepted signature.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last: HashMap<Feed, ContentSignature>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `signature` with the feed's previous one and remember it.
    ///
    /// The first observation on a feed is always a change.
    pub fn observe(&mut self, feed: Feed, signature: ContentSignature) -> Change {
        match self.last.insert(feed, signature) {
            Some(previous) if previous == signature => Change::Unchanged,
            _ => Change::Changed,
        }
    }

    /// Forget a feed so its next observation counts as a change.
    pub fn reset(&mut self, feed: Feed) {
        self.last.remove(&feed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(title: &str, from: &str) -> RawEvent {
        RawEvent {
            title: Some(title.to_string()),
            from: Some(from.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_identical_payload_is_unchanged() {
        let events = vec![event("Standup", "2024-05-20T09:00:00")];
        let mut detector = ChangeDetector::new();

        assert_eq!(
            detector.observe(Feed::EventList, ContentSignature::of(&events)),
            Change::Changed
        );
        assert_eq!(
            detector.observe(Feed::EventList, ContentSignature::of(&events.clone())),
            Change::Unchanged
        );
    }

    #[test]
    fn test_feeds_are_independent() {
        let events = vec![event("Standup", "2024-05-20T09:00:00")];
        let signature = ContentSignature::of(&events);
        let mut detector = ChangeDetector::new();

        assert!(detector.observe(Feed::EventList, signature).is_changed());
        // schedule has not seen anything yet
        assert!(detector.observe(Feed::Schedule, signature).is_changed());
        assert!(!detector.observe(Feed::Schedule, signature).is_changed());
    }

    #[test]
    fn test_reordering_events_is_a_change() {
        let a = event("A", "2024-05-20T09:00:00");
        let b = event("B", "2024-05-20T10:00:00");
        let forward = ContentSignature::of(&[a.clone(), b.clone()]);
        let backward = ContentSignature::of(&[b, a]);
        assert_ne!(forward, backward);
    }

    #[test]
    fn test_field_edit_is_a_change() {
        let before = vec![event("Review", "2024-05-20T09:15:00")];
        let mut after = before.clone();
        after[0].location = Some("Room 2".to_string());
        assert_ne!(ContentSignature::of(&before), ContentSignature::of(&after));
    }

    #[test]
    fn test_extra_key_order_is_ignored() {
        let one: RawEvent = serde_json::from_value(json!({
            "title": "Sync",
            "meta": {"a": 1, "b": [1, 2]},
            "colour": "blue"
        }))
        .unwrap();
        let two: RawEvent = serde_json::from_value(json!({
            "colour": "blue",
            "meta": {"b": [1, 2], "a": 1},
            "title": "Sync"
        }))
        .unwrap();
        assert_eq!(ContentSignature::of(&[one]), ContentSignature::of(&[two]));
    }

    #[test]
    fn test_reset_forces_change() {
        let signature = ContentSignature::of(&[]);
        let mut detector = ChangeDetector::new();
        detector.observe(Feed::Schedule, signature);
        detector.reset(Feed::Schedule);
        assert!(detector.observe(Feed::Schedule, signature).is_changed());
    }

    #[test]
    fn test_canonical_json_sorts_nested_keys() {
        let value = json!({"z": {"y": 1, "x": [true, null]}, "a": "s"});
        assert_eq!(canonical_json(&value), r#"{"a":"s","z":{"x":[true,null],"y":1}}"#);
    }
}
