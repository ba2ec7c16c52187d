//! Timestamp normalization.
//!
//! Event feeds deliver timestamps in whatever shape the upstream calendar
//! produced them. Everything is folded into a local-zone instant here, or
//! dropped as absent.

use chrono::{DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone};

/// Offset-carrying layouts tried after RFC 3339 fails (order matters: most specific first).
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%z",
];

/// Layouts without an offset; these are local wall-clock times.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp string into a local-zone instant.
///
/// Returns `None` for missing, empty or unparseable input; this function
/// never fails loudly. A trailing `Z` is treated as `+00:00`. Values that
/// carry no offset are read as local time, never as UTC.
pub fn normalize_timestamp(value: Option<&str>) -> Option<DateTime<Local>> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let rewritten = rewrite_utc_marker(trimmed);

    if let Ok(dt) = DateTime::parse_from_rfc3339(&rewritten) {
        return Some(dt.with_timezone(&Local));
    }

    parse_lenient(&rewritten)
}

fn rewrite_utc_marker(s: &str) -> String {
    match s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        Some(head) => format!("{}+00:00", head),
        None => s.to_string(),
    }
}

fn parse_lenient(s: &str) -> Option<DateTime<Local>> {
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_str(s, format) {
            return Some(dt.with_timezone(&Local));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return local_from_naive(naive);
        }
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    local_from_naive(date.and_hms_opt(0, 0, 0)?)
}

/// Interpret a wall-clock time in the local zone.
///
/// Nonexistent times (spring-forward gap) are absent; ambiguous ones
/// (fall-back overlap) resolve to the earlier instant.
pub(crate) fn local_from_naive(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Utc};

    #[test]
    fn test_utc_marker_matches_explicit_offset() {
        let zulu = normalize_timestamp(Some("2024-01-01T10:00:00Z")).unwrap();
        let plus_two = normalize_timestamp(Some("2024-01-01T12:00:00+02:00")).unwrap();
        assert_eq!(zulu, plus_two);
        assert_eq!(zulu.with_timezone(&Utc).hour(), 10);
    }

    #[test]
    fn test_missing_and_empty_are_absent() {
        assert!(normalize_timestamp(None).is_none());
        assert!(normalize_timestamp(Some("")).is_none());
        assert!(normalize_timestamp(Some("   ")).is_none());
    }

    #[test]
    fn test_garbage_is_absent() {
        assert!(normalize_timestamp(Some("tomorrow-ish")).is_none());
        assert!(normalize_timestamp(Some("2024-13-45T99:00:00")).is_none());
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let padded = normalize_timestamp(Some("  2024-01-01T10:00:00Z \n")).unwrap();
        let plain = normalize_timestamp(Some("2024-01-01T10:00:00+00:00")).unwrap();
        assert_eq!(padded, plain);
    }

    #[test]
    fn test_lowercase_z_is_accepted() {
        let lower = normalize_timestamp(Some("2024-01-01T10:00:00z")).unwrap();
        let upper = normalize_timestamp(Some("2024-01-01T10:00:00Z")).unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_naive_value_is_local_wall_time() {
        let dt = normalize_timestamp(Some("2024-06-15T09:30:00")).unwrap();
        let naive = dt.naive_local();
        assert_eq!(naive.hour(), 9);
        assert_eq!(naive.minute(), 30);
    }

    #[test]
    fn test_space_separator_and_short_forms() {
        let spaced = normalize_timestamp(Some("2024-06-15 09:30:00+00:00")).unwrap();
        let compact = normalize_timestamp(Some("2024-06-15T09:30+0000")).unwrap();
        assert_eq!(spaced, compact);

        let minutes_only = normalize_timestamp(Some("2024-06-15 09:30")).unwrap();
        assert_eq!(minutes_only.naive_local().hour(), 9);
    }

    #[test]
    fn test_fractional_seconds() {
        let dt = normalize_timestamp(Some("2024-06-15T09:30:00.250Z")).unwrap();
        assert_eq!(dt.with_timezone(&Utc).nanosecond(), 250_000_000);
    }

    #[test]
    fn test_bare_date_is_local_midnight() {
        let dt = normalize_timestamp(Some("2024-06-15")).unwrap();
        let naive = dt.naive_local();
        assert_eq!(naive.date(), NaiveDate::from_ymd_opt(2024, 6, 15).unwrap());
        assert_eq!(naive.hour(), 0);
        assert_eq!(naive.minute(), 0);
    }
}
