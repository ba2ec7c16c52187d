//! Day timeline layout.
//!
//! Events for one day are converted to minute intervals and packed into
//! columns so that overlapping events sit side by side. Packing is greedy
//! first-fit within each overlap group; it does not minimise the number of
//! columns, and callers must not rely on it doing so.

use chrono::{DateTime, Days, Local, NaiveDate, NaiveDateTime, NaiveTime};

use super::event::NormalizedEvent;
use super::timestamp::local_from_naive;

/// Minutes in a day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Shortest interval drawn on the timeline, in minutes.
pub const MIN_DURATION_MINUTES: u32 = 5;

/// An event's extent within a day, in minutes from local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start_minute: u32,
    pub end_minute: u32,
    /// Index of the source event in the slice the interval was built from.
    pub event_ref: usize,
}

impl Interval {
    pub fn new(start_minute: u32, end_minute: u32, event_ref: usize) -> Self {
        Self {
            start_minute,
            end_minute,
            event_ref,
        }
    }

    /// Half-open overlap test.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start_minute < other.end_minute && other.start_minute < self.end_minute
    }
}

/// An interval together with its column placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSlot {
    pub interval: Interval,
    pub column_index: usize,
    /// Columns used by this slot's overlap group (not the whole day).
    pub column_count: usize,
}

/// Local-time bounds of a calendar day: `[midnight, next midnight)`.
pub fn day_bounds(day: NaiveDate) -> Option<(DateTime<Local>, DateTime<Local>)> {
    let start = local_from_naive(day.and_hms_opt(0, 0, 0)?)?;
    let next = day.checked_add_days(Days::new(1))?;
    let end = local_from_naive(next.and_hms_opt(0, 0, 0)?)?;
    Some((start, end))
}

/// Whether an event touches the given day.
///
/// Uses the same rules as [`day_intervals`]: events need a start, a missing
/// end counts as the start.
pub fn overlaps_day(
    event: &NormalizedEvent,
    day_start: DateTime<Local>,
    day_end: DateTime<Local>,
) -> bool {
    let Some(start) = event.start else {
        return false;
    };
    let end = event.end.unwrap_or(start);
    end > day_start && start < day_end
}

/// Clip events to a day and convert them to minute intervals.
///
/// Events without a start are skipped, as are events entirely outside the
/// day. The minimum duration floor extends the end, never the start.
pub fn day_intervals(events: &[NormalizedEvent], day: NaiveDate) -> Vec<Interval> {
    let Some((day_start, day_end)) = day_bounds(day) else {
        return Vec::new();
    };

    events
        .iter()
        .enumerate()
        .filter(|(_, event)| overlaps_day(event, day_start, day_end))
        .filter_map(|(index, event)| {
            let start = event.start?;
            let end = event.end.unwrap_or(start);

            let start_clipped = start.max(day_start);
            let end_clipped = end.min(day_end);

            Some(wall_interval(
                start_clipped.naive_local(),
                end_clipped.naive_local(),
                day,
                index,
            ))
        })
        .collect()
}

/// Build an interval from wall-clock times already clipped to `day`.
///
/// Minutes are read off the local clock face, so a 09:00 event sits at 540
/// on 23- and 25-hour days alike. The start stays in `[0, 1440)`; the end is
/// at most 1440 before the minimum-duration floor is applied.
fn wall_interval(
    start: NaiveDateTime,
    end: NaiveDateTime,
    day: NaiveDate,
    event_ref: usize,
) -> Interval {
    let last_minute = i64::from(MINUTES_PER_DAY) - 1;
    let start_minute = wall_minute(start, day).clamp(0, last_minute) as u32;
    let end_minute = wall_minute(end, day).clamp(0, i64::from(MINUTES_PER_DAY)) as u32;
    Interval::new(
        start_minute,
        end_minute.max(start_minute + MIN_DURATION_MINUTES),
        event_ref,
    )
}

/// Whole minutes between the midnight opening `day` and `time`, floored.
fn wall_minute(time: NaiveDateTime, day: NaiveDate) -> i64 {
    (time - day.and_time(NaiveTime::MIN))
        .num_seconds()
        .div_euclid(60)
}

/// Pack intervals into non-overlapping columns.
///
/// 1. Sort by `(start, end)`; ties keep input order.
/// 2. Split into maximal overlap groups: a group closes once an interval
///    starts after the running maximum end.
/// 3. Within a group, place each interval in the first column whose last
///    end is at or before its start, opening a new column otherwise.
/// 4. Every slot in a group reports the group's column count.
///
/// Slots are returned in sorted order. Never fails; empty in, empty out.
pub fn layout_intervals(intervals: &[Interval]) -> Vec<LayoutSlot> {
    let mut sorted = intervals.to_vec();
    sorted.sort_by_key(|iv| (iv.start_minute, iv.end_minute));

    let mut slots = Vec::with_capacity(sorted.len());
    for group in overlap_groups(&sorted) {
        pack_group(group, &mut slots);
    }
    slots
}

fn overlap_groups(sorted: &[Interval]) -> Vec<&[Interval]> {
    let mut groups = Vec::new();
    let mut group_start = 0;
    let mut running_end: Option<u32> = None;

    for (i, iv) in sorted.iter().enumerate() {
        match running_end {
            Some(end) if iv.start_minute <= end => {
                running_end = Some(end.max(iv.end_minute));
            }
            _ => {
                if i > group_start {
                    groups.push(&sorted[group_start..i]);
                }
                group_start = i;
                running_end = Some(iv.end_minute);
            }
        }
    }
    if group_start < sorted.len() {
        groups.push(&sorted[group_start..]);
    }
    groups
}

fn pack_group(group: &[Interval], slots: &mut Vec<LayoutSlot>) {
    let base = slots.len();
    // last assigned end per column
    let mut columns: Vec<u32> = Vec::new();

    for iv in group {
        let free = columns.iter().position(|&last_end| last_end <= iv.start_minute);
        let column_index = match free {
            Some(ci) => {
                columns[ci] = iv.end_minute;
                ci
            }
            None => {
                columns.push(iv.end_minute);
                columns.len() - 1
            }
        };
        slots.push(LayoutSlot {
            interval: *iv,
            column_index,
            column_count: 0,
        });
    }

    let column_count = columns.len();
    for slot in &mut slots[base..] {
        slot.column_count = column_count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, d, h, m, 0).unwrap()
    }

    fn event(start: Option<DateTime<Local>>, end: Option<DateTime<Local>>) -> NormalizedEvent {
        NormalizedEvent {
            title: None,
            start,
            end,
            location: None,
            organizer: None,
            extra: BTreeMap::new(),
        }
    }

    /// Maximum number of intervals covering any single minute.
    fn max_depth(intervals: &[Interval]) -> usize {
        let mut points: Vec<u32> = intervals.iter().map(|iv| iv.start_minute).collect();
        points.sort_unstable();
        points
            .iter()
            .map(|&p| {
                intervals
                    .iter()
                    .filter(|iv| iv.start_minute <= p && p < iv.end_minute)
                    .count()
            })
            .max()
            .unwrap_or(0)
    }

    fn assert_no_shared_columns(slots: &[LayoutSlot]) {
        for (i, a) in slots.iter().enumerate() {
            for b in &slots[i + 1..] {
                if a.interval.overlaps(&b.interval) {
                    assert_ne!(
                        a.column_index, b.column_index,
                        "{:?} and {:?} overlap but share a column",
                        a, b
                    );
                }
            }
        }
    }

    #[test]
    fn test_standup_and_review_get_two_columns() {
        let events = vec![
            event(Some(at(20, 9, 0)), Some(at(20, 9, 30))),
            event(Some(at(20, 9, 15)), Some(at(20, 9, 45))),
        ];
        let intervals = day_intervals(&events, day());
        assert_eq!(
            intervals,
            vec![Interval::new(540, 570, 0), Interval::new(555, 585, 1)]
        );

        let slots = layout_intervals(&intervals);
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].interval.event_ref, 0);
        assert_eq!(slots[0].column_index, 0);
        assert_eq!(slots[1].interval.event_ref, 1);
        assert_eq!(slots[1].column_index, 1);
        assert!(slots.iter().all(|s| s.column_count == 2));
    }

    #[test]
    fn test_empty_input() {
        assert!(layout_intervals(&[]).is_empty());
        assert!(day_intervals(&[], day()).is_empty());
    }

    #[test]
    fn test_column_count_is_per_group() {
        let intervals = vec![
            Interval::new(60, 120, 0),
            Interval::new(90, 150, 1),
            Interval::new(600, 660, 2),
        ];
        let slots = layout_intervals(&intervals);
        assert_eq!(slots[0].column_count, 2);
        assert_eq!(slots[1].column_count, 2);
        assert_eq!(slots[2].column_count, 1);
        assert_eq!(slots[2].column_index, 0);
    }

    #[test]
    fn test_touching_intervals_share_group_but_reuse_column() {
        // start == running end joins the group, but the column is free again
        let intervals = vec![Interval::new(60, 120, 0), Interval::new(120, 180, 1)];
        let slots = layout_intervals(&intervals);
        assert_eq!(slots[0].column_index, 0);
        assert_eq!(slots[1].column_index, 0);
        assert!(slots.iter().all(|s| s.column_count == 1));
    }

    #[test]
    fn test_first_fit_reuses_earliest_free_column() {
        let intervals = vec![
            Interval::new(0, 100, 0),
            Interval::new(10, 30, 1),
            Interval::new(20, 40, 2),
            Interval::new(35, 50, 3),
        ];
        let slots = layout_intervals(&intervals);
        let columns: Vec<_> = slots
            .iter()
            .map(|s| (s.interval.event_ref, s.column_index))
            .collect();
        assert_eq!(columns, vec![(0, 0), (1, 1), (2, 2), (3, 1)]);
        assert!(slots.iter().all(|s| s.column_count == 3));
    }

    #[test]
    fn test_ties_resolve_by_input_order() {
        let intervals = vec![
            Interval::new(30, 60, 7),
            Interval::new(30, 60, 3),
            Interval::new(0, 60, 5),
        ];
        let slots = layout_intervals(&intervals);
        let order: Vec<_> = slots.iter().map(|s| s.interval.event_ref).collect();
        assert_eq!(order, vec![5, 7, 3]);
        let columns: Vec<_> = slots.iter().map(|s| s.column_index).collect();
        assert_eq!(columns, vec![0, 1, 2]);
    }

    #[test]
    fn test_no_overlapping_intervals_share_a_column() {
        let intervals: Vec<Interval> = (0..40u32)
            .map(|i| {
                let start = (i * 37) % 1200;
                let length = 5 + (i * 53) % 180;
                Interval::new(start, start + length, i as usize)
            })
            .collect();

        let slots = layout_intervals(&intervals);
        assert_eq!(slots.len(), intervals.len());
        assert_no_shared_columns(&slots);
    }

    #[test]
    fn test_column_count_covers_overlap_depth() {
        let intervals: Vec<Interval> = (0..30u32)
            .map(|i| {
                let start = (i * 71) % 900;
                Interval::new(start, start + 30 + (i * 17) % 120, i as usize)
            })
            .collect();
        let slots = layout_intervals(&intervals);

        for slot in &slots {
            // everything covering this slot's start overlaps it, so shares its group
            let covering: Vec<Interval> = slots
                .iter()
                .map(|s| s.interval)
                .filter(|iv| iv.overlaps(&slot.interval))
                .collect();
            assert!(slot.column_count >= max_depth(&covering));
            assert!(slot.column_index < slot.column_count);
        }
    }

    #[test]
    fn test_day_clipping_and_minimum_duration() {
        let events = vec![
            // starts the day before, ends 01:00
            event(Some(at(19, 22, 0)), Some(at(20, 1, 0))),
            // runs past midnight
            event(Some(at(20, 23, 0)), Some(at(21, 2, 0))),
            // no end: floored to five minutes
            event(Some(at(20, 12, 0)), None),
            // no start: skipped
            event(None, Some(at(20, 12, 0))),
            // entirely on another day
            event(Some(at(21, 9, 0)), Some(at(21, 10, 0))),
            // ends exactly at midnight: does not touch the day
            event(Some(at(19, 23, 0)), Some(at(20, 0, 0))),
        ];
        let intervals = day_intervals(&events, day());
        assert_eq!(
            intervals,
            vec![
                Interval::new(0, 60, 0),
                Interval::new(23 * 60, MINUTES_PER_DAY, 1),
                Interval::new(720, 725, 2),
            ]
        );
        assert!(intervals
            .iter()
            .all(|iv| iv.end_minute >= iv.start_minute + MIN_DURATION_MINUTES));
    }

    #[test]
    fn test_end_before_start_is_floored() {
        let events = vec![event(Some(at(20, 10, 0)), Some(at(20, 9, 0)))];
        // the reversed event still has to overlap the day to be laid out
        let intervals = day_intervals(&events, day());
        assert_eq!(intervals, vec![Interval::new(600, 605, 0)]);
    }

    #[test]
    fn test_overlaps_is_half_open() {
        let a = Interval::new(0, 10, 0);
        let b = Interval::new(10, 20, 1);
        let c = Interval::new(5, 15, 2);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    fn wall(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, d)
            .and_then(|date| date.and_hms_opt(h, m, 0))
            .unwrap()
    }

    #[test]
    fn test_minutes_follow_the_clock_face() {
        // 2024-10-27 is 25 hours long in much of Europe; 23:00 is still minute 1380
        let fall_back = NaiveDate::from_ymd_opt(2024, 10, 27).unwrap();
        assert_eq!(wall_minute(wall(27, 23, 0), fall_back), 1380);
        assert_eq!(
            wall_interval(wall(27, 23, 0), wall(27, 23, 30), fall_back, 0),
            Interval::new(1380, 1410, 0)
        );

        // a 23-hour day keeps 09:00 at 540
        let spring_forward = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let nine = spring_forward.and_hms_opt(9, 0, 0).unwrap();
        assert_eq!(wall_minute(nine, spring_forward), 540);
    }

    #[test]
    fn test_wall_interval_stays_inside_the_day() {
        let day = NaiveDate::from_ymd_opt(2024, 10, 27).unwrap();

        // clipped end lands on the next midnight
        let late = wall_interval(wall(27, 22, 0), wall(28, 0, 0), day, 0);
        assert_eq!(late, Interval::new(1320, MINUTES_PER_DAY, 0));

        // out-of-range wall times are pinned, the floor extends only the end
        let stray = wall_interval(wall(28, 0, 30), wall(28, 0, 40), day, 1);
        assert_eq!(stray.start_minute, MINUTES_PER_DAY - 1);
        assert_eq!(stray.end_minute, MINUTES_PER_DAY - 1 + MIN_DURATION_MINUTES);

        let early = wall_interval(wall(26, 23, 0), wall(27, 0, 20), day, 2);
        assert_eq!(early, Interval::new(0, 20, 2));
    }

    #[test]
    fn test_wall_minute_floors_seconds() {
        let day = NaiveDate::from_ymd_opt(2024, 10, 27).unwrap();
        let time = day.and_hms_opt(9, 30, 59).unwrap();
        assert_eq!(wall_minute(time, day), 570);
        let before = NaiveDate::from_ymd_opt(2024, 10, 26)
            .and_then(|d| d.and_hms_opt(23, 59, 30))
            .unwrap();
        assert_eq!(wall_minute(before, day), -1);
    }
}
