//! Schedule view rendering.
//!
//! One day as hour rows, with each event drawn as a block in its layout
//! column. Overlapping events split the width of their group.

use chrono::{Local, Timelike};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::LayoutSlot;
use crate::source::DayOrigin;

/// Terminal rows per hour; one row covers half an hour.
pub const ROWS_PER_HOUR: u16 = 2;

const MINUTES_PER_ROW: u32 = 60 / ROWS_PER_HOUR as u32;

/// Width of the "HH:00 " gutter.
const GUTTER: u16 = 6;

/// Render the schedule view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [title_area, body_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(area);

    render_title(frame, app, title_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(body_area);
    frame.render_widget(block, body_area);

    render_hours(frame, app, inner);

    let events_area = Rect {
        x: inner.x + GUTTER,
        width: inner.width.saturating_sub(GUTTER),
        ..inner
    };
    for slot in &app.schedule.slots {
        if let Some(rect) = slot_rect(slot, events_area, app.schedule.first_hour) {
            render_slot(frame, app, slot, rect);
        }
    }

    render_now_line(frame, app, inner);
}

fn render_title(frame: &mut Frame, app: &App, area: Rect) {
    let schedule = &app.schedule;
    let (origin_text, origin_style) = if schedule.is_loading() {
        ("loading…".to_string(), Style::default().fg(app.theme.warning))
    } else {
        match schedule.origin {
            Some(DayOrigin::Remote) => (
                "remote".to_string(),
                Style::default().fg(app.theme.healthy),
            ),
            Some(DayOrigin::Fallback) => {
                let reason = schedule
                    .error
                    .as_ref()
                    .map(|e| format!("cached ({})", e))
                    .unwrap_or_else(|| "cached".to_string());
                (reason, Style::default().fg(app.theme.warning))
            }
            None => ("not loaded".to_string(), Style::default().add_modifier(Modifier::DIM)),
        }
    };

    let today = Local::now().date_naive();
    let day_label = if schedule.date == today {
        format!("Today, {}", schedule.date.format("%a %d %b %Y"))
    } else {
        schedule.date.format("%a %d %b %Y").to_string()
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", day_label), app.theme.header),
        Span::raw("│ "),
        Span::styled(origin_text, origin_style),
        Span::raw(format!(" │ {} events", schedule.events.len())),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn render_hours(frame: &mut Frame, app: &App, area: Rect) {
    let rule_style = Style::default().fg(app.theme.border).add_modifier(Modifier::DIM);
    let mut hour = app.schedule.first_hour;
    let mut y = area.y;

    while hour < 24 && y < area.bottom() {
        let label = Span::styled(format!("{:02}:00 ", hour), Style::default().fg(app.theme.border));
        let rule = Span::styled(
            "┈".repeat(area.width.saturating_sub(GUTTER) as usize),
            rule_style,
        );
        frame.render_widget(
            Paragraph::new(Line::from(vec![label, rule])),
            Rect::new(area.x, y, area.width, 1),
        );
        hour += 1;
        y = y.saturating_add(ROWS_PER_HOUR);
    }
}

fn render_slot(frame: &mut Frame, app: &App, slot: &LayoutSlot, rect: Rect) {
    let Some(event) = app.schedule.events.get(slot.interval.event_ref) else {
        return;
    };

    let fill = app.theme.event_fill(slot.column_index);
    let mut lines = vec![Line::from(Span::styled(
        event.display_title(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    if rect.height > 1 {
        lines.push(Line::from(format!(
            "{}-{}",
            minute_label(slot.interval.start_minute),
            minute_label(slot.interval.end_minute)
        )));
    }
    if rect.height > 2 {
        if let Some(location) = event.location.as_deref() {
            lines.push(Line::from(location.to_string()));
        }
    }

    let paragraph = Paragraph::new(lines).style(Style::default().bg(fill).fg(Color::Black));
    frame.render_widget(paragraph, rect);
}

fn render_now_line(frame: &mut Frame, app: &App, area: Rect) {
    let now = Local::now();
    if now.date_naive() != app.schedule.date {
        return;
    }
    let minute = now.hour() * 60 + now.minute();
    let Some(row) = minute_row(minute, app.schedule.first_hour) else {
        return;
    };
    let y = area.y + row;
    if y >= area.bottom() {
        return;
    }
    let marker = Span::styled(
        "─".repeat(area.width.saturating_sub(GUTTER) as usize),
        Style::default().fg(app.theme.now_line),
    );
    frame.render_widget(
        Paragraph::new(Line::from(marker)),
        Rect::new(area.x + GUTTER, y, area.width.saturating_sub(GUTTER), 1),
    );
}

/// Row offset of `minute` below the first visible hour, if it is not above it.
fn minute_row(minute: u32, first_hour: u32) -> Option<u16> {
    let offset = minute.checked_sub(first_hour * 60)?;
    u16::try_from(offset / MINUTES_PER_ROW).ok()
}

/// `HH:MM` for a minute offset; 1440 and beyond read as 24:00.
fn minute_label(minute: u32) -> String {
    if minute >= 24 * 60 {
        return "24:00".to_string();
    }
    format!("{:02}:{:02}", minute / 60, minute % 60)
}

/// Screen rectangle for a laid-out slot, clipped to `area`.
///
/// Returns `None` when the slot lies entirely above the first visible hour
/// or below the bottom of the area.
pub fn slot_rect(slot: &LayoutSlot, area: Rect, first_hour: u32) -> Option<Rect> {
    let column_count = slot.column_count.max(1) as u16;
    let column_width = area.width / column_count;
    if column_width == 0 {
        return None;
    }

    let top_minute = first_hour * 60;
    if slot.interval.end_minute <= top_minute {
        return None;
    }
    let start = slot.interval.start_minute.max(top_minute);
    let row = minute_row(start, first_hour)?;
    let end_row = (slot.interval.end_minute - top_minute).div_ceil(MINUTES_PER_ROW);
    let height = u16::try_from(end_row).ok()?.saturating_sub(row).max(1);

    let y = area.y.checked_add(row)?;
    if y >= area.bottom() {
        return None;
    }

    let x = area.x + column_width * slot.column_index as u16;
    Some(Rect {
        x,
        y,
        // leave a one-cell gap between columns
        width: column_width.saturating_sub(1).max(1),
        height: height.min(area.bottom() - y),
    })
}
