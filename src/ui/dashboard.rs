//! Dashboard view rendering.
//!
//! Four animated gauges on the left, each with a sparkline of recent
//! values, and the list of currently relevant events on the right.

use std::time::Instant;

use chrono::Local;
use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Sparkline},
    Frame,
};

use crate::app::App;
use crate::data::{CanonicalMetric, GaugeLevel};

/// Shown when the selection is empty.
pub const NO_EVENTS: &str = "No upcoming events";

/// Render the dashboard view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [gauges_area, events_area] =
        Layout::horizontal([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(area);

    render_gauges(frame, app, gauges_area);
    render_events(frame, app, events_area);
}

fn render_gauges(frame: &mut Frame, app: &App, area: Rect) {
    let now = Instant::now();
    let rows = Layout::vertical([Constraint::Ratio(1, 4); 4]).split(area);

    for (metric, row) in CanonicalMetric::ALL.into_iter().zip(rows.iter()) {
        render_gauge(frame, app, metric, *row, now);
    }
}

fn render_gauge(frame: &mut Frame, app: &App, metric: CanonicalMetric, area: Rect, now: Instant) {
    let value = app.gauge_value(metric, now);
    let level = GaugeLevel::classify(app.gauge_target(metric), metric.is_reversed());
    let color = app.theme.level_color(level);

    let block = Block::default()
        .title(format!(" {} ", metric.label()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [gauge_area, spark_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color))
        .ratio(gauge_ratio(value))
        .label(Span::styled(
            format!("{:.0}%", value),
            app.theme.level_style(level),
        ));
    frame.render_widget(gauge, gauge_area);

    if spark_area.height > 0 {
        let data = app.history.sparkline(metric);
        let sparkline = Sparkline::default()
            .data(&data)
            .max(100)
            .style(Style::default().fg(color).add_modifier(Modifier::DIM));
        frame.render_widget(sparkline, spark_area);
    }
}

/// Fraction of the bar to fill; values outside 0..=100 are clamped here only.
pub fn gauge_ratio(value: f64) -> f64 {
    if value.is_finite() {
        (value / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn render_events(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(format!(" Events ({}) ", app.settings.events.visibility.label()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if app.visible.is_empty() {
        let paragraph = Paragraph::new(NO_EVENTS)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let now = Local::now();
    let items: Vec<ListItem> = app
        .visible
        .events()
        .iter()
        .enumerate()
        .skip(app.event_scroll)
        .map(|(i, event)| {
            let title_style = if i == 0 {
                app.theme.selected
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            let mut lines = vec![Line::from(Span::styled(event.display_title(), title_style))];
            let slot = event.slot_label(now);
            if !slot.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!("  {}", slot),
                    Style::default().fg(app.theme.highlight),
                )));
            }
            if let Some(organizer) = event.organizer.as_deref().filter(|o| !o.is_empty()) {
                lines.push(Line::from(Span::styled(
                    format!("  {}", organizer),
                    Style::default().add_modifier(Modifier::DIM),
                )));
            }
            ListItem::new(lines)
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}
