//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use chrono::{DateTime, Local};
use chrono_tz::Tz;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::source::PollState;

/// Render the header bar: clocks, poll state and data age.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let now = Local::now();
    let clocks = &app.settings.clocks;

    let (state_icon, state_style) = match (app.poll_state(), &app.last_error) {
        (PollState::Stopped, _) => ("○", Style::default().add_modifier(Modifier::DIM)),
        (_, Some(_)) => ("●", Style::default().fg(app.theme.critical)),
        (PollState::Fetching, None) => ("●", Style::default().fg(app.theme.warning)),
        _ => ("●", Style::default().fg(app.theme.healthy)),
    };

    let line = Line::from(vec![
        Span::styled(format!(" {} ", state_icon), state_style),
        Span::styled("STATUSDECK ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(
            now.format("%H:%M:%S").to_string(),
            Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" local  "),
        Span::raw(zone_clock(now, clocks.second_zone)),
        Span::raw(format!(" {} │ ", clocks.second_label)),
        Span::raw(now.format("%a %d %b %Y").to_string()),
        Span::raw(" │ "),
        Span::styled(app.poll_state().label(), state_style),
        Span::raw(" │ "),
        Span::raw(update_age(app.last_update, now)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// `HH:MM:SS` of `now` as seen in `zone`.
pub fn zone_clock(now: DateTime<Local>, zone: Tz) -> String {
    now.with_timezone(&zone).format("%H:%M:%S").to_string()
}

/// "updated 3s ago", or "no data yet".
pub fn update_age(last_update: Option<DateTime<Local>>, now: DateTime<Local>) -> String {
    let Some(at) = last_update else {
        return "no data yet".to_string();
    };
    let secs = (now - at).num_seconds().max(0);
    if secs < 60 {
        format!("updated {}s ago", secs)
    } else if secs < 3600 {
        format!("updated {}m ago", secs / 60)
    } else {
        format!("updated {}h ago", secs / 3600)
    }
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![Line::from(" 1:Dashboard "), Line::from(" 2:Schedule ")];

    let selected = match app.current_view {
        View::Dashboard => 0,
        View::Schedule => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows the source, the last fetch error if any, and the controls for
/// the current view. Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Dashboard => "↑↓:scroll Tab:switch r:refresh ?:help q:quit",
        View::Schedule => "[/]:day t:today ↑↓:scroll r:refetch ?:help q:quit",
    };

    let status = match &app.last_error {
        Some(err) => format!(" {} | Error: {} | {}", app.source_description(), err, controls),
        None => format!(" {} | {}", app.source_description(), controls),
    };

    let style = if app.last_error.is_some() {
        Style::default().fg(app.theme.warning)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    frame.render_widget(Paragraph::new(status).style(style), area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  Tab / 1 / 2  Switch views"),
        Line::from("  ↑/↓ j/k      Scroll"),
        Line::from(""),
        section(" Schedule"),
        Line::from("  [ / ←        Previous day"),
        Line::from("  ] / →        Next day"),
        Line::from("  t            Today"),
        Line::from("  r            Refetch day"),
        Line::from(""),
        section(" General"),
        Line::from("  r            Refresh (dashboard)"),
        Line::from("  ?            Toggle help"),
        Line::from("  q            Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 21u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
