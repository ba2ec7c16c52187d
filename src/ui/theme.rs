//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::GaugeLevel;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    pub warning: Color,
    pub critical: Color,
    pub healthy: Color,
    /// Color for borders, hour rules and separators.
    pub border: Color,
    /// Current-time marker on the schedule.
    pub now_line: Color,
    /// Fill colours for timeline columns, cycled by column index.
    pub event_fills: [Color; 4],
    pub header: Style,
    /// Style for the first (next) entry of the event list.
    pub selected: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub border_type: BorderType,
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            now_line: Color::LightRed,
            event_fills: [Color::Blue, Color::Magenta, Color::Cyan, Color::Green],
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            now_line: Color::Red,
            event_fills: [
                Color::LightBlue,
                Color::LightMagenta,
                Color::LightCyan,
                Color::LightGreen,
            ],
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Colour of a gauge in the given band.
    pub fn level_color(&self, level: GaugeLevel) -> Color {
        match level {
            GaugeLevel::Good => self.healthy,
            GaugeLevel::Warning => self.warning,
            GaugeLevel::Critical => self.critical,
        }
    }

    pub fn level_style(&self, level: GaugeLevel) -> Style {
        match level {
            GaugeLevel::Critical => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
            other => Style::default().fg(self.level_color(other)),
        }
    }

    /// Fill colour for a timeline column.
    pub fn event_fill(&self, column_index: usize) -> Color {
        self.event_fills[column_index % self.event_fills.len()]
    }
}
