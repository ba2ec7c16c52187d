use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab | KeyCode::BackTab => app.next_view(),
        KeyCode::Char('1') => app.set_view(View::Dashboard),
        KeyCode::Char('2') => app.set_view(View::Schedule),

        KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),

        // Day navigation (schedule only)
        KeyCode::Char('[') | KeyCode::Left if app.current_view == View::Schedule => app.prev_day(),
        KeyCode::Char(']') | KeyCode::Right if app.current_view == View::Schedule => app.next_day(),
        KeyCode::Char('t') if app.current_view == View::Schedule => app.today(),

        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(),
        MouseEventKind::ScrollDown => app.scroll_down(),

        // Tab bar is row 1, after the header
        MouseEventKind::Down(MouseButton::Left) if mouse.row == 1 => {
            // " 1:Dashboard " is 13 columns, then the divider
            if mouse.column < 14 {
                app.set_view(View::Dashboard);
            } else if mouse.column < 27 {
                app.set_view(View::Schedule);
            }
        }

        _ => {}
    }
}
