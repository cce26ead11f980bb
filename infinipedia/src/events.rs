//! Event handling for the encyclopedia TUI

use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode};

/// Result of handling an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
    NeedsRedraw,
}

/// Handle a terminal event
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> EventResult {
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_up(3);
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.scroll_down(3);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return EventResult::Quit;
    }

    if app.has_overlay() {
        return handle_overlay_key(app, key);
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Insert => handle_insert_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
    }
}

fn handle_overlay_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Enter => {
            app.close_overlay();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

/// Keys in NORMAL mode: reading, link selection and settings hotkeys
fn handle_normal_mode(app: &mut App, key: KeyEvent) -> EventResult {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('/') | KeyCode::Char('i') => app.enter_insert_mode(),
        KeyCode::Char(':') => app.enter_command_mode(),
        KeyCode::Char('?') | KeyCode::F(1) => app.toggle_help(),
        KeyCode::Char('q') => return EventResult::Quit,

        // Reading
        KeyCode::Char('u') if ctrl => app.scroll_up(10),
        KeyCode::Char('d') if ctrl => app.scroll_down(10),
        KeyCode::PageUp => app.scroll_up(10),
        KeyCode::PageDown | KeyCode::Char(' ') => app.scroll_down(10),
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(1),
        KeyCode::Char('g') | KeyCode::Home => app.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),

        // Links
        KeyCode::Tab | KeyCode::Char('n') => app.select_next(),
        KeyCode::BackTab | KeyCode::Char('N') => app.select_prev(),
        KeyCode::Enter => app.activate_selection(),
        KeyCode::Esc => app.selected = None,

        // History
        KeyCode::Char('h') | KeyCode::Left | KeyCode::Backspace => app.back(),
        KeyCode::Char('l') | KeyCode::Right => app.forward(),
        KeyCode::Char('H') => app.home(),
        KeyCode::Char('r') if app.page.is_none() => app.refresh_topics(),

        // Settings
        KeyCode::Char('s') => app.cycle_style(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_sections(1),
        KeyCode::Char('-') => app.adjust_sections(-1),
        KeyCode::Char('D') => app.toggle_dark_mode(),

        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

/// Keys in INSERT mode: typing a search
fn handle_insert_mode(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => app.enter_normal_mode(),
        KeyCode::Enter => {
            if let Some(query) = app.submit_input() {
                app.search(&query);
            }
            app.enter_normal_mode();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.enter_insert_mode();
        }
        KeyCode::Char(c) => app.type_char(c),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),
        KeyCode::Up => app.history_prev(),
        KeyCode::Down => app.history_next(),
        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}

/// Keys in COMMAND mode: editing a `:` command
fn handle_command_mode(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => app.enter_normal_mode(),
        KeyCode::Enter => {
            let command = app.submit_input().unwrap_or_default();
            app.enter_normal_mode();
            if app.process_command(&command) {
                return EventResult::Quit;
            }
        }
        KeyCode::Backspace => {
            // Deleting the leading ':' leaves command mode
            if app.cursor_position() <= 1 && app.input_buffer().len() <= 1 {
                app.enter_normal_mode();
            } else if app.cursor_position() > 1 {
                app.backspace();
            }
        }
        KeyCode::Char(c) => app.type_char(c),
        KeyCode::Delete => app.delete(),
        KeyCode::Left if app.cursor_position() > 1 => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        _ => return EventResult::Continue,
    }
    EventResult::NeedsRedraw
}
