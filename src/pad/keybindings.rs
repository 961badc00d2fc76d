//! Key bindings — maps key events to pad actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    /// Compile the buffer and show postfix form and result.
    Compile,
    /// Empty the log pane.
    ClearLog,
    Insert(char),
    Backspace,
    Delete,
    Newline,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// Map a key press to an action. Unbound keys yield `None`.
pub fn map_key(key: KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('r') => Some(Action::Compile),
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('l') => Some(Action::ClearLog),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Esc => Some(Action::Quit),
        KeyCode::F(5) => Some(Action::Compile),
        KeyCode::Char(c) => Some(Action::Insert(c)),
        KeyCode::Tab => Some(Action::Insert(' ')),
        KeyCode::Enter => Some(Action::Newline),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Delete => Some(Action::Delete),
        KeyCode::Left => Some(Action::Left),
        KeyCode::Right => Some(Action::Right),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Home => Some(Action::Home),
        KeyCode::End => Some(Action::End),
        _ => None,
    }
}
