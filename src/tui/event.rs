//! Keyboard event handling for the picker.
//!
//! Maps crossterm keyboard events to picker state changes. Every printable
//! character goes to the query, so navigation uses arrows and Ctrl chords.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::App;
use crate::models::NoteId;

/// What the event loop should do after a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
    Select(NoteId),
}

/// Handles a keyboard event and updates the picker accordingly.
///
/// # Event Handling
///
/// - `Esc`, `Ctrl-c`: quit without a selection
/// - `Enter`: select the highlighted note (ignored when nothing matches)
/// - `Up`/`Ctrl-p`, `Down`/`Ctrl-n`: move the highlight
/// - `Backspace`: delete the last query character
/// - any other character: append to the query
///
/// # Examples
///
/// ```
/// use notes::tui::{App, event::{Action, handle_key_event}};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new(Vec::new());
/// let key = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
/// assert_eq!(handle_key_event(&mut app, key), Action::Quit);
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => return Action::Quit,
        KeyCode::Char('c') if ctrl => return Action::Quit,
        KeyCode::Enter => {
            if let Some(note) = app.selected_note() {
                return Action::Select(note.id.clone());
            }
        }
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        KeyCode::Char('p') if ctrl => app.select_previous(),
        KeyCode::Char('n') if ctrl => app.select_next(),
        KeyCode::Backspace => app.pop_query_char(),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_query_char(c);
        }
        _ => {}
    }

    Action::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Note;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn create_test_app() -> App {
        let notes = ["alpha", "beta", "gamma"]
            .iter()
            .map(|title| Note {
                id: NoteId::new("20240301", title),
                title: title.to_string(),
                tags: Default::default(),
                body: String::new(),
            })
            .collect();
        App::new(notes)
    }

    #[test]
    fn esc_and_ctrl_c_quit() {
        let mut app = create_test_app();
        assert_eq!(handle_key_event(&mut app, key(KeyCode::Esc)), Action::Quit);
        assert_eq!(handle_key_event(&mut app, ctrl('c')), Action::Quit);
    }

    #[test]
    fn q_is_typed_not_quit() {
        let mut app = create_test_app();
        let action = handle_key_event(&mut app, key(KeyCode::Char('q')));

        assert_eq!(action, Action::Continue);
        assert_eq!(app.query(), "q");
    }

    #[test]
    fn shifted_characters_are_typed() {
        let mut app = create_test_app();
        let key = KeyEvent::new(KeyCode::Char('A'), KeyModifiers::SHIFT);
        handle_key_event(&mut app, key);
        assert_eq!(app.query(), "A");
    }

    #[test]
    fn backspace_edits_query() {
        let mut app = create_test_app();
        handle_key_event(&mut app, key(KeyCode::Char('b')));
        handle_key_event(&mut app, key(KeyCode::Char('e')));
        handle_key_event(&mut app, key(KeyCode::Backspace));
        assert_eq!(app.query(), "b");
    }

    #[test]
    fn arrows_and_ctrl_chords_navigate() {
        let mut app = create_test_app();
        assert_eq!(app.selected_index(), Some(0));

        handle_key_event(&mut app, key(KeyCode::Down));
        assert_eq!(app.selected_index(), Some(1));
        handle_key_event(&mut app, ctrl('n'));
        assert_eq!(app.selected_index(), Some(2));
        handle_key_event(&mut app, ctrl('p'));
        assert_eq!(app.selected_index(), Some(1));
        handle_key_event(&mut app, key(KeyCode::Up));
        assert_eq!(app.selected_index(), Some(0));

        // Ctrl chords never reach the query.
        assert_eq!(app.query(), "");
    }

    #[test]
    fn enter_selects_highlighted_note() {
        let mut app = create_test_app();
        handle_key_event(&mut app, key(KeyCode::Down));

        let action = handle_key_event(&mut app, key(KeyCode::Enter));
        assert_eq!(action, Action::Select(NoteId::new("20240301", "beta")));
    }

    #[test]
    fn enter_without_matches_continues() {
        let mut app = create_test_app();
        for c in "zzz".chars() {
            handle_key_event(&mut app, key(KeyCode::Char(c)));
        }

        assert_eq!(handle_key_event(&mut app, key(KeyCode::Enter)), Action::Continue);
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut app = create_test_app();
        assert_eq!(handle_key_event(&mut app, key(KeyCode::F(1))), Action::Continue);
        assert_eq!(handle_key_event(&mut app, ctrl('x')), Action::Continue);
        assert_eq!(app.query(), "");
        assert_eq!(app.selected_index(), Some(0));
    }
}
