//! Interactive note picker for the `search` command.
//!
//! A full-screen fuzzy finder over notes using ratatui for rendering and
//! crossterm for terminal management.

use std::io;
use std::panic;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::models::{Note, NoteId};

mod app;
pub mod event;
mod ui;

pub use app::{App, fuzzy_score};
use event::Action;

/// Enables raw mode and enters the alternate screen.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Disables raw mode and leaves the alternate screen.
///
/// Must run before returning to the caller, on success and on error alike,
/// since the caller may start an editor on the same terminal.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Terminal restoration for the panic hook, where no `Terminal` is at hand.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal, then defers to the
/// previous hook.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Runs the picker until the user selects a note or quits.
///
/// Terminal state is always restored, even on error.
pub fn run_event_loop(app: &mut App) -> Result<Option<NoteId>> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

fn run_event_loop_internal(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<Option<NoteId>> {
    loop {
        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
            && key.kind == KeyEventKind::Press
        {
            match event::handle_key_event(app, key) {
                Action::Continue => {}
                Action::Quit => return Ok(None),
                Action::Select(id) => return Ok(Some(id)),
            }
        }
    }
}

/// Lets the user pick one of `notes` interactively.
///
/// Returns `None` when the user quits without choosing, or right away when
/// there is nothing to choose from.
pub fn pick(notes: Vec<Note>) -> Result<Option<NoteId>> {
    if notes.is_empty() {
        return Ok(None);
    }

    init_panic_hook();

    let mut app = App::new(notes);
    run_event_loop(&mut app).context("picker event loop failed")
}
