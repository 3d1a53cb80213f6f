//! Rendering for the picker.
//!
//! Query input on top, ranked matches on the left, a preview of the
//! highlighted note on the right, and a shortcut bar at the bottom.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use super::app::App;

/// Draws the whole picker.
pub fn draw(frame: &mut Frame, app: &App) {
    let size = frame.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input
            Constraint::Min(0),    // Content area
            Constraint::Length(1), // Shortcut bar
        ])
        .split(size);

    // Matches (30%) | preview (70%)
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(main_chunks[1]);

    render_query(frame, app, main_chunks[0]);
    render_matches(frame, app, content_chunks[0]);
    render_preview(frame, app, content_chunks[1]);
    render_shortcut_bar(frame, main_chunks[2]);
}

fn render_query(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Search ({}/{})", app.matches().len(), app.total()))
        .border_style(Style::default().fg(Color::Cyan));

    let mut content = app.query().to_string();
    content.push('█');

    frame.render_widget(Paragraph::new(content).block(block), area);
}

/// Lists matching notes as `title` with the bucket dimmed beside it.
fn render_matches(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Notes");

    let items: Vec<ListItem> = app
        .matches()
        .into_iter()
        .map(|note| {
            let bucket = note.id.bucket().unwrap_or_default();
            ListItem::new(Line::from(vec![
                Span::raw(note.title().to_string()),
                Span::raw(" "),
                Span::styled(
                    bucket.to_string(),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ),
            ]))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::REVERSED),
    );

    let mut list_state = ListState::default();
    list_state.select(app.selected_index());

    frame.render_stateful_widget(list, area, &mut list_state);
}

fn render_preview(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Preview");
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let content = match app.selected_note() {
        Some(note) => {
            let mut text = Text::default();
            text.lines.push(Line::from(vec![
                Span::styled("Title: ", bold),
                Span::raw(note.title().to_string()),
            ]));
            text.lines.push(Line::from(vec![
                Span::styled("Tags: ", bold),
                Span::styled(note.tag_line(), Style::default().fg(Color::Cyan)),
            ]));
            text.lines.push(Line::from(Span::styled(
                note.id.to_string(),
                Style::default().fg(Color::DarkGray),
            )));
            text.lines.push(Line::from(""));
            for line in note.body().lines() {
                text.lines.push(Line::from(line.to_string()));
            }
            text
        }
        None => Text::from("No matching note"),
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

/// Format: `Key: action | Key: action` with keys highlighted in cyan.
fn render_shortcut_bar(frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(Color::Cyan);
    let sep_style = Style::default().fg(Color::DarkGray);

    let spans = vec![
        Span::styled("Enter", key_style),
        Span::raw(": edit"),
        Span::styled(" | ", sep_style),
        Span::styled("↑/↓ Ctrl-p/n", key_style),
        Span::raw(": navigate"),
        Span::styled(" | ", sep_style),
        Span::styled("Esc", key_style),
        Span::raw(": quit"),
    ];

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Note, NoteId};
    use ratatui::{Terminal, backend::TestBackend};

    fn create_test_app() -> App {
        App::new(vec![
            Note {
                id: NoteId::new("20240301", "shopping_list"),
                title: "shopping_list".to_string(),
                tags: ["home", "errands"].iter().map(|t| t.to_string()).collect(),
                body: "milk\neggs\n".to_string(),
            },
            Note {
                id: NoteId::new("20240302", "standup"),
                title: "standup".to_string(),
                tags: ["work"].iter().map(|t| t.to_string()).collect(),
                body: String::new(),
            },
        ])
    }

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();

        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn renders_matches_and_preview() {
        let screen = render(&create_test_app());

        assert!(screen.contains("Search (2/2)"));
        assert!(screen.contains("shopping_list 20240301"));
        assert!(screen.contains("standup 20240302"));
        assert!(screen.contains("Tags: errands, home"));
        assert!(screen.contains("milk"));
        assert!(screen.contains("Esc: quit"));
    }

    #[test]
    fn preview_follows_selection() {
        let mut app = create_test_app();
        app.select_next();

        let screen = render(&app);
        assert!(screen.contains("Tags: work"));
        assert!(!screen.contains("milk"));
    }

    #[test]
    fn empty_result_shows_placeholder() {
        let mut app = create_test_app();
        for c in "zzz".chars() {
            app.push_query_char(c);
        }

        let screen = render(&app);
        assert!(screen.contains("Search (0/2)"));
        assert!(screen.contains("No matching note"));
    }

    #[test]
    fn draw_splits_matches_and_preview_30_70() {
        let screen = render(&create_test_app());
        // Row 3 is the top border of both content panes.
        let border: Vec<char> = screen.lines().nth(3).unwrap().chars().collect();

        assert_eq!(border[0], '┌');
        assert_eq!(border[29], '┐');
        assert_eq!(border[30], '┌');
        assert_eq!(border[99], '┐');
        assert!(border[31..].iter().collect::<String>().starts_with("Preview"));
    }
}
