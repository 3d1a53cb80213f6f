//! The note file format.
//!
//! A note file is UTF-8 text made of sections. A section starts with a header
//! line of the form `[NAME]`; every following line up to the next header is
//! content of that section:
//!
//! ```text
//! [TITLE]
//! Shopping List
//!
//! [TAGS]
//! home, errands
//!
//! [CONTENT]
//! milk
//! ```
//!
//! Only `TITLE`, `TAGS`, and `CONTENT` are consumed. Content under any other
//! header is ignored.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{NoteError, Result};
use crate::normalize::{normalize, split_tags};

/// Skeleton written to a fresh draft.
pub const TEMPLATE: &str = "[TITLE]\n\n[TAGS]\n\n[CONTENT]\n";

const TITLE_HEADER: &str = "TITLE";
const TAGS_HEADER: &str = "TAGS";
const CONTENT_HEADER: &str = "CONTENT";

/// Returns the empty-note skeleton.
pub fn render_template() -> &'static [u8] {
    TEMPLATE.as_bytes()
}

/// Renders a complete note file from its parts.
///
/// `title` and `tags` are written as given; they are normalized again when
/// the file is parsed.
pub fn render<I, S>(title: &str, tags: I, body: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tags: Vec<String> = tags.into_iter().map(|t| t.as_ref().to_string()).collect();
    let mut out = format!(
        "[{TITLE_HEADER}]\n{title}\n\n[{TAGS_HEADER}]\n{}\n\n[{CONTENT_HEADER}]\n",
        tags.join(", ")
    );
    out.push_str(body);
    if !body.is_empty() && !body.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// A classified line of a note file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// `[NAME]`, carrying `NAME`.
    Header(&'a str),
    /// Any other line.
    Content(&'a str),
}

impl<'a> Line<'a> {
    /// Classifies a single line (without its terminator).
    ///
    /// ```
    /// use notes::format::Line;
    ///
    /// assert_eq!(Line::classify("[TAGS]"), Line::Header("TAGS"));
    /// assert_eq!(Line::classify("home, errands"), Line::Content("home, errands"));
    /// assert_eq!(Line::classify(" [TAGS]"), Line::Content(" [TAGS]"));
    /// ```
    pub fn classify(raw: &'a str) -> Self {
        match raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            Some(name) => Line::Header(name),
            None => Line::Content(raw),
        }
    }
}

/// Parser state: which section the current line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Title,
    Tags,
    Body,
    Other,
}

impl Section {
    fn from_header(name: &str) -> Self {
        match name {
            TITLE_HEADER => Section::Title,
            TAGS_HEADER => Section::Tags,
            CONTENT_HEADER => Section::Body,
            _ => Section::Other,
        }
    }
}

/// The consumed parts of a note file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedNote {
    /// Normalized title; empty when the file has no title.
    pub title: String,
    /// Normalized tags.
    pub tags: BTreeSet<String>,
    /// Content section lines, verbatim, each terminated by `\n`.
    pub body: String,
}

impl ParsedNote {
    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }
}

/// Parses note text.
///
/// The first non-blank line of the title section is the title. Every line of
/// the tags section is split on commas; empty tokens are dropped.
pub fn parse_str(text: &str) -> ParsedNote {
    let mut section = Section::None;
    let mut raw_title: Option<&str> = None;
    let mut parsed = ParsedNote::default();

    for raw in text.lines() {
        match Line::classify(raw) {
            Line::Header(name) => section = Section::from_header(name),
            Line::Content(line) => match section {
                Section::Title => {
                    if raw_title.is_none() && !line.trim().is_empty() {
                        raw_title = Some(line);
                    }
                }
                Section::Tags => parsed.tags.extend(split_tags(line)),
                Section::Body => {
                    parsed.body.push_str(line);
                    parsed.body.push('\n');
                }
                Section::None | Section::Other => {}
            },
        }
    }

    parsed.title = raw_title.map(normalize).unwrap_or_default();
    parsed
}

/// Reads and parses the note file at `path`.
///
/// # Errors
///
/// Returns [`NoteError::NotFound`] if the file does not exist, and
/// [`NoteError::Io`] for other read failures.
pub fn parse_file(path: &Path) -> Result<ParsedNote> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => NoteError::file_not_found(path),
        _ => NoteError::io(format!("failed to read {}", path.display()), e),
    })?;
    Ok(parse_str(&text))
}
