use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::{NoteError, Result};

/// File extension of persisted notes.
pub const NOTE_EXTENSION: &str = "md";

/// Identifier of a persisted note.
///
/// The identifier is the note's path relative to the data directory,
/// `<YYYYMMDD>/<title>.md`, always written with `/` separators. It is the
/// exact string stored in tag membership lists.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Builds the identifier for `title` inside the date bucket `bucket`.
    ///
    /// Both parts are expected to be validated file names already.
    pub fn new(bucket: &str, title: &str) -> Self {
        Self(format!("{bucket}/{title}.{NOTE_EXTENSION}"))
    }

    /// Parses a relative identifier typed by a user.
    ///
    /// The `.md` extension may be omitted.
    ///
    /// # Examples
    ///
    /// ```
    /// use notes::NoteId;
    ///
    /// let id = NoteId::parse("20240301/shopping_list").unwrap();
    /// assert_eq!(id.as_str(), "20240301/shopping_list.md");
    /// assert_eq!(id.title(), "shopping_list");
    ///
    /// assert!(NoteId::parse("../escape.md").is_err());
    /// assert!(NoteId::parse("/etc/passwd").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(NoteError::invalid("note id", raw, "must not be empty"));
        }

        let mut parts = Vec::new();
        for component in Path::new(raw).components() {
            match component {
                Component::Normal(part) => {
                    let part = part.to_str().ok_or_else(|| {
                        NoteError::invalid("note id", raw, "must be valid UTF-8")
                    })?;
                    if part.starts_with('.') {
                        return Err(NoteError::invalid(
                            "note id",
                            raw,
                            "must not contain hidden components",
                        ));
                    }
                    parts.push(part);
                }
                Component::CurDir => {}
                _ => {
                    return Err(NoteError::invalid(
                        "note id",
                        raw,
                        "must be a relative path inside the data directory",
                    ));
                }
            }
        }

        if parts.is_empty() {
            return Err(NoteError::invalid("note id", raw, "must not be empty"));
        }

        let mut id = parts.join("/");
        let has_extension = Path::new(&id)
            .extension()
            .is_some_and(|ext| ext == NOTE_EXTENSION);
        if !has_extension {
            id.push('.');
            id.push_str(NOTE_EXTENSION);
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the date bucket, if the identifier has one.
    pub fn bucket(&self) -> Option<&str> {
        self.0.rsplit_once('/').map(|(bucket, _)| bucket)
    }

    /// Returns the note's normalized title (the file stem).
    pub fn title(&self) -> &str {
        let file = self.0.rsplit_once('/').map_or(self.0.as_str(), |(_, file)| file);
        file.strip_suffix(".md").unwrap_or(file)
    }

    /// Resolves the identifier to a file path under `data_dir`.
    pub fn to_path(&self, data_dir: &Path) -> PathBuf {
        self.0.split('/').fold(data_dir.to_path_buf(), |path, part| path.join(part))
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NoteId {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for NoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
