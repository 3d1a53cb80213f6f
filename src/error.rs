//! Error types for note and tag-index operations.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias used throughout the library.
pub type Result<T> = std::result::Result<T, NoteError>;

/// Errors that can occur while storing, indexing, or editing notes.
#[derive(Debug, Error)]
pub enum NoteError {
    /// A note, tag list, or note file does not exist.
    #[error("cannot find {0}")]
    NotFound(String),

    /// The edited draft has no title, so it was discarded.
    #[error("empty title, skipping the note")]
    EmptyTitle,

    /// A title, tag, or identifier cannot be used as a file name.
    #[error("invalid {kind} {name:?}: {reason}")]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },

    /// Filesystem failures (directory creation, rename, write).
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The external editor could not be started or exited unsuccessfully.
    #[error("editor `{command}` failed: {message}")]
    Editor { command: String, message: String },

    /// A bucket date could not be formatted.
    #[error("failed to format date: {0}")]
    DateFormat(#[from] time::error::Format),

    /// Filing an edited draft failed; the draft was left on disk at `path`.
    #[error("your edit was kept in {}", path.display())]
    DraftKept {
        path: PathBuf,
        #[source]
        source: Box<NoteError>,
    },
}

impl NoteError {
    pub fn note_not_found(id: impl std::fmt::Display) -> Self {
        NoteError::NotFound(format!("note `{id}`"))
    }

    pub fn tag_not_found(tag: &str) -> Self {
        NoteError::NotFound(format!("tag `{tag}`"))
    }

    pub fn file_not_found(path: &Path) -> Self {
        NoteError::NotFound(format!("file {}", path.display()))
    }

    pub fn invalid(kind: &'static str, name: impl Into<String>, reason: &'static str) -> Self {
        NoteError::InvalidName {
            kind,
            name: name.into(),
            reason,
        }
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        NoteError::Io {
            context: context.into(),
            source,
        }
    }

    /// Returns `true` for errors caused by user input rather than the system.
    ///
    /// The CLI maps these to exit status 1 and everything else to 2.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.root(),
            NoteError::NotFound(_) | NoteError::EmptyTitle | NoteError::InvalidName { .. }
        )
    }

    /// The error that caused the failure, looking through a kept draft.
    pub fn root(&self) -> &NoteError {
        match self {
            NoteError::DraftKept { source, .. } => source.root(),
            other => other,
        }
    }

    /// Where the user's edit was left, if filing it failed.
    pub fn kept_draft(&self) -> Option<&Path> {
        match self {
            NoteError::DraftKept { path, .. } => Some(path.as_path()),
            _ => None,
        }
    }
}

/// Attaches a path-bearing context to raw I/O results.
pub(crate) trait IoResultExt<T> {
    fn with_path(self, action: &str, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path(self, action: &str, path: &Path) -> Result<T> {
        self.map_err(|e| NoteError::io(format!("failed to {action} {}", path.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_errors_are_classified() {
        assert!(NoteError::EmptyTitle.is_user_error());
        assert!(NoteError::note_not_found("20240101/x.md").is_user_error());
        assert!(NoteError::invalid("tag", "a/b", "contains a path separator").is_user_error());

        let io = NoteError::io("boom", io::Error::other("disk"));
        assert!(!io.is_user_error());
    }

    #[test]
    fn kept_draft_classifies_by_its_cause() {
        let kept = NoteError::DraftKept {
            path: PathBuf::from("/tmp/.draft-abc.md"),
            source: Box::new(NoteError::tag_not_found("home")),
        };

        assert!(kept.is_user_error());
        assert!(matches!(kept.root(), NoteError::NotFound(_)));
        assert_eq!(kept.kept_draft(), Some(Path::new("/tmp/.draft-abc.md")));
        assert_eq!(kept.to_string(), "your edit was kept in /tmp/.draft-abc.md");

        let kept = NoteError::DraftKept {
            path: PathBuf::from("/tmp/.draft-abc.md"),
            source: Box::new(NoteError::io("rename", io::Error::other("disk"))),
        };
        assert!(!kept.is_user_error());
        assert_eq!(NoteError::EmptyTitle.kept_draft(), None);
    }

    #[test]
    fn with_path_includes_action_and_path() {
        let result: io::Result<()> = Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope"));
        let err = result
            .with_path("create directory", Path::new("/tmp/x"))
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("failed to create directory /tmp/x"));
        assert!(message.contains("nope"));
    }

    #[test]
    fn not_found_messages_name_the_entity() {
        assert_eq!(
            NoteError::note_not_found("20240101/a.md").to_string(),
            "cannot find note `20240101/a.md`"
        );
        assert_eq!(
            NoteError::tag_not_found("home").to_string(),
            "cannot find tag `home`"
        );
    }
}
