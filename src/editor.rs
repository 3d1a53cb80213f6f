//! Launching the user's editor on a draft.

use std::path::Path;
use std::process::Command;

use crate::error::{NoteError, Result};

/// Something that lets the user change a file and returns once they are done.
pub trait Editor {
    fn edit(&self, path: &Path) -> Result<()>;
}

/// Closures act as editors, which keeps tests free of subprocesses.
impl<F> Editor for F
where
    F: Fn(&Path) -> Result<()>,
{
    fn edit(&self, path: &Path) -> Result<()> {
        self(path)
    }
}

/// Runs an external editor command in the foreground.
///
/// The command line is split on whitespace, so values like `code --wait`
/// work. The file path is appended as the last argument. The child inherits
/// the terminal and the call blocks until it exits.
#[derive(Debug, Clone)]
pub struct ExternalEditor {
    command: String,
}

impl ExternalEditor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl Editor for ExternalEditor {
    fn edit(&self, path: &Path) -> Result<()> {
        let mut parts = self.command.split_whitespace();
        let program = parts.next().ok_or_else(|| NoteError::Editor {
            command: self.command.clone(),
            message: "no editor configured".to_string(),
        })?;

        log::debug!("launching `{}` on {}", self.command, path.display());
        let status = Command::new(program)
            .args(parts)
            .arg(path)
            .status()
            .map_err(|e| NoteError::Editor {
                command: self.command.clone(),
                message: e.to_string(),
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(NoteError::Editor {
                command: self.command.clone(),
                message: format!("exited with {status}"),
            })
        }
    }
}
