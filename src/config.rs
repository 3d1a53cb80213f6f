//! Runtime configuration: where notes live and which editor opens them.
//!
//! A [`Config`] is passed explicitly to every component; nothing reads the
//! base directory from global state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{IoResultExt, NoteError, Result};

/// Directory under the base directory holding date buckets.
pub const DATA_DIR: &str = "data";
/// Directory under the base directory holding tag membership lists.
pub const TAGS_DIR: &str = "tags";
/// Editor used when no editor variable is set.
pub const DEFAULT_EDITOR: &str = "vi";

const BASE_DIR_ENV: &str = "NOTES_DIR";
const EDITOR_ENVS: [&str; 3] = ["NOTES_EDITOR", "VISUAL", "EDITOR"];

/// Paths and editor settings for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    base_dir: PathBuf,
    editor: String,
}

impl Config {
    /// Creates a configuration rooted at `base_dir` with the editor taken
    /// from the environment.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            editor: editor_from_env(),
        }
    }

    /// Builds the configuration from the environment.
    ///
    /// The base directory is `override_dir` if given, else `$NOTES_DIR`, else
    /// `~/.notes`.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is given, `NOTES_DIR` is unset, and the
    /// home directory cannot be determined.
    pub fn from_env(override_dir: Option<PathBuf>) -> Result<Self> {
        let base_dir = match override_dir {
            Some(dir) => dir,
            None => match std::env::var_os(BASE_DIR_ENV) {
                Some(dir) if !dir.is_empty() => PathBuf::from(dir),
                _ => dirs::home_dir()
                    .map(|home| home.join(".notes"))
                    .ok_or_else(|| {
                        NoteError::io(
                            "failed to determine home directory",
                            io::Error::from(io::ErrorKind::NotFound),
                        )
                    })?,
            },
        };

        Ok(Self::new(base_dir))
    }

    /// Replaces the editor command.
    pub fn with_editor(mut self, editor: impl Into<String>) -> Self {
        self.editor = editor.into();
        self
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base_dir.join(DATA_DIR)
    }

    pub fn tags_dir(&self) -> PathBuf {
        self.base_dir.join(TAGS_DIR)
    }

    pub fn editor(&self) -> &str {
        &self.editor
    }

    /// Ensures the base, data, and tags directories exist.
    ///
    /// Safe to call on every invocation.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [self.base_dir.clone(), self.data_dir(), self.tags_dir()] {
            if ensure_dir(&dir)? {
                log::debug!("created {}", dir.display());
            }
        }
        Ok(())
    }
}

/// Creates `path` if it is absent.
///
/// Returns `Ok(true)` when the directory was created and `Ok(false)` when it
/// already existed. A non-directory at `path` or any other I/O failure is an
/// error.
pub fn ensure_dir(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => Err(NoteError::io(
            format!("{} exists and is not a directory", path.display()),
            io::Error::from(io::ErrorKind::AlreadyExists),
        )),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(path).with_path("create directory", path)?;
            Ok(true)
        }
        Err(e) => Err(NoteError::io(
            format!("failed to inspect {}", path.display()),
            e,
        )),
    }
}

fn editor_from_env() -> String {
    EDITOR_ENVS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}
