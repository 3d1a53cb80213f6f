//! The note store: date-bucketed note files and the drafts that become them.
//!
//! Notes live at `data/<YYYYMMDD>/<title>.md`. New and edited content is
//! always written to a [`Draft`] first and moved into place with a rename.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use time::{Date, OffsetDateTime, macros::format_description};

use crate::config::{Config, ensure_dir};
use crate::error::{IoResultExt, NoteError, Result};
use crate::format::{self, ParsedNote};
use crate::models::{NOTE_EXTENSION, Note, NoteId};
use crate::normalize::validate_name;

const DRAFT_PREFIX: &str = ".draft-";
const DRAFT_RANDOM_LEN: usize = 10;

/// Formats `date` as a bucket directory name (`YYYYMMDD`).
///
/// ```
/// use notes::store::bucket_name;
/// use time::macros::date;
///
/// assert_eq!(bucket_name(date!(2024 - 03 - 01)).unwrap(), "20240301");
/// ```
pub fn bucket_name(date: Date) -> Result<String> {
    Ok(date.format(format_description!("[year][month][day]"))?)
}

/// Today's date in the local time zone, falling back to UTC when the local
/// offset cannot be determined.
pub fn today() -> Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// A transient note file open for editing.
///
/// The file has a random hidden name in the base directory and is deleted
/// when the `Draft` is dropped, unless it was promoted with
/// [`NoteStore::save`] or [`NoteStore::replace`] or kept with
/// [`Draft::keep`]. A failed promotion keeps the draft.
#[derive(Debug)]
pub struct Draft {
    file: NamedTempFile,
}

impl Draft {
    fn create_in(dir: &Path) -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix(DRAFT_PREFIX)
            .suffix(&format!(".{NOTE_EXTENSION}"))
            .rand_bytes(DRAFT_RANDOM_LEN)
            .tempfile_in(dir)
            .with_path("create draft in", dir)?;
        Ok(Self { file })
    }

    /// Creates a draft holding the empty-note template.
    pub fn from_template(dir: &Path) -> Result<Self> {
        let mut draft = Self::create_in(dir)?;
        let path = draft.path().to_path_buf();
        let file = draft.file.as_file_mut();
        file.write_all(format::render_template())
            .and_then(|()| file.flush())
            .with_path("write template to", &path)?;
        Ok(draft)
    }

    /// Creates a draft holding a copy of `source`.
    pub fn copy_of(source: &Path, dir: &Path) -> Result<Self> {
        let mut input = File::open(source).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => NoteError::file_not_found(source),
            _ => NoteError::io(format!("failed to open {}", source.display()), e),
        })?;

        let mut draft = Self::create_in(dir)?;
        let path = draft.path().to_path_buf();
        let file = draft.file.as_file_mut();
        io::copy(&mut input, &mut *file)
            .and_then(|_| file.flush())
            .with_path("copy note into", &path)?;
        Ok(draft)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Parses the draft's current content.
    pub fn parse(&self) -> Result<ParsedNote> {
        format::parse_file(self.path())
    }

    /// Leaves the draft on disk after `err` so the user can recover it.
    ///
    /// Returns [`NoteError::DraftKept`] naming the draft, or `err` itself if
    /// the draft could not be kept.
    pub fn keep(self, err: NoteError) -> NoteError {
        match self.file.keep() {
            Ok((_, path)) => {
                log::warn!("kept draft at {} after: {err}", path.display());
                NoteError::DraftKept {
                    path,
                    source: Box::new(err),
                }
            }
            Err(e) => {
                log::error!("failed to keep draft: {}", e.error);
                err
            }
        }
    }

    fn persist(self, target: &Path) -> Result<()> {
        match self.file.persist(target) {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = NoteError::io(
                    format!("failed to move draft to {}", target.display()),
                    e.error,
                );
                Err(Draft { file: e.file }.keep(err))
            }
        }
    }
}

/// Access to note files under the data directory.
#[derive(Debug, Clone)]
pub struct NoteStore {
    data_dir: PathBuf,
    draft_dir: PathBuf,
}

impl NoteStore {
    pub fn new(config: &Config) -> Self {
        Self {
            data_dir: config.data_dir(),
            draft_dir: config.base_dir().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path_of(&self, id: &NoteId) -> PathBuf {
        id.to_path(&self.data_dir)
    }

    pub fn exists(&self, id: &NoteId) -> bool {
        self.path_of(id).is_file()
    }

    /// Turns user input into a note identifier.
    ///
    /// Accepts a relative identifier (`20240301/todo.md`, extension optional)
    /// or an absolute path inside the data directory.
    pub fn resolve(&self, raw: &str) -> Result<NoteId> {
        let path = Path::new(raw.trim());
        if !path.is_absolute() {
            return NoteId::parse(raw);
        }

        let relative = path.strip_prefix(&self.data_dir).map_err(|_| {
            NoteError::invalid("note id", raw, "is outside the data directory")
        })?;
        let parts: Vec<&str> = relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();
        NoteId::parse(&parts.join("/"))
    }

    /// Creates a draft from the empty-note template.
    pub fn new_draft(&self) -> Result<Draft> {
        Draft::from_template(&self.draft_dir)
    }

    /// Creates a draft holding a copy of an existing note.
    pub fn draft_of(&self, id: &NoteId) -> Result<Draft> {
        Draft::copy_of(&self.path_of(id), &self.draft_dir).map_err(|e| match e {
            NoteError::NotFound(_) => NoteError::note_not_found(id),
            other => other,
        })
    }

    /// Moves `draft` into the bucket for `date` under `title`.
    ///
    /// The bucket directory is created if needed. An existing note with the
    /// same identifier is overwritten.
    ///
    /// On failure the draft is kept and the error is
    /// [`NoteError::DraftKept`].
    pub fn save(&self, draft: Draft, title: &str, date: Date) -> Result<NoteId> {
        let id = match self.prepare_bucket(title, date) {
            Ok(id) => id,
            Err(e) => return Err(draft.keep(e)),
        };

        draft.persist(&self.path_of(&id))?;
        log::debug!("saved note {id}");
        Ok(id)
    }

    fn prepare_bucket(&self, title: &str, date: Date) -> Result<NoteId> {
        validate_name("title", title)?;

        let bucket = bucket_name(date)?;
        let bucket_dir = self.data_dir.join(&bucket);
        if ensure_dir(&bucket_dir)? {
            log::debug!("created bucket {}", bucket_dir.display());
        }
        Ok(NoteId::new(&bucket, title))
    }

    /// Moves `draft` over the existing note `id`.
    pub fn replace(&self, draft: Draft, id: &NoteId) -> Result<()> {
        draft.persist(&self.path_of(id))?;
        log::debug!("replaced note {id}");
        Ok(())
    }

    /// Parses the note `id`.
    pub fn parse(&self, id: &NoteId) -> Result<ParsedNote> {
        format::parse_file(&self.path_of(id)).map_err(|e| match e {
            NoteError::NotFound(_) => NoteError::note_not_found(id),
            other => other,
        })
    }

    /// Loads the note `id`.
    pub fn load(&self, id: &NoteId) -> Result<Note> {
        let parsed = self.parse(id)?;
        Ok(Note {
            id: id.clone(),
            title: parsed.title,
            tags: parsed.tags,
            body: parsed.body,
        })
    }

    /// Deletes the note file for `id`.
    pub fn delete(&self, id: &NoteId) -> Result<()> {
        let path = self.path_of(id);
        fs::remove_file(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => NoteError::note_not_found(id),
            _ => NoteError::io(format!("failed to delete {}", path.display()), e),
        })?;
        log::debug!("deleted note {id}");
        Ok(())
    }

    /// Lists every note identifier, sorted.
    ///
    /// A missing data directory yields an empty list.
    pub fn list(&self) -> Result<Vec<NoteId>> {
        let mut ids = Vec::new();

        for bucket in read_dir_names(&self.data_dir)? {
            let bucket_dir = self.data_dir.join(&bucket);
            if !bucket_dir.is_dir() {
                continue;
            }
            for file in read_dir_names(&bucket_dir)? {
                let is_note = Path::new(&file)
                    .extension()
                    .is_some_and(|ext| ext == NOTE_EXTENSION);
                if !is_note || !bucket_dir.join(&file).is_file() {
                    continue;
                }
                if let Ok(id) = NoteId::parse(&format!("{bucket}/{file}")) {
                    ids.push(id);
                }
            }
        }

        ids.sort();
        Ok(ids)
    }
}

/// Returns the visible (non-dot) UTF-8 entry names of `dir`.
fn read_dir_names(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(NoteError::io(format!("failed to read {}", dir.display()), e)),
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.with_path("read entry of", dir)?;
        if let Some(name) = entry.file_name().to_str()
            && !name.starts_with('.')
        {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use time::macros::date;

    fn setup() -> (TempDir, NoteStore) {
        let tmp = TempDir::new().unwrap();
        let config = Config::new(tmp.path());
        config.ensure_layout().unwrap();
        let store = NoteStore::new(&config);
        (tmp, store)
    }

    fn write_draft(store: &NoteStore, text: &str) -> Draft {
        let draft = store.new_draft().unwrap();
        fs::write(draft.path(), text).unwrap();
        draft
    }

    #[test]
    fn new_draft_is_hidden_and_holds_template() {
        let (tmp, store) = setup();
        let draft = store.new_draft().unwrap();

        assert_eq!(draft.path().parent(), Some(tmp.path()));
        let name = draft.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(DRAFT_PREFIX));
        assert!(name.ends_with(".md"));
        assert_eq!(fs::read_to_string(draft.path()).unwrap(), format::TEMPLATE);
    }

    #[test]
    fn dropped_draft_is_removed() {
        let (_tmp, store) = setup();
        let draft = store.new_draft().unwrap();
        let path = draft.path().to_path_buf();
        drop(draft);
        assert!(!path.exists());
    }

    #[test]
    fn drafts_get_distinct_names() {
        let (_tmp, store) = setup();
        let a = store.new_draft().unwrap();
        let b = store.new_draft().unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn save_moves_draft_into_dated_bucket() {
        let (tmp, store) = setup();
        let draft = write_draft(&store, &format::render("Todo", ["a"], ""));
        let draft_path = draft.path().to_path_buf();

        let id = store.save(draft, "todo", date!(2024 - 03 - 01)).unwrap();

        assert_eq!(id.as_str(), "20240301/todo.md");
        assert!(tmp.path().join("data/20240301/todo.md").is_file());
        assert!(!draft_path.exists());
    }

    #[test]
    fn save_reuses_existing_bucket() {
        let (_tmp, store) = setup();
        let day = date!(2024 - 03 - 01);

        store.save(write_draft(&store, "a"), "first", day).unwrap();
        store.save(write_draft(&store, "b"), "second", day).unwrap();

        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn save_overwrites_same_identifier() {
        let (_tmp, store) = setup();
        let day = date!(2024 - 03 - 01);

        let id = store.save(write_draft(&store, "old"), "same", day).unwrap();
        store.save(write_draft(&store, "new"), "same", day).unwrap();

        assert_eq!(fs::read_to_string(store.path_of(&id)).unwrap(), "new");
    }

    #[test]
    fn save_rejects_unsafe_title_and_keeps_draft() {
        let (_tmp, store) = setup();
        let err = store
            .save(write_draft(&store, "x"), "a/b", date!(2024 - 03 - 01))
            .unwrap_err();

        assert!(matches!(err.root(), NoteError::InvalidName { .. }));
        let kept = err.kept_draft().expect("draft should be kept");
        assert_eq!(fs::read_to_string(kept).unwrap(), "x");
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn save_into_blocked_bucket_keeps_draft() {
        let (_tmp, store) = setup();
        fs::write(store.data_dir().join("20240301"), "not a directory").unwrap();

        let err = store
            .save(write_draft(&store, "precious"), "t", date!(2024 - 03 - 01))
            .unwrap_err();

        assert!(matches!(err.root(), NoteError::Io { .. }));
        let kept = err.kept_draft().expect("draft should be kept");
        assert_eq!(fs::read_to_string(kept).unwrap(), "precious");
    }

    #[test]
    fn resolve_accepts_relative_and_absolute_forms() {
        let (_tmp, store) = setup();
        let expected = NoteId::new("20240301", "todo");

        assert_eq!(store.resolve("20240301/todo.md").unwrap(), expected);
        assert_eq!(store.resolve("20240301/todo").unwrap(), expected);

        let absolute = store.path_of(&expected);
        assert_eq!(store.resolve(absolute.to_str().unwrap()).unwrap(), expected);

        assert!(store.resolve("/somewhere/else/todo.md").is_err());
    }

    #[test]
    fn load_and_parse_report_missing_note() {
        let (_tmp, store) = setup();
        let id = NoteId::new("20240301", "ghost");

        assert!(matches!(store.load(&id), Err(NoteError::NotFound(_))));
        assert!(matches!(store.draft_of(&id), Err(NoteError::NotFound(_))));
        assert!(matches!(store.delete(&id), Err(NoteError::NotFound(_))));
    }

    #[test]
    fn list_skips_hidden_and_foreign_files() {
        let (tmp, store) = setup();
        let bucket = tmp.path().join("data/20240301");
        fs::create_dir_all(&bucket).unwrap();
        fs::write(bucket.join("a.md"), "").unwrap();
        fs::write(bucket.join(".hidden.md"), "").unwrap();
        fs::write(bucket.join("notes.txt"), "").unwrap();
        fs::write(tmp.path().join("data/stray.md"), "").unwrap();

        let ids = store.list().unwrap();
        assert_eq!(ids, vec![NoteId::new("20240301", "a")]);
    }

    #[test]
    fn list_of_missing_data_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let store = NoteStore::new(&Config::new(tmp.path().join("nowhere")));
        assert!(store.list().unwrap().is_empty());
    }
}
