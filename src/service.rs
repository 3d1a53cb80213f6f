use std::collections::BTreeSet;

use time::Date;

use crate::config::Config;
use crate::editor::Editor;
use crate::error::{NoteError, Result};
use crate::format::ParsedNote;
use crate::index::TagIndex;
use crate::models::{Note, NoteId};
use crate::normalize::{normalize, validate_name};
use crate::store::{self, Draft, NoteStore};

/// Sort order for listing notes.
///
/// Identifiers start with the bucket date, so `Ascending` is oldest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Options for [`NoteService::list_notes`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListNotesOptions {
    /// Only notes listed under this tag.
    pub tag: Option<String>,
    /// Maximum number of notes returned.
    pub limit: Option<usize>,
    pub order: SortOrder,
}

/// What an edit did to the note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    /// Title unchanged; the file was replaced in place and tags reconciled.
    Updated(Note),
    /// Title changed; the note now lives under a new identifier.
    Renamed { from: NoteId, note: Note },
}

impl EditOutcome {
    pub fn note(&self) -> &Note {
        match self {
            EditOutcome::Updated(note) | EditOutcome::Renamed { note, .. } => note,
        }
    }
}

/// Service layer tying note files and the tag index together.
///
/// `NoteService` owns the [`Config`] for one invocation and keeps the two
/// sides coherent across create, edit, and remove. There is no transaction:
/// each operation stops at its first error and leaves completed steps in
/// place.
///
/// # Examples
///
/// ```
/// use notes::{Config, NoteService};
///
/// # fn main() -> notes::Result<()> {
/// let dir = tempfile::tempdir().unwrap();
/// let service = NoteService::open(Config::new(dir.path()))?;
/// assert!(service.list_notes(Default::default())?.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NoteService {
    config: Config,
    store: NoteStore,
    index: TagIndex,
    bucket_date: Option<Date>,
}

impl NoteService {
    /// Creates a service over `config` without touching the filesystem.
    pub fn new(config: Config) -> Self {
        let store = NoteStore::new(&config);
        let index = TagIndex::new(&config);
        Self {
            config,
            store,
            index,
            bucket_date: None,
        }
    }

    /// Creates the directory layout if needed, then the service.
    pub fn open(config: Config) -> Result<Self> {
        config.ensure_layout()?;
        Ok(Self::new(config))
    }

    /// Files new and renamed notes under `date` instead of today.
    pub fn with_bucket_date(mut self, date: Date) -> Self {
        self.bucket_date = Some(date);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn index(&self) -> &TagIndex {
        &self.index
    }

    fn bucket_date(&self) -> Date {
        self.bucket_date.unwrap_or_else(store::today)
    }

    /// Resolves user input (relative id or absolute path) to a note id.
    pub fn resolve(&self, raw: &str) -> Result<NoteId> {
        self.store.resolve(raw)
    }

    /// Creates a note through the editor.
    ///
    /// A template draft is opened in `editor`. When the editor returns, the
    /// draft is parsed; an untitled draft is discarded with
    /// [`NoteError::EmptyTitle`]. Otherwise the draft is filed under today's
    /// bucket and indexed under each of its tags. If filing fails, the
    /// draft is kept and the error is [`NoteError::DraftKept`].
    pub fn create_note(&self, editor: &dyn Editor) -> Result<Note> {
        let draft = self.store.new_draft()?;
        editor.edit(draft.path())?;

        let parsed = match draft.parse().and_then(|p| check_persistable(&p).map(|()| p)) {
            Ok(parsed) => parsed,
            Err(e) => return Err(discard_or_keep(draft, e)),
        };

        let id = self.store.save(draft, &parsed.title, self.bucket_date())?;
        self.index.index(&id, &parsed.tags)?;

        log::info!("created note {id}");
        Ok(into_note(id, parsed))
    }

    /// Edits an existing note through the editor.
    ///
    /// The note is copied to a draft and opened in `editor`. If the title
    /// changed, the draft is filed as a new note, indexed under its tags, and
    /// the old note is deindexed and deleted. Otherwise tag differences are
    /// reconciled and the draft replaces the original file.
    ///
    /// An untitled draft fails with [`NoteError::EmptyTitle`] and leaves the
    /// original untouched. Any other failure after the editor exits keeps
    /// the draft and returns [`NoteError::DraftKept`].
    pub fn edit_note(&self, id: &NoteId, editor: &dyn Editor) -> Result<EditOutcome> {
        let draft = self.store.draft_of(id)?;
        editor.edit(draft.path())?;

        let checked = draft.parse().and_then(|new| {
            check_persistable(&new)?;
            Ok((new, self.store.parse(id)?))
        });
        let (new, old) = match checked {
            Ok(pair) => pair,
            Err(e) => return Err(discard_or_keep(draft, e)),
        };

        if new.title != old.title {
            let new_id = self.store.save(draft, &new.title, self.bucket_date())?;
            if new_id == *id {
                // File name and stored title disagreed; the file was replaced.
                self.index.reconcile(id, &old.tags, &new.tags)?;
            } else {
                self.index.index(&new_id, &new.tags)?;
                self.index.deindex(id, &old.tags)?;
                self.store.delete(id)?;
            }

            log::info!("renamed note {id} to {new_id}");
            return Ok(EditOutcome::Renamed {
                from: id.clone(),
                note: into_note(new_id, new),
            });
        }

        if let Err(e) = self.index.reconcile(id, &old.tags, &new.tags) {
            return Err(draft.keep(e));
        }
        self.store.replace(draft, id)?;

        log::info!("updated note {id}");
        Ok(EditOutcome::Updated(into_note(id.clone(), new)))
    }

    /// Removes a note: deindexes it from all of its tags, then deletes the
    /// file. Returns the note as it was.
    ///
    /// # Errors
    ///
    /// Returns [`NoteError::NotFound`] without changing anything if the note
    /// does not exist.
    pub fn remove_note(&self, id: &NoteId) -> Result<Note> {
        if !self.store.exists(id) {
            return Err(NoteError::note_not_found(id));
        }

        let note = self.store.load(id)?;
        self.index.deindex(id, &note.tags)?;
        self.store.delete(id)?;

        log::info!("removed note {id}");
        Ok(note)
    }

    /// Loads a single note.
    pub fn get_note(&self, id: &NoteId) -> Result<Note> {
        self.store.load(id)
    }

    /// Lists notes, optionally only those listed under a tag.
    ///
    /// Tag lookups go through the index; the tag is normalized first. Listed
    /// identifiers whose file is missing are skipped with a warning.
    pub fn list_notes(&self, options: ListNotesOptions) -> Result<Vec<Note>> {
        let mut ids = match options.tag.as_deref() {
            Some(tag) => {
                let mut ids = self.index.members(&normalize(tag))?;
                ids.sort();
                ids
            }
            None => self.store.list()?,
        };

        if options.order == SortOrder::Descending {
            ids.reverse();
        }

        let mut notes = Vec::new();
        for id in ids {
            if options.limit.is_some_and(|limit| notes.len() >= limit) {
                break;
            }
            match self.store.load(&id) {
                Ok(note) => notes.push(note),
                Err(NoteError::NotFound(_)) => {
                    log::warn!("tag index lists missing note {id}");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(notes)
    }

    /// Returns every tag with the number of notes listed under it.
    pub fn tag_counts(&self) -> Result<Vec<(String, usize)>> {
        let mut counts = Vec::new();
        for tag in self.index.tags()? {
            let members = self.index.members(&tag)?.len();
            counts.push((tag, members));
        }
        Ok(counts)
    }

    /// Returns the tags under which the index currently lists `id`.
    pub fn indexed_tags(&self, id: &NoteId) -> Result<BTreeSet<String>> {
        self.index.tags_of(id)
    }
}

/// Rejects drafts that cannot be filed: no title, or a title or tag that
/// is not a valid file name. Checked before anything is written.
fn check_persistable(parsed: &ParsedNote) -> Result<()> {
    if !parsed.has_title() {
        return Err(NoteError::EmptyTitle);
    }
    validate_name("title", &parsed.title)?;
    for tag in &parsed.tags {
        validate_name("tag", tag)?;
    }
    Ok(())
}

/// An untitled draft has nothing worth keeping; every other failure keeps it.
fn discard_or_keep(draft: Draft, err: NoteError) -> NoteError {
    match err {
        NoteError::EmptyTitle => err,
        other => draft.keep(other),
    }
}

fn into_note(id: NoteId, parsed: ParsedNote) -> Note {
    Note {
        id,
        title: parsed.title,
        tags: parsed.tags,
        body: parsed.body,
    }
}
