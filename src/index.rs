//! The tag index: one membership list file per tag.
//!
//! `tags/<tag>` holds one note identifier per line. The index is kept in step
//! with note files by the service layer; nothing here reads note content.
//!
//! Multi-tag operations stop at the first error and do not roll back what
//! they already changed.

use std::collections::BTreeSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::config::Config;
use crate::error::{IoResultExt, NoteError, Result};
use crate::models::NoteId;
use crate::normalize::validate_name;

/// Membership lists under the tags directory.
#[derive(Debug, Clone)]
pub struct TagIndex {
    dir: PathBuf,
}

impl TagIndex {
    pub fn new(config: &Config) -> Self {
        Self {
            dir: config.tags_dir(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the list file path for `tag`, rejecting names that are not a
    /// single visible file name.
    pub fn tag_path(&self, tag: &str) -> Result<PathBuf> {
        validate_name("tag", tag)?;
        Ok(self.dir.join(tag))
    }

    /// Adds `id` to the list of `tag`, creating the list if needed.
    ///
    /// Adding an identifier that is already listed does nothing.
    pub fn add_membership(&self, tag: &str, id: &NoteId) -> Result<()> {
        let path = self.tag_path(tag)?;

        let existing = match self.entries(tag) {
            Ok(entries) => entries,
            Err(NoteError::NotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };
        if existing.iter().any(|entry| entry == id.as_str()) {
            log::debug!("{id} already listed under `{tag}`");
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_path("open tag list", &path)?;
        writeln!(file, "{id}").with_path("append to tag list", &path)?;

        log::debug!("indexed {id} under `{tag}`");
        Ok(())
    }

    /// Removes every line equal to `id` from the list of `tag`.
    ///
    /// The list is rewritten through a temporary file and renamed into place.
    /// A list left with no entries is kept as an empty file.
    ///
    /// # Errors
    ///
    /// Returns [`NoteError::NotFound`] if the tag has no list file.
    pub fn remove_membership(&self, tag: &str, id: &NoteId) -> Result<()> {
        let removed = self.remove_entry(tag, id.as_str())?;
        log::debug!("deindexed {id} from `{tag}` ({removed} line(s))");
        Ok(())
    }

    /// Removes every line equal to `entry` from the list of `tag`, whether or
    /// not it is a valid identifier. Returns the number of lines removed.
    pub fn remove_entry(&self, tag: &str, entry: &str) -> Result<usize> {
        let path = self.tag_path(tag)?;
        self.rewrite(tag, &path, |line| line != entry)
    }

    /// Adds `id` to every tag in `tags`.
    pub fn index<I, S>(&self, id: &NoteId, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.add_membership(tag.as_ref(), id)?;
        }
        Ok(())
    }

    /// Removes `id` from every tag in `tags`.
    pub fn deindex<I, S>(&self, id: &NoteId, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for tag in tags {
            self.remove_membership(tag.as_ref(), id)?;
        }
        Ok(())
    }

    /// Moves `id` from the tag set `old` to the tag set `new`.
    ///
    /// Tags only in `new` are indexed first, then tags only in `old` are
    /// deindexed. Tags in both are left alone.
    pub fn reconcile(
        &self,
        id: &NoteId,
        old: &BTreeSet<String>,
        new: &BTreeSet<String>,
    ) -> Result<()> {
        let to_add: Vec<&String> = new.difference(old).collect();
        let to_remove: Vec<&String> = old.difference(new).collect();

        if to_add.is_empty() && to_remove.is_empty() {
            return Ok(());
        }

        self.index(id, to_add)?;
        self.deindex(id, to_remove)
    }

    /// Returns the raw, non-blank lines of the list of `tag`, in file order.
    pub fn entries(&self, tag: &str) -> Result<Vec<String>> {
        let path = self.tag_path(tag)?;
        let file = open_list(tag, &path)?;

        let mut entries = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.with_path("read tag list", &path)?;
            if !line.trim().is_empty() {
                entries.push(line);
            }
        }
        Ok(entries)
    }

    /// Returns the notes listed under `tag`, deduplicated, in file order.
    ///
    /// Lines that are not valid identifiers are skipped.
    pub fn members(&self, tag: &str) -> Result<Vec<NoteId>> {
        let mut seen = BTreeSet::new();
        Ok(self
            .entries(tag)?
            .iter()
            .filter_map(|entry| NoteId::parse(entry).ok())
            .filter(|id| seen.insert(id.clone()))
            .collect())
    }

    /// Lists every tag that has a list file, sorted.
    pub fn tags(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(NoteError::io(
                    format!("failed to read {}", self.dir.display()),
                    e,
                ));
            }
        };

        let mut tags = Vec::new();
        for entry in entries {
            let entry = entry.with_path("read entry of", &self.dir)?;
            let is_file = entry.file_type().is_ok_and(|t| t.is_file());
            if let Some(name) = entry.file_name().to_str()
                && is_file
                && validate_name("tag", name).is_ok()
            {
                tags.push(name.to_string());
            }
        }
        tags.sort();
        Ok(tags)
    }

    /// Returns every tag whose list contains `id`.
    pub fn tags_of(&self, id: &NoteId) -> Result<BTreeSet<String>> {
        let mut found = BTreeSet::new();
        for tag in self.tags()? {
            if self.entries(&tag)?.iter().any(|entry| entry == id.as_str()) {
                found.insert(tag);
            }
        }
        Ok(found)
    }

    /// Rewrites the list of `tag` keeping only the first occurrence of each
    /// entry. Returns the number of lines dropped.
    pub fn dedupe(&self, tag: &str) -> Result<usize> {
        let path = self.tag_path(tag)?;
        let mut seen = BTreeSet::new();
        self.rewrite(tag, &path, |entry| seen.insert(entry.to_string()))
    }

    /// Deletes the list file of `tag`.
    pub fn delete_tag(&self, tag: &str) -> Result<()> {
        let path = self.tag_path(tag)?;
        fs::remove_file(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => NoteError::tag_not_found(tag),
            _ => NoteError::io(format!("failed to delete {}", path.display()), e),
        })?;
        log::debug!("deleted tag list `{tag}`");
        Ok(())
    }

    /// Streams the list at `path` into a temporary file, keeping only entries
    /// for which `keep` returns `true`, then renames it over `path`.
    ///
    /// The temporary file is removed if any step fails.
    fn rewrite<F>(&self, tag: &str, path: &Path, mut keep: F) -> Result<usize>
    where
        F: FnMut(&str) -> bool,
    {
        let source = open_list(tag, path)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)
            .with_path("create temporary file in", &self.dir)?;

        let mut dropped = 0;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            for line in BufReader::new(source).lines() {
                let line = line.with_path("read tag list", path)?;
                if line.trim().is_empty() {
                    continue;
                }
                if keep(&line) {
                    writeln!(writer, "{line}").with_path("write temporary list for", path)?;
                } else {
                    dropped += 1;
                }
            }
            writer.flush().with_path("write temporary list for", path)?;
        }

        tmp.persist(path).map_err(|e| {
            NoteError::io(format!("failed to replace {}", path.display()), e.error)
        })?;
        Ok(dropped)
    }
}

fn open_list(tag: &str, path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => NoteError::tag_not_found(tag),
        _ => NoteError::io(format!("failed to open {}", path.display()), e),
    })
}
