use std::collections::BTreeSet;
use std::fs;

use anyhow::Result;
use notes::normalize::normalize;
use notes::{Config, NoteError, NoteId, TagIndex};
use tempfile::TempDir;

fn setup() -> Result<(TempDir, TagIndex)> {
    let tmp = TempDir::new()?;
    let config = Config::new(tmp.path());
    config.ensure_layout()?;
    let index = TagIndex::new(&config);
    Ok((tmp, index))
}

fn set(tags: &[&str]) -> BTreeSet<String> {
    tags.iter().map(|t| t.to_string()).collect()
}

#[test]
fn test_reconcile_yields_exactly_new_tags() -> Result<()> {
    let (_tmp, index) = setup()?;
    let id = NoteId::new("20240301", "note");
    let cases: [(&[&str], &[&str]); 4] = [
        (&["a", "b"], &["b", "c"]),
        (&["c", "b", "a"], &[]),
        (&[], &["z", "y"]),
        (&["x"], &["x"]),
    ];

    for (old, new) in cases {
        let (old, new) = (set(old), set(new));
        index.index(&id, &old)?;

        index.reconcile(&id, &old, &new)?;

        assert_eq!(index.tags_of(&id)?, new, "reconcile {old:?} -> {new:?}");
        index.deindex(&id, &new)?;
    }

    Ok(())
}

#[test]
fn test_reconcile_leaves_other_notes_alone() -> Result<()> {
    let (_tmp, index) = setup()?;
    let mine = NoteId::new("20240301", "mine");
    let other = NoteId::new("20240301", "other");
    index.index(&other, ["a", "b"])?;
    index.index(&mine, ["a"])?;

    index.reconcile(&mine, &set(&["a"]), &set(&["b"]))?;

    assert_eq!(index.tags_of(&other)?, set(&["a", "b"]));
    assert_eq!(index.members("a")?, vec![other.clone()]);
    assert_eq!(index.members("b")?, vec![other, mine]);

    Ok(())
}

#[test]
fn test_repeated_add_keeps_one_line() -> Result<()> {
    let (tmp, index) = setup()?;
    let id = NoteId::new("20240301", "note");

    index.add_membership("work", &id)?;
    index.add_membership("work", &id)?;

    let text = fs::read_to_string(tmp.path().join("tags/work"))?;
    assert_eq!(text, "20240301/note.md\n");

    Ok(())
}

#[test]
fn test_last_removal_keeps_empty_list() -> Result<()> {
    let (tmp, index) = setup()?;
    let id = NoteId::new("20240301", "note");
    index.add_membership("solo", &id)?;

    index.remove_membership("solo", &id)?;

    assert_eq!(fs::read_to_string(tmp.path().join("tags/solo"))?, "");
    assert_eq!(index.tags()?, vec!["solo".to_string()]);

    Ok(())
}

#[test]
fn test_remove_from_missing_tag_is_not_found() -> Result<()> {
    let (_tmp, index) = setup()?;

    let err = index
        .remove_membership("absent", &NoteId::new("20240301", "note"))
        .unwrap_err();

    assert!(matches!(err, NoteError::NotFound(_)));

    Ok(())
}

#[test]
fn test_rewrite_leaves_no_temporary_files() -> Result<()> {
    let (tmp, index) = setup()?;
    let a = NoteId::new("20240301", "a");
    let b = NoteId::new("20240301", "b");
    index.index(&a, ["t"])?;
    index.index(&b, ["t"])?;

    index.remove_membership("t", &a)?;

    let names: Vec<String> = fs::read_dir(tmp.path().join("tags"))?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    assert_eq!(names, vec!["t".to_string()]);
    assert_eq!(index.members("t")?, vec![b]);

    Ok(())
}

#[test]
fn test_normalization_is_idempotent() {
    for raw in ["Shopping List", "  MiXeD  case ", "tab\tsep", "already_done", ""] {
        let once = normalize(raw);
        assert_eq!(normalize(&once), once, "normalize({raw:?})");
    }
}
