//! Consistency checks between note files and the tag index.
//!
//! Provides the `doctor` command functionality:
//! - Scan every note and every tag list
//! - Report memberships that disagree with note content
//! - Optionally repair what can be repaired mechanically

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anyhow::{Context, Result};

use crate::{NoteId, NoteService};

// ANSI color codes for terminal output
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// A single inconsistency found by [`check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// The note carries the tag but the tag list does not name it.
    MissingMembership { tag: String, id: NoteId },
    /// The tag list names a note that is gone or no longer carries the tag.
    DanglingMembership { tag: String, id: String },
    /// The tag list names the note more than once.
    DuplicateMembership { tag: String, id: String, count: usize },
    /// The tag list file has no entries.
    EmptyTag { tag: String },
    /// The note file has no title and would be discarded if edited.
    UntitledNote { id: NoteId },
}

impl Issue {
    /// Whether `--fix` knows how to repair this issue.
    pub fn is_fixable(&self) -> bool {
        !matches!(self, Issue::UntitledNote { .. })
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::MissingMembership { tag, id } => {
                write!(f, "{id} carries tag `{tag}` but is not listed under it")
            }
            Issue::DanglingMembership { tag, id } => {
                write!(f, "tag `{tag}` lists {id}, which does not carry it")
            }
            Issue::DuplicateMembership { tag, id, count } => {
                write!(f, "tag `{tag}` lists {id} {count} times")
            }
            Issue::EmptyTag { tag } => write!(f, "tag `{tag}` has no notes"),
            Issue::UntitledNote { id } => write!(f, "{id} has no title"),
        }
    }
}

/// Result of a consistency scan.
#[derive(Debug, Default)]
pub struct Report {
    pub notes: usize,
    pub tags: usize,
    pub memberships: usize,
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn is_healthy(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Outcome of [`fix`].
#[derive(Debug, Default)]
pub struct FixResult {
    pub fixed: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

// ============================================================================
// Checks
// ============================================================================

/// Scans all notes and tag lists and reports every inconsistency.
pub fn check(service: &NoteService) -> Result<Report> {
    let store = service.store();
    let index = service.index();

    let mut note_tags: BTreeMap<NoteId, BTreeSet<String>> = BTreeMap::new();
    let mut issues = Vec::new();

    for id in store.list().context("failed to list notes")? {
        let parsed = store
            .parse(&id)
            .with_context(|| format!("failed to parse {id}"))?;
        if !parsed.has_title() {
            issues.push(Issue::UntitledNote { id: id.clone() });
        }
        note_tags.insert(id, parsed.tags);
    }

    let tags = index.tags().context("failed to list tags")?;
    let mut listed: BTreeMap<&str, BTreeMap<String, usize>> = BTreeMap::new();
    let mut memberships = 0;

    for tag in &tags {
        let entries = index
            .entries(tag)
            .with_context(|| format!("failed to read tag `{tag}`"))?;
        if entries.is_empty() {
            issues.push(Issue::EmptyTag { tag: tag.clone() });
        }
        let counts = listed.entry(tag.as_str()).or_default();
        for entry in entries {
            memberships += 1;
            *counts.entry(entry).or_default() += 1;
        }
    }

    for (tag, counts) in &listed {
        for (entry, count) in counts {
            let carries = NoteId::parse(entry)
                .ok()
                .and_then(|id| note_tags.get(&id))
                .is_some_and(|tags| tags.contains(*tag));
            if !carries {
                issues.push(Issue::DanglingMembership {
                    tag: tag.to_string(),
                    id: entry.clone(),
                });
            } else if *count > 1 {
                issues.push(Issue::DuplicateMembership {
                    tag: tag.to_string(),
                    id: entry.clone(),
                    count: *count,
                });
            }
        }
    }

    for (id, tags) in &note_tags {
        for tag in tags {
            let is_listed = listed
                .get(tag.as_str())
                .is_some_and(|counts| counts.contains_key(id.as_str()));
            if !is_listed {
                issues.push(Issue::MissingMembership {
                    tag: tag.clone(),
                    id: id.clone(),
                });
            }
        }
    }

    Ok(Report {
        notes: note_tags.len(),
        tags: tags.len(),
        memberships,
        issues,
    })
}

// ============================================================================
// Repair
// ============================================================================

/// Repairs every fixable issue in `report`.
///
/// Each repair is independent; a failure is recorded and the rest continue.
pub fn fix(service: &NoteService, report: &Report) -> FixResult {
    let index = service.index();
    let mut result = FixResult::default();

    for issue in &report.issues {
        let outcome = match issue {
            Issue::MissingMembership { tag, id } => index.add_membership(tag, id),
            Issue::DanglingMembership { tag, id } => index.remove_entry(tag, id).map(|_| ()),
            Issue::DuplicateMembership { tag, .. } => index.dedupe(tag).map(|_| ()),
            Issue::EmptyTag { tag } => index.delete_tag(tag),
            Issue::UntitledNote { .. } => {
                result.skipped += 1;
                continue;
            }
        };

        match outcome {
            Ok(()) => {
                log::info!("fixed: {issue}");
                result.fixed += 1;
            }
            Err(e) => result.errors.push(format!("{issue}: {e}")),
        }
    }

    result
}

// ============================================================================
// Output
// ============================================================================

/// Prints a human-readable report.
pub fn print_report(report: &Report) {
    println!("{BOLD}Notes index{RESET}");
    println!(
        "  {DIM}{} notes, {} tags, {} memberships{RESET}",
        report.notes, report.tags, report.memberships
    );
    println!();

    if report.is_healthy() {
        println!("{GREEN}✓{RESET} index is consistent");
        return;
    }

    for issue in &report.issues {
        let (symbol, color) = if issue.is_fixable() {
            ("✗", RED)
        } else {
            ("!", YELLOW)
        };
        println!("{color}{symbol}{RESET} {issue}");
    }

    let fixable = report.issues.iter().filter(|i| i.is_fixable()).count();
    println!();
    println!(
        "{} issue(s), {fixable} fixable with {BOLD}notes doctor --fix{RESET}",
        report.issues.len()
    );
}

/// Prints the outcome of a repair pass.
pub fn print_fix_summary(result: &FixResult) {
    println!();
    println!("{GREEN}fixed {}{RESET}", result.fixed);
    if result.skipped > 0 {
        println!("{YELLOW}skipped {}{RESET}", result.skipped);
    }
    for error in &result.errors {
        println!("{RED}✗{RESET} {error}");
    }
}
