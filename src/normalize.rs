//! Normalization of titles and tags into file-name-safe labels.

use crate::error::{NoteError, Result};

/// Normalizes a title or tag.
///
/// # Normalization rules
///
/// - Converts to lowercase
/// - Trims leading/trailing whitespace
/// - Replaces every remaining whitespace character with `_`
///
/// # Examples
///
/// ```
/// use notes::normalize::normalize;
///
/// assert_eq!(normalize("Shopping List"), "shopping_list");
/// assert_eq!(normalize("  Errands "), "errands");
/// assert_eq!(normalize(&normalize("A  B")), "a__b");
/// ```
#[must_use]
pub fn normalize(input: &str) -> String {
    input
        .to_lowercase()
        .trim()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Splits a comma-separated tag line and normalizes each token.
///
/// Empty tokens are dropped, so `"rust,,"` yields only `rust`.
pub fn split_tags(line: &str) -> impl Iterator<Item = String> + '_ {
    line.split(',').map(normalize).filter(|tag| !tag.is_empty())
}

/// Checks that a normalized label can be used as a single file name.
///
/// `kind` names the label in the error ("title", "tag").
pub fn validate_name(kind: &'static str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(NoteError::invalid(kind, name, "must not be empty"));
    }
    if name.contains(['/', '\\']) {
        return Err(NoteError::invalid(kind, name, "contains a path separator"));
    }
    if name.starts_with('.') {
        return Err(NoteError::invalid(kind, name, "must not start with '.'"));
    }
    Ok(())
}
