//! # Error Suggestions
//!
//! This module provides helper functions for generating helpful error
//! messages with hints and suggestions. Following CLI recommendations,
//! errors should tell users what went wrong AND how to fix it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use attr_merge::suggestions;
//!
//! // Instead of:
//! anyhow::bail!("Configuration file not found: {}", path.display());
//!
//! // Use:
//! return Err(suggestions::config_not_found(path));
//! ```

use std::path::Path;

use crate::error::ConflictError;

/// Generate an error for when the manifest file is not found.
///
/// Includes hints about:
/// - Creating a manifest
/// - Using the -c/--config flag
/// - Using the ATTR_MERGE_CONFIG environment variable
/// - Passing attribute files directly
pub fn config_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Configuration file not found: {path}\n\n\
         hint: Create a .attr-merge.yaml manifest listing your cookbooks\n\
         hint: Use -c/--config to specify a different path\n\
         hint: Set ATTR_MERGE_CONFIG environment variable\n\
         hint: Pass attribute files directly with --no-config",
        path = path.display()
    )
}

/// Generate an error for a run with nothing to check.
pub fn no_sources() -> anyhow::Error {
    anyhow::anyhow!(
        "No attribute sources to check\n\n\
         hint: Add 'attributes:' or 'attributes_file:' to cookbooks in the manifest\n\
         hint: Pass attribute files as arguments, e.g. 'attr-merge check web=web.json db.yaml'"
    )
}

/// Generate an error for an attribute conflict.
///
/// Names the path and the sources, and suggests how to resolve it.
pub fn attribute_conflict(conflict: &ConflictError) -> anyhow::Error {
    anyhow::anyhow!(
        "Conflicting values for attribute {path}\n\
         provided by: {sources}\n\n\
         hint: Remove {path} from all but one of these sources\n\
         hint: Or make every source set the same value",
        path = conflict.attribute_path,
        sources = conflict.provided_by.join(", ")
    )
}

/// Find a similar string from a list of candidates using edit distance.
///
/// Returns Some(candidate) if a close match is found (edit distance <= 2).
pub(crate) fn find_similar<'a>(input: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = edit_distance(input, candidate);
            if distance <= 2 && distance < input.len() {
                Some((candidate, distance))
            } else {
                None
            }
        })
        .min_by_key(|(_, distance)| *distance)
        .map(|(candidate, _)| candidate)
}

/// Calculate the Levenshtein edit distance between two strings.
fn edit_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let a_len = a_chars.len();
    let b_len = b_chars.len();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0usize; b_len + 1];

    for i in 1..=a_len {
        current[0] = i;
        for j in 1..=b_len {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            current[j] = (previous[j] + 1)
                .min(current[j - 1] + 1)
                .min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}
