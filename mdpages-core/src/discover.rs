//! Source file discovery.

use crate::models::source_key;
use crate::source::ContentSource;
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// List the source files matching `pattern`, relative to the source root.
///
/// The pattern is matched against the file name, or against the whole
/// relative path when it contains a `/`. The result is sorted by the
/// `/`-separated relative path so repeated runs see files in the same order.
/// A missing source root yields an empty list.
pub fn discover<S: ContentSource + ?Sized>(
    source: &S,
    pattern: &Pattern,
    recursive: bool,
) -> Vec<PathBuf> {
    let match_full_path = pattern.as_str().contains('/');

    let mut files: Vec<(String, PathBuf)> = source
        .list(recursive)
        .into_iter()
        .filter(|path| matches(pattern, path, match_full_path))
        .map(|path| (source_key(&path), path))
        .collect();

    files.sort_by(|a, b| a.0.cmp(&b.0));
    files.dedup_by(|a, b| a.0 == b.0);

    tracing::debug!(
        "Discovered {} files matching '{}'",
        files.len(),
        pattern.as_str()
    );

    files.into_iter().map(|(_, path)| path).collect()
}

fn matches(pattern: &Pattern, path: &Path, match_full_path: bool) -> bool {
    if match_full_path {
        pattern.matches_with(&source_key(path), MATCH_OPTIONS)
    } else {
        path.file_name()
            .map(|name| pattern.matches_with(&name.to_string_lossy(), MATCH_OPTIONS))
            .unwrap_or(false)
    }
}
