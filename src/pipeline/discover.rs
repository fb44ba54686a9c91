//! Discovery: enumerate files under the input root that match the glob pattern.

use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::engine::tools::path_relative_to;
use crate::error::DiscoveryError;
use crate::types::InputFile;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Matching files plus entries the walk could not read.
#[derive(Debug, Default)]
pub struct Discovery {
    pub root: PathBuf,
    pub files: Vec<InputFile>,
    /// `(path, message)` for unreadable entries below the root. Skipped, never fatal.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Drop leading `./` components; relative paths from the walk never carry them.
pub fn normalize_pattern(pattern: &str) -> &str {
    let mut p = pattern;
    while let Some(rest) = p.strip_prefix("./") {
        p = rest.trim_start_matches('/');
    }
    p
}

/// How deep the walk must go for `pattern`: unbounded with `**`, otherwise one level per component.
pub fn walk_depth(pattern: &str) -> usize {
    if pattern.contains("**") {
        usize::MAX
    } else {
        pattern.split('/').filter(|c| !c.is_empty()).count().max(1)
    }
}

pub fn check_root_and_canonicalize(root: &Path) -> Result<PathBuf, DiscoveryError> {
    if !root.exists() {
        return Err(DiscoveryError::Missing(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory(root.to_path_buf()));
    }
    let canonical = root
        .canonicalize()
        .map_err(|source| DiscoveryError::Unreadable {
            path: root.to_path_buf(),
            source,
        })?;
    std::fs::read_dir(&canonical).map_err(|source| DiscoveryError::Unreadable {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(canonical)
}

/// Files under `root` whose root-relative path matches `pattern`, sorted by path.
/// An empty result is not an error.
pub fn discover_files(root: &Path, pattern: &str) -> Result<Discovery, DiscoveryError> {
    let root = check_root_and_canonicalize(root)?;
    let pattern = normalize_pattern(pattern);
    let matcher = Pattern::new(pattern).map_err(|source| DiscoveryError::Pattern {
        pattern: pattern.to_string(),
        source,
    })?;

    let mut files = Vec::new();
    let mut skipped = Vec::new();
    for entry in WalkDir::new(&root)
        .min_depth(1)
        .max_depth(walk_depth(pattern))
        .follow_links(true)
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone());
                skipped.push((path, err.to_string()));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(rel) = path_relative_to(entry.path(), &root) else {
            continue;
        };
        if matcher.matches_path_with(&rel, MATCH_OPTIONS) {
            files.push(InputFile::new(&root, rel));
        }
    }
    files.sort();
    Ok(Discovery {
        root,
        files,
        skipped,
    })
}
