//! Renaming of paths that the outer project repository cannot store as-is.
//!
//! A stored fixture lives inside the project's own git repository, which
//! refuses to track nested `.git` directories and `.gitmodules` files and
//! would apply the fixture's ignore rules to itself. Stored fixtures
//! therefore keep these paths under substitute names, and the names are
//! swapped back before a fixture is used.

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::HarnessError;

/// One entry of the rename table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialPath {
    /// Name git expects.
    pub original: &'static str,
    /// Name used in the stored fixture.
    pub renamed: &'static str,
    /// If non-empty, only entries whose logical path contains this are renamed.
    pub contains: &'static str,
}

/// Applied top to bottom.
pub const SPECIAL_PATHS: &[SpecialPath] = &[
    SpecialPath {
        original: ".git",
        renamed: ".git_keep",
        contains: "",
    },
    SpecialPath {
        original: ".gitmodules",
        renamed: ".gitmodules_keep",
        contains: "",
    },
    SpecialPath {
        original: ".gitignore",
        renamed: "lg_ignore_file",
        contains: "",
    },
    // Only the exclude file inside a git dir, not any file called `exclude`.
    SpecialPath {
        original: "exclude",
        renamed: "lg_exclude_file",
        contains: ".git/info/exclude",
    },
];

#[derive(Debug, Clone, Copy)]
enum Direction {
    Rename,
    Restore,
}

/// Swap every special path under `dir` to its stored name.
pub fn rename_special_paths(dir: &Path) -> Result<(), HarnessError> {
    apply(dir, Direction::Rename)
}

/// Swap every stored name under `dir` back to the name git expects.
pub fn restore_special_paths(dir: &Path) -> Result<(), HarnessError> {
    apply(dir, Direction::Restore)
}

fn apply(dir: &Path, direction: Direction) -> Result<(), HarnessError> {
    for special in SPECIAL_PATHS {
        let (from, to) = match direction {
            Direction::Rename => (special.original, special.renamed),
            Direction::Restore => (special.renamed, special.original),
        };

        for path in paths_to_rename(dir, from, special)? {
            let target = path.with_file_name(to);
            std::fs::rename(&path, &target).map_err(|source| HarnessError::Rename {
                from: path.clone(),
                to: target.clone(),
                source,
            })?;
            tracing::trace!(from = %path.display(), to = %target.display(), "renamed special path");
        }
    }
    Ok(())
}

/// Entries named `name` that pass the mapping's filter, deepest first.
fn paths_to_rename(
    dir: &Path,
    name: &str,
    special: &SpecialPath,
) -> Result<Vec<PathBuf>, HarnessError> {
    let mut paths = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .contents_first(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = entry.map_err(|source| HarnessError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_name() != name {
            continue;
        }
        if !special.contains.is_empty() {
            let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
            if !logical_path(rel, special.original).contains(special.contains) {
                continue;
            }
        }
        paths.push(entry.into_path());
    }
    Ok(paths)
}

/// `rel` as git would see it: stored directory names read as their
/// originals and the final component read as `original`.
fn logical_path(rel: &Path, original: &str) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(parent) = rel.parent() {
        for component in parent.components() {
            if let Component::Normal(part) = component {
                let part = part.to_string_lossy();
                let restored = SPECIAL_PATHS
                    .iter()
                    .find(|s| s.renamed == part)
                    .map(|s| s.original.to_string())
                    .unwrap_or_else(|| part.into_owned());
                parts.push(restored);
            }
        }
    }
    parts.push(original.to_string());
    parts.join("/")
}
