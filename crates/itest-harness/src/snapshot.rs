//! Deterministic text snapshots of a repository's state.
//!
//! Stored fixtures keep the whole expected repository rather than a
//! rendered snapshot, so what gets compared can change without
//! re-recording every test.

use std::path::Path;

use bstr::{BString, ByteSlice, ByteVec};
use walkdir::WalkDir;

use itest_utils::scratch::ScratchCopy;
use itest_utils::subprocess::ExternalCommand;

use crate::error::HarnessError;
use crate::special_paths::restore_special_paths;

/// Returned instead of a snapshot when the directory holds no repository.
pub const NO_GIT_DIR: &str = "git directory not found";

/// Prefix of the throwaway copy made of an expected repository.
const EXPECTED_COPY_PREFIX: &str = "expected_dir_test";

/// The introspection commands, in snapshot order: (label, arguments).
const SNAPSHOT_COMMANDS: &[(&str, &[&str])] = &[
    ("remote show -n origin", &["remote", "show", "-n", "origin"]),
    ("status", &["status"]),
    (
        "log --pretty=%B|%an|%ae -p -1",
        &["log", "--pretty=%B|%an|%ae", "-p", "-1"],
    ),
    ("tag -n", &["tag", "-n"]),
    ("stash list", &["stash", "list"]),
    (
        "submodule foreach 'git status'",
        &["submodule", "foreach", "git status"],
    ),
    (
        "submodule foreach 'git log --pretty=%B -p -1'",
        &["submodule", "foreach", "git log --pretty=%B -p -1"],
    ),
    (
        "submodule foreach 'git tag -n'",
        &["submodule", "foreach", "git tag -n"],
    ),
    (
        "submodule foreach 'git stash list'",
        &["submodule", "foreach", "git stash list"],
    ),
];

/// Snapshot the repository in `dir`.
///
/// Runs each introspection command and records its output under a
/// `git <command>:` header, then dumps every file outside `.git` as
/// `path: <relative path>` / `content:` blocks in name order. Command
/// failures are recorded as whatever output they produced; an absent stash
/// or remote is a normal state, not an error.
pub fn generate_snapshot(dir: &Path) -> Result<BString, HarnessError> {
    if std::fs::symlink_metadata(dir.join(".git")).is_err() {
        return Ok(BString::from(NO_GIT_DIR));
    }

    let mut snapshot = BString::default();

    for (label, args) in SNAPSHOT_COMMANDS {
        let output = ExternalCommand::new("git")
            .arg("-C")
            .arg(dir)
            .args(args.iter())
            .env("LC_ALL", "C")
            .env("LANG", "C")
            .run()?;
        if !output.success() {
            tracing::trace!(command = label, status = %output.status, "snapshot command failed");
        }

        snapshot.push_str(format!("git {label}:\n"));
        snapshot.push_str(output.combined());
        snapshot.push_byte(b'\n');
    }

    snapshot.push_str("files in repo:\n");

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == ".git"));

    for entry in walker {
        let entry = entry.map_err(|source| HarnessError::Walk {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_dir() {
            continue;
        }

        let content = std::fs::read(entry.path())?;
        let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());

        snapshot.push_str(format!("path: {}\ncontent:\n", rel.display()));
        snapshot.push_str(&content);
        snapshot.push_byte(b'\n');
    }

    Ok(snapshot)
}

/// A pair of snapshots for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotPair {
    pub actual: BString,
    pub expected: BString,
}

impl SnapshotPair {
    pub fn matches(&self) -> bool {
        self.actual == self.expected
    }
}

/// Snapshot `actual_dir` directly and `expected_dir` through a throwaway copy.
///
/// The stored fixture is never touched: git commands such as `status` can
/// rewrite the index, and the fixture keeps its special paths under their
/// stored names. The copy gets those names restored, is snapshotted, and is
/// removed when this function returns, whether or not it succeeded.
pub fn generate_snapshots(
    actual_dir: &Path,
    expected_dir: &Path,
) -> Result<SnapshotPair, HarnessError> {
    let actual = generate_snapshot(actual_dir)?;

    let copy = ScratchCopy::of(expected_dir, EXPECTED_COPY_PREFIX)?;
    restore_special_paths(copy.path())?;
    let expected = generate_snapshot(copy.path())?;

    Ok(SnapshotPair { actual, expected })
}

/// First line (1-based) at which two snapshots differ, with both versions
/// of that line. `None` when they are equal.
pub fn first_difference(expected: &[u8], actual: &[u8]) -> Option<(usize, BString, BString)> {
    if expected == actual {
        return None;
    }
    let mut exp_lines = expected.lines();
    let mut act_lines = actual.lines();
    let mut line = 0;
    loop {
        line += 1;
        match (exp_lines.next(), act_lines.next()) {
            (Some(e), Some(a)) if e == a => continue,
            (None, None) => {
                // Only a trailing newline differs.
                return Some((line, BString::default(), BString::default()));
            }
            (e, a) => {
                return Some((
                    line,
                    BString::from(e.unwrap_or_default()),
                    BString::from(a.unwrap_or_default()),
                ));
            }
        }
    }
}
