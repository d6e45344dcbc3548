//! Test catalog: discovering declared tests and managing their directories.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use itest_utils::fs::{copy_dir, list_dir, path_exists};

use crate::config::RunConfiguration;
use crate::error::HarnessError;

/// File that marks a directory as a test.
pub const METADATA_FILE: &str = "test.json";

/// Suffix appended by [`duplicate_test`].
pub const COPY_SUFFIX: &str = "_Copy";

/// A declared integration test.
///
/// Parsed from `<tests_dir>/<name>/test.json`. The name always comes from
/// the directory, never from the file.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IntegrationTest {
    #[serde(skip)]
    pub name: String,
    /// Starting playback speed; 0 means the default.
    pub speed: f64,
    pub description: String,
    /// Appended verbatim to the subject's command line.
    pub extra_cmd_args: String,
    pub skip: bool,
}

impl IntegrationTest {
    /// Parse the metadata of a test called `name`.
    pub fn from_json(name: &str, data: &[u8]) -> Result<Self, serde_json::Error> {
        let mut test: IntegrationTest = serde_json::from_slice(data)?;
        test.name = name.to_string();
        Ok(test)
    }
}

/// Load every test under `tests_dir`: each immediate subdirectory holding a
/// `test.json`. Tests come back sorted by name.
pub fn load_tests(tests_dir: &Path) -> Result<Vec<IntegrationTest>, HarnessError> {
    let mut tests = Vec::new();

    for entry in list_dir(tests_dir)? {
        if !entry.is_dir {
            continue;
        }
        let metadata = tests_dir.join(&entry.name).join(METADATA_FILE);
        if !path_exists(&metadata)? {
            continue;
        }

        let data = std::fs::read(&metadata)?;
        match IntegrationTest::from_json(&entry.name, &data) {
            Ok(test) => tests.push(test),
            Err(source) => {
                return Err(HarnessError::Json {
                    path: metadata,
                    source,
                })
            }
        }
    }

    tracing::debug!(count = tests.len(), dir = %tests_dir.display(), "loaded test catalog");
    Ok(tests)
}

/// Apply the name filter and then the parallel shard filter.
///
/// Shard membership is decided by position in the name-filtered list, so
/// every shard of the same run sees the same ordering.
pub fn select_tests(
    tests: Vec<IntegrationTest>,
    config: &RunConfiguration,
) -> Vec<IntegrationTest> {
    tests
        .into_iter()
        .filter(|t| config.only.is_empty() || config.only.iter().any(|n| n == &t.name))
        .enumerate()
        .filter(|(i, _)| config.in_shard(*i))
        .map(|(_, t)| t)
        .collect()
}

fn check_name(name: &str) -> Result<(), HarnessError> {
    if name.is_empty() || name.contains('/') || name == "." || name == ".." {
        return Err(HarnessError::Catalog(format!("invalid test name: {name:?}")));
    }
    Ok(())
}

fn existing_test_dir(tests_dir: &Path, name: &str) -> Result<PathBuf, HarnessError> {
    check_name(name)?;
    let dir = tests_dir.join(name);
    if !path_exists(&dir.join(METADATA_FILE))? {
        return Err(HarnessError::Catalog(format!("no such test: {name}")));
    }
    Ok(dir)
}

fn vacant_test_dir(tests_dir: &Path, name: &str) -> Result<PathBuf, HarnessError> {
    check_name(name)?;
    let dir = tests_dir.join(name);
    if path_exists(&dir)? {
        return Err(HarnessError::Catalog(format!("test already exists: {name}")));
    }
    Ok(dir)
}

/// Copy test `name` to `<name>_Copy`. Returns the new name.
pub fn duplicate_test(tests_dir: &Path, name: &str) -> Result<String, HarnessError> {
    let src = existing_test_dir(tests_dir, name)?;
    let new_name = format!("{name}{COPY_SUFFIX}");
    let dst = vacant_test_dir(tests_dir, &new_name)?;
    copy_dir(&src, &dst)?;
    Ok(new_name)
}

/// Rename the directory of test `name` to `new_name`.
pub fn rename_test(tests_dir: &Path, name: &str, new_name: &str) -> Result<(), HarnessError> {
    let src = existing_test_dir(tests_dir, name)?;
    let dst = vacant_test_dir(tests_dir, new_name)?;
    std::fs::rename(&src, &dst).map_err(|source| HarnessError::Rename {
        from: src,
        to: dst,
        source,
    })
}

/// Remove test `name` and everything in its directory.
pub fn delete_test(tests_dir: &Path, name: &str) -> Result<(), HarnessError> {
    let dir = existing_test_dir(tests_dir, name)?;
    std::fs::remove_dir_all(dir)?;
    Ok(())
}
