//! Filesystem conventions: where the project, its tests, and each test's
//! working directories live.

use std::path::{Path, PathBuf};

use crate::error::HarnessError;

/// Name of the primary repository directory inside `actual/` and `expected/`.
pub const PRIMARY_REPO: &str = "repo";

/// Default location of the compiled subject binary.
pub const DEFAULT_SUBJECT_BINARY: &str = "/tmp/lazygit/test_lazygit";

/// A command used to build the subject before any test runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BuildCommand {
    /// `go build -o <output>`.
    pub fn go_build(output: &Path) -> Self {
        Self {
            program: "go".to_string(),
            args: vec![
                "build".to_string(),
                "-o".to_string(),
                output.to_string_lossy().into_owned(),
            ],
        }
    }

    pub fn command_string(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Where the harness finds its inputs for one project.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Project root (the directory holding `.git`).
    pub root: PathBuf,
    /// Directory with one subdirectory per test.
    pub tests_dir: PathBuf,
    /// Config template copied into `used_config/` unless a test has its own.
    pub default_config_dir: PathBuf,
    /// Path of the subject binary that every test invokes.
    pub subject_binary: PathBuf,
    /// How to produce `subject_binary`; `None` means it is prebuilt.
    pub build: Option<BuildCommand>,
}

impl ProjectLayout {
    /// The standard layout under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let subject_binary = PathBuf::from(DEFAULT_SUBJECT_BINARY);
        Self {
            tests_dir: root.join("test").join("integration"),
            default_config_dir: root.join("test").join("default_test_config"),
            build: Some(BuildCommand::go_build(&subject_binary)),
            subject_binary,
            root,
        }
    }

    /// Use a prebuilt subject binary and skip the build step.
    pub fn with_prebuilt_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.subject_binary = binary.into();
        self.build = None;
        self
    }

    /// Paths belonging to the test called `name`.
    pub fn test_paths(&self, name: &str) -> TestPaths {
        TestPaths::new(self.tests_dir.join(name))
    }
}

/// Per-test paths. Every test owns its directory exclusively.
#[derive(Debug, Clone)]
pub struct TestPaths {
    pub test_dir: PathBuf,
}

impl TestPaths {
    pub fn new(test_dir: impl Into<PathBuf>) -> Self {
        Self {
            test_dir: test_dir.into(),
        }
    }

    pub fn metadata(&self) -> PathBuf {
        self.test_dir.join("test.json")
    }

    pub fn setup_script(&self) -> PathBuf {
        self.test_dir.join("setup.sh")
    }

    pub fn config_override(&self) -> PathBuf {
        self.test_dir.join("config")
    }

    pub fn recording(&self) -> PathBuf {
        self.test_dir.join("recording.json")
    }

    pub fn expected_dir(&self) -> PathBuf {
        self.test_dir.join("expected")
    }

    pub fn actual_dir(&self) -> PathBuf {
        self.test_dir.join("actual")
    }

    /// The repository the fixture script populates and the subject opens.
    pub fn actual_repo_dir(&self) -> PathBuf {
        self.actual_dir().join(PRIMARY_REPO)
    }

    pub fn used_config_dir(&self) -> PathBuf {
        self.test_dir.join("used_config")
    }

    pub fn development_log(&self) -> PathBuf {
        self.used_config_dir().join("development.log")
    }
}

/// Find the project root by walking up from `start` to the first directory
/// containing `.git`.
pub fn discover_project_root(start: &Path) -> Result<PathBuf, HarnessError> {
    let mut current = start.to_path_buf();
    loop {
        match std::fs::symlink_metadata(current.join(".git")) {
            Ok(_) => return Ok(current),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        match current.parent() {
            Some(parent) if parent != current => {
                current = parent.to_path_buf();
            }
            _ => return Err(HarnessError::RootNotFound(start.to_path_buf())),
        }
    }
}
