//! Shared helpers for itest-harness integration tests.
//!
//! Builds throwaway projects on disk (a root holding `.git`, a catalog of
//! tests, a default config template) and provides fake capabilities that
//! record what the orchestrator asked of them. Git runs with a pinned
//! environment so snapshots do not depend on the machine.

#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::process::Command;

use itest_harness::driver::SubjectCommand;
use itest_harness::special_paths::rename_special_paths;
use itest_harness::{
    FailureReporter, HarnessError, Logger, ProcessRunner, ProjectLayout, SnapshotMismatch,
    TestPaths,
};

// ──────────────────────────── Git ────────────────────────────

/// Apply the pinned environment to a `Command`.
fn pin_env(cmd: &mut Command, dir: &Path) {
    cmd.env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "test@example.com")
        .env("GIT_AUTHOR_DATE", "1234567890 +0000")
        .env("GIT_COMMITTER_NAME", "Test Committer")
        .env("GIT_COMMITTER_EMAIL", "test@example.com")
        .env("GIT_COMMITTER_DATE", "1234567890 +0000")
        .env("TZ", "UTC")
        .env("LC_ALL", "C")
        .env("LANG", "C")
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("HOME", dir.parent().unwrap_or(dir));
}

/// Run git in `dir`, panicking on failure. Returns stdout.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(dir);
    pin_env(&mut cmd, dir);
    let output = cmd.output().expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Create a repository in `dir` with one commit of `file.txt`.
pub fn init_repo(dir: &Path, message: &str) {
    std::fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/master"]);
    std::fs::write(dir.join("file.txt"), "hello\n").unwrap();
    git(dir, &["add", "file.txt"]);
    git(dir, &["commit", "-q", "-m", message]);
}

// ──────────────────────────── Fixture scripts ────────────────────────────

/// A `setup.sh` that creates a one-commit repository in `$1`.
pub fn one_commit_script(message: &str) -> String {
    format!(
        r#"set -e
export GIT_CONFIG_NOSYSTEM=1 HOME="$1/.." LC_ALL=C
export GIT_AUTHOR_NAME="Test Author" GIT_AUTHOR_EMAIL=test@example.com
export GIT_COMMITTER_NAME="Test Committer" GIT_COMMITTER_EMAIL=test@example.com
export GIT_AUTHOR_DATE="1234567890 +0000" GIT_COMMITTER_DATE="1234567890 +0000"
cd "$1"
git init -q
git symbolic-ref HEAD refs/heads/master
echo hello > file.txt
git add file.txt
git commit -q -m "{message}"
"#
    )
}

pub const FAILING_SCRIPT: &str = "echo 'fixture broke' >&2\nexit 7\n";

// ──────────────────────────── Projects ────────────────────────────

/// Contents of the development log shipped in the default config template.
pub const DEV_LOG: &str = "subject debug output\n";

/// A project on disk with no tests yet.
pub struct Project {
    pub dir: tempfile::TempDir,
    pub layout: ProjectLayout,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();

        let layout =
            ProjectLayout::new(dir.path()).with_prebuilt_binary("/opt/subject/test_lazygit");
        std::fs::create_dir_all(&layout.tests_dir).unwrap();
        std::fs::create_dir_all(&layout.default_config_dir).unwrap();
        std::fs::write(layout.default_config_dir.join("config.yml"), "gui: {}\n").unwrap();
        std::fs::write(layout.default_config_dir.join("development.log"), DEV_LOG).unwrap();

        Self { dir, layout }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self, name: &str) -> TestPaths {
        self.layout.test_paths(name)
    }

    /// Declare a test with the given metadata and fixture script.
    pub fn add_test(&self, name: &str, metadata: &str, setup: &str) -> TestPaths {
        let paths = self.paths(name);
        std::fs::create_dir_all(&paths.test_dir).unwrap();
        std::fs::write(paths.metadata(), metadata).unwrap();
        std::fs::write(paths.setup_script(), setup).unwrap();
        std::fs::write(paths.recording(), "{\"KeyEvents\":[]}\n").unwrap();
        paths
    }

    /// Store `expected/repo` as the repository `setup` produces, with
    /// special paths renamed the way a recorded fixture keeps them.
    pub fn store_expected(&self, name: &str, setup: &str) {
        let paths = self.paths(name);
        let scratch = tempfile::tempdir().unwrap();
        let script = scratch.path().join("setup.sh");
        std::fs::write(&script, setup).unwrap();

        let target = paths.expected_dir().join("repo");
        std::fs::create_dir_all(&target).unwrap();
        let status = Command::new("bash").arg(&script).arg(&target).status().unwrap();
        assert!(status.success(), "storing expected fixture failed");
        rename_special_paths(&paths.expected_dir()).unwrap();
    }
}

// ──────────────────────────── Fake capabilities ────────────────────────────

/// Records every subject invocation and optionally acts on the repository
/// the subject was pointed at.
#[derive(Default)]
pub struct FakeRunner {
    pub calls: RefCell<Vec<SubjectCommand>>,
    pub action: Option<Box<dyn Fn(&Path) -> Result<(), HarnessError>>>,
}

impl FakeRunner {
    pub fn acting(action: impl Fn(&Path) -> Result<(), HarnessError> + 'static) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            action: Some(Box::new(action)),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// `SPEED` of each invocation, in order.
    pub fn speeds(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| c.env_value("SPEED").unwrap_or_default().to_string())
            .collect()
    }
}

/// The `--path=` argument of a subject invocation.
pub fn repo_arg(cmd: &SubjectCommand) -> PathBuf {
    cmd.args
        .iter()
        .find_map(|a| a.strip_prefix("--path="))
        .map(PathBuf::from)
        .expect("subject command has no --path")
}

impl ProcessRunner for FakeRunner {
    fn run(&self, cmd: &SubjectCommand) -> Result<(), HarnessError> {
        self.calls.borrow_mut().push(cmd.clone());
        match &self.action {
            Some(action) => action(&repo_arg(cmd)),
            None => Ok(()),
        }
    }
}

/// Collects log lines.
#[derive(Default)]
pub struct LogCollector {
    pub lines: RefCell<Vec<String>>,
}

impl LogCollector {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.contains(needle))
    }
}

impl Logger for LogCollector {
    fn log(&self, message: &str) {
        self.lines.borrow_mut().push(message.to_string());
    }
}

/// Collects reported mismatches.
#[derive(Default)]
pub struct ReportCollector {
    pub mismatches: RefCell<Vec<SnapshotMismatch>>,
}

impl FailureReporter for ReportCollector {
    fn report(&self, mismatch: &SnapshotMismatch) {
        self.mismatches.borrow_mut().push(mismatch.clone());
    }
}
