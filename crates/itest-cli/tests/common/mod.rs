//! Shared helpers for itest CLI tests.
//!
//! Builds a project on disk whose subject binary is a shell script that
//! exits successfully, so whole runs can go through the real binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::Command;

// ──────────────────────────── Types ────────────────────────────

/// Captured output from running a command.
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

// ──────────────────────────── Process Runners ────────────────────────────

/// Variables the harness reads; cleared so the host environment cannot
/// leak into a test.
const HARNESS_VARS: &[&str] = &[
    "MODE",
    "SPEED",
    "INCLUDE_SKIPPED",
    "PARALLEL_TOTAL",
    "PARALLEL_INDEX",
];

/// Run the itest binary in `dir` with the given arguments.
pub fn itest(dir: &Path, args: &[&str]) -> CommandResult {
    itest_with_env(dir, args, &[])
}

/// Run the itest binary in `dir` with extra environment variables.
pub fn itest_with_env(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> CommandResult {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_itest"));
    cmd.args(args).current_dir(dir);
    for var in HARNESS_VARS {
        cmd.env_remove(var);
    }
    cmd.env("GIT_CONFIG_NOSYSTEM", "1").env("LC_ALL", "C");
    for (key, value) in env {
        cmd.env(key, value);
    }
    let output = cmd.output().expect("failed to run itest");
    CommandResult {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(128),
    }
}

// ──────────────────────────── Projects ────────────────────────────

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

pub struct Project {
    pub dir: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        let config = dir.path().join("test/default_test_config");
        std::fs::create_dir_all(&config).unwrap();
        std::fs::write(config.join("config.yml"), "gui: {}\n").unwrap();
        std::fs::create_dir_all(dir.path().join("test/integration")).unwrap();

        let bin = dir.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let subject = bin.join("subject");
        std::fs::write(&subject, "#!/bin/sh\nexit 0\n").unwrap();
        make_executable(&subject);

        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn subject(&self) -> PathBuf {
        self.root().join("bin/subject")
    }

    pub fn test_dir(&self, name: &str) -> PathBuf {
        self.root().join("test/integration").join(name)
    }

    pub fn add_test(&self, name: &str, metadata: &str, setup: &str) -> PathBuf {
        let dir = self.test_dir(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("test.json"), metadata).unwrap();
        std::fs::write(dir.join("setup.sh"), setup).unwrap();
        dir
    }

    /// `itest run` against the fake subject, on this terminal.
    pub fn run(&self, extra: &[&str]) -> CommandResult {
        let subject = self.subject();
        let subject = subject.to_str().unwrap();
        let mut args = vec!["run", "--interactive", "--binary", subject];
        args.extend_from_slice(extra);
        itest(self.root(), &args)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms).unwrap();
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) {}
