//! Building the subject invocation for one attempt.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use itest_utils::fs::{copy_dir, path_exists, remove_dir_if_exists};

use crate::config::Mode;
use crate::error::HarnessError;
use crate::layout::{ProjectLayout, TestPaths};

pub const SPEED_VAR: &str = "SPEED";
pub const RECORD_VAR: &str = "RECORD_EVENTS_TO";
pub const REPLAY_VAR: &str = "REPLAY_EVENTS_FROM";

/// A fully-specified subject invocation, independent of how it is run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Added on top of the inherited environment.
    pub env: Vec<(String, String)>,
}

impl SubjectCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Value of an added environment variable.
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn command_string(&self) -> String {
        let mut s = self.program.display().to_string();
        for arg in &self.args {
            s.push(' ');
            s.push_str(arg);
        }
        s
    }

    /// Program followed by its arguments, as OS strings.
    pub fn argv(&self) -> Vec<OsString> {
        std::iter::once(self.program.clone().into_os_string())
            .chain(self.args.iter().map(OsString::from))
            .collect()
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd.envs(self.env.iter().map(|(k, v)| (k, v)));
        cmd
    }
}

/// Render a speed the way the subject expects to parse it.
pub fn format_speed(speed: f64) -> String {
    format!("{speed:.6}")
}

/// Prepare a clean `used_config/` and build the subject invocation.
///
/// The config template is the test's own `config/` if present, otherwise
/// the project default. The command line is
/// `<binary> -debug --use-config-dir=<used_config> --path=<actual/repo> <extra args>`;
/// `SPEED` is always set, `RECORD_EVENTS_TO` in record mode and
/// `REPLAY_EVENTS_FROM` in test and update modes.
pub fn subject_command(
    paths: &TestPaths,
    layout: &ProjectLayout,
    mode: Mode,
    speed: f64,
    extra_cmd_args: &str,
) -> Result<SubjectCommand, HarnessError> {
    let template = template_config_dir(paths, layout)?;
    let config_dir = paths.used_config_dir();

    remove_dir_if_exists(&config_dir)?;
    copy_dir(&template, &config_dir)?;
    tracing::debug!(template = %template.display(), "prepared config dir");

    let mut cmd = SubjectCommand::new(&layout.subject_binary)
        .arg("-debug")
        .arg(format!("--use-config-dir={}", config_dir.display()))
        .arg(format!("--path={}", paths.actual_repo_dir().display()));
    for arg in extra_cmd_args.split_whitespace() {
        cmd = cmd.arg(arg);
    }

    cmd = cmd.env(SPEED_VAR, format_speed(speed));
    let recording = paths.recording().display().to_string();
    cmd = match mode {
        Mode::Record => cmd.env(RECORD_VAR, recording),
        Mode::Test | Mode::UpdateSnapshot => cmd.env(REPLAY_VAR, recording),
        Mode::Sandbox => cmd,
    };

    Ok(cmd)
}

fn template_config_dir(
    paths: &TestPaths,
    layout: &ProjectLayout,
) -> Result<PathBuf, HarnessError> {
    let own = paths.config_override();
    if path_exists(&own)? {
        Ok(own)
    } else {
        Ok(layout.default_config_dir.clone())
    }
}

/// Whether `dir` holds a test-specific config template.
pub fn has_config_override(dir: &Path) -> bool {
    dir.join("config").is_dir()
}
