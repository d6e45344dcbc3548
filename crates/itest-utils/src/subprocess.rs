use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use bstr::{BString, ByteSlice};

use crate::error::UtilError;
use crate::Result;

/// Result of running a subprocess.
#[derive(Debug)]
pub struct CommandOutput {
    /// The exit status.
    pub status: ExitStatus,
    /// Captured stdout.
    pub stdout: Vec<u8>,
    /// Captured stderr.
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    /// Returns true if the process exited successfully.
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Stdout followed by stderr, as one byte string.
    pub fn combined(&self) -> BString {
        let mut out = BString::from(self.stdout.clone());
        out.extend_from_slice(&self.stderr);
        out
    }

    /// Lossy text of the combined output, trimmed of trailing whitespace.
    pub fn combined_lossy(&self) -> String {
        self.combined().to_str_lossy().trim_end().to_string()
    }
}

/// Builder for subprocess execution.
///
/// Wraps `std::process::Command` with a fluent API. Stdin is closed and
/// stdout and stderr are captured, so callers get the output back from
/// [`run`](Self::run).
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    program: OsString,
    args: Vec<OsString>,
    env_vars: Vec<(OsString, OsString)>,
    working_dir: Option<PathBuf>,
}

impl ExternalCommand {
    /// Create a new command builder for the given program.
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            env_vars: Vec::new(),
            working_dir: None,
        }
    }

    /// Add an argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// Add multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> Self {
        for arg in args {
            self.args.push(arg.as_ref().to_os_string());
        }
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<OsStr>, val: impl AsRef<OsStr>) -> Self {
        self.env_vars
            .push((key.as_ref().to_os_string(), val.as_ref().to_os_string()));
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, val) in &self.env_vars {
            cmd.env(key, val);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// The command line as a single string, for logs and error messages.
    pub fn command_string(&self) -> String {
        let mut s = self.program.to_string_lossy().to_string();
        for arg in &self.args {
            s.push(' ');
            s.push_str(&arg.to_string_lossy());
        }
        s
    }

    /// Run the command to completion, capturing its output.
    ///
    /// A non-zero exit status is not an error here; inspect
    /// [`CommandOutput::success`].
    pub fn run(&self) -> Result<CommandOutput> {
        let mut cmd = self.build_command();
        let cmd_str = self.command_string();
        tracing::trace!(command = %cmd_str, "spawning");

        let output = cmd.output().map_err(|e| UtilError::Subprocess {
            command: cmd_str,
            source: e,
        })?;

        Ok(CommandOutput {
            status: output.status,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
