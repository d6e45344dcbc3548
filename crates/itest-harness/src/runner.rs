//! Running the subject process.

use std::io::Read;

use portable_pty::{native_pty_system, CommandBuilder, PtySize};

use crate::driver::SubjectCommand;
use crate::error::HarnessError;

/// Runs a subject invocation to completion.
///
/// An `Err` means the subject failed; the orchestrator treats that the same
/// as a failing fixture script.
pub trait ProcessRunner {
    fn run(&self, cmd: &SubjectCommand) -> Result<(), HarnessError>;
}

impl<F> ProcessRunner for F
where
    F: Fn(&SubjectCommand) -> Result<(), HarnessError>,
{
    fn run(&self, cmd: &SubjectCommand) -> Result<(), HarnessError> {
        self(cmd)
    }
}

/// Runs the subject attached to this process's terminal.
///
/// Used for recording and sandbox sessions where a person drives the subject.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughRunner;

impl ProcessRunner for PassthroughRunner {
    fn run(&self, cmd: &SubjectCommand) -> Result<(), HarnessError> {
        tracing::debug!(command = %cmd.command_string(), "running subject");
        let status = cmd.to_command().status().map_err(|e| HarnessError::Subject {
            command: cmd.command_string(),
            message: e.to_string(),
        })?;
        if !status.success() {
            return Err(HarnessError::Subject {
                command: cmd.command_string(),
                message: format!("exited with {status}"),
            });
        }
        Ok(())
    }
}

/// Terminal type given to headless subjects.
pub const HEADLESS_TERM: &str = "xterm";

/// Runs the subject inside a pseudo-terminal with no one watching.
///
/// Terminal output is drained and discarded. Stderr is redirected to a
/// scratch file so that a crash which only prints to stderr still fails the
/// run: the result is an error if the exit status is non-zero or anything
/// was written to stderr.
#[derive(Debug, Clone, Copy)]
pub struct PtyRunner {
    pub rows: u16,
    pub cols: u16,
}

impl Default for PtyRunner {
    fn default() -> Self {
        Self { rows: 100, cols: 100 }
    }
}

impl PtyRunner {
    fn pty_error(cmd: &SubjectCommand, err: impl std::fmt::Display) -> HarnessError {
        HarnessError::Pty(format!("{}: {err}", cmd.command_string()))
    }

    /// The pty command: `sh -c 'exec "$@" 2>"$0"' <stderr file> <argv...>`
    /// plus the subject's environment and the headless markers.
    fn builder(cmd: &SubjectCommand, stderr_path: &std::path::Path) -> CommandBuilder {
        let mut builder = CommandBuilder::new("sh");
        builder.arg("-c");
        builder.arg(r#"exec "$@" 2>"$0""#);
        builder.arg(stderr_path.as_os_str());
        for arg in cmd.argv() {
            builder.arg(arg);
        }
        if let Ok(cwd) = std::env::current_dir() {
            builder.cwd(cwd);
        }
        for (key, value) in &cmd.env {
            builder.env(key, value);
        }
        builder.env("HEADLESS", "true");
        builder.env("TERM", HEADLESS_TERM);
        builder
    }
}

impl ProcessRunner for PtyRunner {
    fn run(&self, cmd: &SubjectCommand) -> Result<(), HarnessError> {
        tracing::debug!(
            command = %cmd.command_string(),
            rows = self.rows,
            cols = self.cols,
            "running subject in pty"
        );

        let stderr_file = tempfile::NamedTempFile::new()?;

        let pair = native_pty_system()
            .openpty(PtySize {
                rows: self.rows,
                cols: self.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Self::pty_error(cmd, e))?;

        let mut reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Self::pty_error(cmd, e))?;
        let drain = std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            while let Ok(n) = reader.read(&mut buf) {
                if n == 0 {
                    break;
                }
            }
        });

        let mut child = pair
            .slave
            .spawn_command(Self::builder(cmd, stderr_file.path()))
            .map_err(|e| Self::pty_error(cmd, e))?;
        drop(pair.slave);

        let status = child.wait()?;
        drop(pair.master);
        let _ = drain.join();

        let stderr = std::fs::read(stderr_file.path())?;
        let stderr = String::from_utf8_lossy(&stderr).trim_end().to_string();

        if !stderr.is_empty() {
            return Err(HarnessError::Subject {
                command: cmd.command_string(),
                message: stderr,
            });
        }
        if !status.success() {
            return Err(HarnessError::Subject {
                command: cmd.command_string(),
                message: format!("exited with code {}", status.exit_code()),
            });
        }
        Ok(())
    }
}
