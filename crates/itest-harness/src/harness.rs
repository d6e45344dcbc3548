//! The test orchestrator.
//!
//! For every selected test the orchestrator rebuilds the working repository
//! from the fixture script, runs the subject against it and then, depending
//! on the mode, compares the result with the stored snapshot or stores it.
//! Comparison failures move down the speed ladder until it runs out.

use std::path::Path;

use itest_utils::fs::{
    clear_dir, copy_dir, ensure_dir, list_dir, path_exists, remove_dir_if_exists,
};
use itest_utils::subprocess::ExternalCommand;

use crate::attempt::{AttemptResult, AttemptState, RetryController};
use crate::catalog::{load_tests, select_tests, IntegrationTest};
use crate::config::{Mode, RunConfiguration};
use crate::driver::{format_speed, subject_command};
use crate::error::HarnessError;
use crate::fixture::create_fixture;
use crate::layout::{ProjectLayout, TestPaths};
use crate::log::{Logger, TracingLogger};
use crate::report::{
    FailureReporter, InlineWrapper, RunSummary, SnapshotMismatch, TestOutcome, TestReport,
    TestWrapper, TracingReporter,
};
use crate::runner::{PassthroughRunner, ProcessRunner};
use crate::snapshot::generate_snapshots;
use crate::special_paths::rename_special_paths;
use crate::speed::test_speeds;

/// Runs the integration tests of one project.
pub struct Harness<'a> {
    layout: ProjectLayout,
    config: RunConfiguration,
    logger: &'a dyn Logger,
    runner: &'a dyn ProcessRunner,
    wrapper: &'a dyn TestWrapper,
    reporter: &'a dyn FailureReporter,
}

impl<'a> Harness<'a> {
    /// A harness that logs through `tracing`, runs the subject on the
    /// current terminal and reports mismatches as ERROR events.
    pub fn new(layout: ProjectLayout, config: RunConfiguration) -> Self {
        Self {
            layout,
            config,
            logger: &TracingLogger,
            runner: &PassthroughRunner,
            wrapper: &InlineWrapper,
            reporter: &TracingReporter,
        }
    }

    pub fn logger(mut self, logger: &'a dyn Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn runner(mut self, runner: &'a dyn ProcessRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn wrapper(mut self, wrapper: &'a dyn TestWrapper) -> Self {
        self.wrapper = wrapper;
        self
    }

    pub fn reporter(mut self, reporter: &'a dyn FailureReporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Build the subject, load the catalog and run every selected test in
    /// catalog order.
    ///
    /// Returns early with the error when it is fatal to the run (see
    /// [`HarnessError::is_run_fatal`]); any other error only ends its test
    /// and is recorded in the summary.
    pub fn run_tests(&self) -> Result<RunSummary, HarnessError> {
        self.check_root()?;
        self.build_subject()?;

        let tests = select_tests(load_tests(&self.layout.tests_dir)?, &self.config);
        tracing::debug!(count = tests.len(), mode = %self.config.mode, "running tests");

        let mut summary = RunSummary::default();
        for test in &tests {
            let result = if test.skip && !self.config.include_skipped {
                self.logger.log(&format!("skipping test: {}", test.name));
                Ok(TestOutcome::Skipped)
            } else {
                self.wrapper.wrap(test, &mut || self.run_test(test))
            };

            let result = match result {
                Err(e) if e.is_run_fatal() => return Err(e),
                other => other,
            };
            if let Err(e) = &result {
                self.logger.log(&format!("{}: {e}", test.name));
            }

            summary.reports.push(TestReport {
                name: test.name.clone(),
                result,
            });
        }

        Ok(summary)
    }

    fn check_root(&self) -> Result<(), HarnessError> {
        let root = &self.layout.root;
        match std::fs::metadata(root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(HarnessError::EnterRoot {
                path: root.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
            }),
            Err(source) => Err(HarnessError::EnterRoot {
                path: root.clone(),
                source,
            }),
        }
    }

    fn build_subject(&self) -> Result<(), HarnessError> {
        let Some(build) = &self.layout.build else {
            return Ok(());
        };
        let command = build.command_string();
        tracing::debug!(%command, "building subject");

        let output = ExternalCommand::new(&build.program)
            .args(&build.args)
            .working_dir(&self.layout.root)
            .run()
            .map_err(|e| HarnessError::Build {
                command: command.clone(),
                output: e.to_string(),
            })?;
        if !output.success() {
            return Err(HarnessError::Build {
                command,
                output: output.combined_lossy(),
            });
        }
        Ok(())
    }

    /// Drive one test through its attempts.
    fn run_test(&self, test: &IntegrationTest) -> Result<TestOutcome, HarnessError> {
        let mode = self.config.mode;
        let paths = self.layout.test_paths(&test.name);
        let speeds = test_speeds(test.speed, mode, self.config.speed_override);
        let mut ctl = RetryController::new(speeds);
        let mut mismatches = Vec::new();

        self.logger.log(&format!("path: {}", paths.test_dir.display()));

        while let Some((index, speed)) = ctl.begin() {
            if !matches!(mode, Mode::Sandbox | Mode::Record) {
                self.logger.log(&format!(
                    "{}: attempting test at speed {}",
                    test.name,
                    format_speed(speed)
                ));
            }
            tracing::debug!(test = %test.name, index, speed, "attempt");

            let last = ctl.is_last_attempt();
            let result = self.attempt(test, &paths, speed, last, &mut mismatches)?;
            if result == AttemptResult::Matched {
                self.logger.log(&format!(
                    "{}: success at speed {}",
                    test.name,
                    format_speed(speed)
                ));
            }
            ctl.finish(result);
        }
        debug_assert!(ctl.state().is_terminal());

        let AttemptState::Success { index, speed } = ctl.state() else {
            self.log_development_log(&paths);
            for mismatch in &mismatches {
                self.reporter.report(mismatch);
            }
            return Ok(TestOutcome::Failed {
                attempts: ctl.attempts(),
                repos: mismatches.into_iter().map(|m| m.repo).collect(),
            });
        };

        Ok(match mode {
            Mode::Test => TestOutcome::Passed {
                speed,
                attempts: index + 1,
            },
            Mode::Record | Mode::UpdateSnapshot => TestOutcome::SnapshotUpdated,
            Mode::Sandbox => TestOutcome::Sandboxed,
        })
    }

    /// One attempt at one speed: reset the working directories, build the
    /// fixture, run the subject and deal with the result.
    fn attempt(
        &self,
        test: &IntegrationTest,
        paths: &TestPaths,
        speed: f64,
        last: bool,
        mismatches: &mut Vec<SnapshotMismatch>,
    ) -> Result<AttemptResult, HarnessError> {
        let mode = self.config.mode;
        let actual_dir = paths.actual_dir();
        let actual_repo = paths.actual_repo_dir();

        ensure_dir(&paths.test_dir)?;
        clear_dir(&actual_dir)?;
        ensure_dir(&actual_repo)?;

        create_fixture(&paths.test_dir, &actual_repo)?;

        let cmd = subject_command(paths, &self.layout, mode, speed, &test.extra_cmd_args)?;
        self.runner.run(&cmd)?;

        if !mode.writes_snapshot() {
            return self.compare(test, paths, last, mismatches);
        }

        let expected_dir = paths.expected_dir();
        remove_dir_if_exists(&expected_dir)?;
        copy_dir(&actual_dir, &expected_dir)?;
        rename_special_paths(&expected_dir)?;
        self.logger.log("updated snapshot");
        Ok(AttemptResult::SnapshotWritten)
    }

    /// Compare every repo under `actual/` with its stored counterpart.
    ///
    /// Stops at the first differing repo unless this is the last attempt,
    /// where every mismatch is collected for reporting.
    fn compare(
        &self,
        test: &IntegrationTest,
        paths: &TestPaths,
        last: bool,
        mismatches: &mut Vec<SnapshotMismatch>,
    ) -> Result<AttemptResult, HarnessError> {
        let expected_dir = paths.expected_dir();
        let actual_dir = paths.actual_dir();

        validate_same_repos(&expected_dir, &actual_dir)?;

        mismatches.clear();
        for entry in list_dir(&expected_dir)? {
            if !entry.is_dir {
                return Err(HarnessError::UnexpectedFile(expected_dir.join(&entry.name)));
            }

            let pair = generate_snapshots(
                &actual_dir.join(&entry.name),
                &expected_dir.join(&entry.name),
            )?;
            if pair.matches() {
                continue;
            }

            tracing::debug!(test = %test.name, repo = %entry.name, "snapshot differs");
            mismatches.push(SnapshotMismatch {
                test: test.name.clone(),
                repo: entry.name,
                expected: pair.expected,
                actual: pair.actual,
            });
            if !last {
                break;
            }
        }

        Ok(if mismatches.is_empty() {
            AttemptResult::Matched
        } else {
            AttemptResult::Mismatched
        })
    }

    fn log_development_log(&self, paths: &TestPaths) {
        let log_path = paths.development_log();
        match std::fs::read(&log_path) {
            Ok(bytes) => self.logger.log(&String::from_utf8_lossy(&bytes)),
            Err(e) => self.logger.log(&format!(
                "no development log at {}: {e}",
                log_path.display()
            )),
        }
    }
}

/// Check that `expected_dir` and `actual_dir` hold the same entry names.
///
/// A missing `expected_dir` counts as empty, so a test that was never
/// recorded fails here instead of aborting the run.
pub fn validate_same_repos(expected_dir: &Path, actual_dir: &Path) -> Result<(), HarnessError> {
    let expected = entry_names(expected_dir)?;
    let actual = entry_names(actual_dir)?;
    if expected != actual {
        return Err(HarnessError::RepoMismatch { expected, actual });
    }
    Ok(())
}

fn entry_names(dir: &Path) -> Result<Vec<String>, HarnessError> {
    if !path_exists(dir)? {
        return Ok(Vec::new());
    }
    Ok(list_dir(dir)?.into_iter().map(|e| e.name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn same_repos_pass() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().join("expected");
        let actual = dir.path().join("actual");
        for d in [&expected, &actual] {
            fs::create_dir_all(d.join("repo")).unwrap();
            fs::create_dir_all(d.join("other")).unwrap();
        }
        validate_same_repos(&expected, &actual).unwrap();
    }

    #[test]
    fn extra_actual_repo_is_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let expected = dir.path().join("expected");
        let actual = dir.path().join("actual");
        fs::create_dir_all(expected.join("repoA")).unwrap();
        fs::create_dir_all(actual.join("repoA")).unwrap();
        fs::create_dir_all(actual.join("repoB")).unwrap();

        match validate_same_repos(&expected, &actual).unwrap_err() {
            HarnessError::RepoMismatch { expected, actual } => {
                assert_eq!(expected, vec!["repoA"]);
                assert_eq!(actual, vec!["repoA", "repoB"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_expected_dir_is_a_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let actual = dir.path().join("actual");
        fs::create_dir_all(actual.join("repo")).unwrap();

        let err = validate_same_repos(&dir.path().join("expected"), &actual).unwrap_err();
        assert!(matches!(err, HarnessError::RepoMismatch { .. }));
        assert!(!err.is_run_fatal());
    }

    #[test]
    fn missing_root_is_fatal() {
        let layout =
            ProjectLayout::new("/nonexistent/itest-root").with_prebuilt_binary("/bin/true");
        let err = Harness::new(layout, RunConfiguration::default())
            .run_tests()
            .unwrap_err();
        assert!(matches!(err, HarnessError::EnterRoot { .. }));
        assert!(err.is_run_fatal());
    }

    #[test]
    fn failing_build_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut layout = ProjectLayout::new(dir.path());
        layout.build = Some(crate::layout::BuildCommand {
            program: "sh".into(),
            args: vec!["-c".into(), "echo cannot compile >&2; exit 1".into()],
        });

        match Harness::new(layout, RunConfiguration::default()).run_tests() {
            Err(HarnessError::Build { command, output }) => {
                assert!(command.starts_with("sh -c"));
                assert_eq!(output, "cannot compile");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
