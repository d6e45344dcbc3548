//! Test outcomes and the caller-supplied hooks that surface them.

use std::fmt;

use bstr::BString;

use crate::catalog::IntegrationTest;
use crate::error::HarnessError;
use crate::snapshot::first_difference;

/// A repo whose snapshot still differed after the last speed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMismatch {
    pub test: String,
    /// Name of the repo directory under `expected/` and `actual/`.
    pub repo: String,
    pub expected: BString,
    pub actual: BString,
}

/// Receives the final mismatch of a failed test.
pub trait FailureReporter {
    fn report(&self, mismatch: &SnapshotMismatch);
}

impl<F> FailureReporter for F
where
    F: Fn(&SnapshotMismatch),
{
    fn report(&self, mismatch: &SnapshotMismatch) {
        self(mismatch)
    }
}

/// Logs the first differing line of each mismatch at ERROR level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, mismatch: &SnapshotMismatch) {
        match first_difference(&mismatch.expected, &mismatch.actual) {
            Some((line, expected, actual)) => tracing::error!(
                test = %mismatch.test,
                repo = %mismatch.repo,
                line,
                expected = %expected,
                actual = %actual,
                "snapshot mismatch"
            ),
            None => tracing::error!(
                test = %mismatch.test,
                repo = %mismatch.repo,
                "snapshot mismatch"
            ),
        }
    }
}

/// How a test finished.
#[derive(Debug, Clone, PartialEq)]
pub enum TestOutcome {
    /// Marked `skip` and skipped tests were not included.
    Skipped,
    /// Snapshots matched.
    Passed { speed: f64, attempts: usize },
    /// Every speed was tried and these repos still differed.
    Failed { attempts: usize, repos: Vec<String> },
    /// The stored snapshot was rewritten from the actual result.
    SnapshotUpdated,
    /// Sandbox session finished.
    Sandboxed,
}

impl TestOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, TestOutcome::Failed { .. })
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Skipped => write!(f, "skipped"),
            TestOutcome::Passed { speed, attempts } => {
                write!(f, "passed at speed {speed} (attempt {attempts})")
            }
            TestOutcome::Failed { attempts, repos } => {
                let repos = repos.join(", ");
                write!(f, "failed after {attempts} attempts ({repos})")
            }
            TestOutcome::SnapshotUpdated => write!(f, "snapshot updated"),
            TestOutcome::Sandboxed => write!(f, "sandbox finished"),
        }
    }
}

/// Brackets the execution of each test.
///
/// The body performs the whole test; the wrapper decides what surrounds it
/// (headers, timing, a test framework's sub-test) and passes its result on.
pub trait TestWrapper {
    fn wrap(
        &self,
        test: &IntegrationTest,
        body: &mut dyn FnMut() -> Result<TestOutcome, HarnessError>,
    ) -> Result<TestOutcome, HarnessError>;
}

/// Runs the body with nothing around it.
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineWrapper;

impl TestWrapper for InlineWrapper {
    fn wrap(
        &self,
        _test: &IntegrationTest,
        body: &mut dyn FnMut() -> Result<TestOutcome, HarnessError>,
    ) -> Result<TestOutcome, HarnessError> {
        body()
    }
}

/// Result of one test within a run.
#[derive(Debug)]
pub struct TestReport {
    pub name: String,
    pub result: Result<TestOutcome, HarnessError>,
}

/// Results of every selected test, in execution order.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub reports: Vec<TestReport>,
}

impl RunSummary {
    fn count(&self, pred: impl Fn(&Result<TestOutcome, HarnessError>) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.result)).count()
    }

    pub fn passed(&self) -> usize {
        self.count(|r| {
            matches!(
                r,
                Ok(TestOutcome::Passed { .. }
                    | TestOutcome::SnapshotUpdated
                    | TestOutcome::Sandboxed)
            )
        })
    }

    pub fn failed(&self) -> usize {
        self.count(|r| matches!(r, Ok(TestOutcome::Failed { .. })))
    }

    pub fn errored(&self) -> usize {
        self.count(|r| r.is_err())
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, Ok(TestOutcome::Skipped)))
    }

    /// No test failed or errored.
    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.errored() == 0
    }

    pub fn get(&self, name: &str) -> Option<&TestReport> {
        self.reports.iter().find(|r| r.name == name)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} errored, {} skipped",
            self.passed(),
            self.failed(),
            self.errored(),
            self.skipped()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(name: &str, result: Result<TestOutcome, HarnessError>) -> TestReport {
        TestReport {
            name: name.to_string(),
            result,
        }
    }

    #[test]
    fn summary_counts() {
        let summary = RunSummary {
            reports: vec![
                report(
                    "a",
                    Ok(TestOutcome::Passed {
                        speed: 10.0,
                        attempts: 1,
                    }),
                ),
                report("b", Ok(TestOutcome::Skipped)),
                report(
                    "c",
                    Ok(TestOutcome::Failed {
                        attempts: 4,
                        repos: vec!["repo".into()],
                    }),
                ),
                report("d", Err(HarnessError::Fixture("boom".into()))),
                report("e", Ok(TestOutcome::SnapshotUpdated)),
            ],
        };

        assert_eq!(summary.passed(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.errored(), 1);
        assert_eq!(summary.skipped(), 1);
        assert!(!summary.is_success());
        assert_eq!(
            summary.to_string(),
            "2 passed, 1 failed, 1 errored, 1 skipped"
        );
        let failed = summary.get("c").unwrap().result.as_ref().unwrap();
        assert!(failed.is_failure());
    }

    #[test]
    fn empty_summary_is_success() {
        assert!(RunSummary::default().is_success());
    }

    #[test]
    fn inline_wrapper_passes_result_through() {
        let test = IntegrationTest::default();
        let mut calls = 0;
        let result = InlineWrapper.wrap(&test, &mut || {
            calls += 1;
            Ok::<_, HarnessError>(TestOutcome::Sandboxed)
        });
        assert_eq!(result.unwrap(), TestOutcome::Sandboxed);
        assert_eq!(calls, 1);
    }

    #[test]
    fn outcome_display() {
        let outcome = TestOutcome::Failed {
            attempts: 4,
            repos: vec!["repo".into(), "other".into()],
        };
        assert_eq!(
            outcome.to_string(),
            "failed after 4 attempts (repo, other)"
        );
    }
}
