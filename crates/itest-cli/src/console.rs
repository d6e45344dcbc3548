//! Console presentation of a run: per-test headers, mismatch reports and
//! the closing summary.

use std::io::{self, Write};
use std::time::Instant;

use bstr::ByteSlice;
use itest_harness::snapshot::first_difference;
use itest_harness::{
    FailureReporter, HarnessError, IntegrationTest, RunSummary, SnapshotMismatch, TestOutcome,
    TestWrapper,
};

/// Prints a header before each test and its verdict and duration after.
#[derive(Debug, Default)]
pub struct ConsoleWrapper;

fn verdict(result: &Result<TestOutcome, HarnessError>) -> &'static str {
    match result {
        Ok(TestOutcome::Passed { .. }) => "PASS",
        Ok(TestOutcome::Failed { .. }) => "FAIL",
        Ok(TestOutcome::Skipped) => "SKIP",
        Ok(TestOutcome::SnapshotUpdated) => "UPDATED",
        Ok(TestOutcome::Sandboxed) => "DONE",
        Err(_) => "ERROR",
    }
}

impl TestWrapper for ConsoleWrapper {
    fn wrap(
        &self,
        test: &IntegrationTest,
        body: &mut dyn FnMut() -> Result<TestOutcome, HarnessError>,
    ) -> Result<TestOutcome, HarnessError> {
        writeln!(io::stdout(), "=== RUN   {}", test.name)?;
        let start = Instant::now();

        let result = body();

        let elapsed = start.elapsed().as_secs_f64();
        let (verdict, name) = (verdict(&result), &test.name);
        let mut out = io::stdout().lock();
        match &result {
            Ok(outcome) => writeln!(out, "--- {verdict}: {name} ({elapsed:.2}s) {outcome}")?,
            Err(_) => writeln!(out, "--- {verdict}: {name} ({elapsed:.2}s)")?,
        }
        result
    }
}

/// Writes each final mismatch to stderr.
///
/// Shows the first differing line; with `full` both snapshots follow in
/// their entirety.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    pub full: bool,
}

impl ConsoleReporter {
    fn write(&self, out: &mut impl Write, mismatch: &SnapshotMismatch) -> io::Result<()> {
        write!(
            out,
            "{}: snapshot of '{}' does not match",
            mismatch.test, mismatch.repo
        )?;
        match first_difference(&mismatch.expected, &mismatch.actual) {
            Some((line, expected, actual)) => {
                writeln!(out, " at line {line}")?;
                writeln!(out, "  expected: {}", expected.as_bstr())?;
                writeln!(out, "  actual:   {}", actual.as_bstr())?;
            }
            None => writeln!(out)?,
        }
        if self.full {
            writeln!(out, "--- expected")?;
            out.write_all(&mismatch.expected)?;
            writeln!(out, "\n--- actual")?;
            out.write_all(&mismatch.actual)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

impl FailureReporter for ConsoleReporter {
    fn report(&self, mismatch: &SnapshotMismatch) {
        let mut err = io::stderr().lock();
        if let Err(e) = self.write(&mut err, mismatch) {
            tracing::warn!("cannot write mismatch report: {e}");
        }
    }
}

/// Print the tests that did not pass, then the totals.
pub fn print_summary(summary: &RunSummary) -> io::Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out)?;
    for report in &summary.reports {
        match &report.result {
            Ok(outcome) if outcome.is_failure() => writeln!(out, "FAIL  {}: {outcome}", report.name)?,
            Err(e) => writeln!(out, "ERROR {}: {e}", report.name)?,
            _ => {}
        }
    }
    writeln!(out, "{summary}")
}
