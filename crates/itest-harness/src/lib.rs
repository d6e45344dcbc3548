//! Replay/record integration-test engine for a terminal git client.
//!
//! Each test directory carries a fixture script, a recorded input session
//! and a stored copy of the repository the session should leave behind.
//! The [`Harness`] rebuilds the fixture, replays the session through the
//! subject binary and compares text snapshots of the result.

pub mod attempt;
pub mod catalog;
pub mod config;
pub mod driver;
mod error;
pub mod fixture;
mod harness;
pub mod layout;
pub mod log;
pub mod report;
pub mod runner;
pub mod snapshot;
pub mod special_paths;
pub mod speed;

pub use catalog::IntegrationTest;
pub use config::{Mode, RunConfiguration};
pub use error::{ConfigError, HarnessError};
pub use harness::{validate_same_repos, Harness};
pub use layout::{discover_project_root, ProjectLayout, TestPaths};
pub use log::{Logger, TracingLogger};
pub use report::{
    FailureReporter, InlineWrapper, RunSummary, SnapshotMismatch, TestOutcome, TestReport,
    TestWrapper, TracingReporter,
};
pub use runner::{PassthroughRunner, ProcessRunner, PtyRunner};
