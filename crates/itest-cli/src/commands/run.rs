use std::io::IsTerminal;
use std::path::Path;

use anyhow::Result;
use clap::Args;
use itest_harness::config::parse_speed;
use itest_harness::{Harness, Mode, PassthroughRunner, ProcessRunner, PtyRunner, RunConfiguration};

use super::BinaryArgs;
use crate::console::{print_summary, ConsoleReporter, ConsoleWrapper};
use crate::Cli;

#[derive(Args)]
pub struct RunArgs {
    /// test, record, updateSnapshot or sandbox (default: $MODE, else test)
    #[arg(long)]
    pub(crate) mode: Option<Mode>,

    /// Replay every test at exactly this speed (default: $SPEED)
    #[arg(long, value_parser = speed_arg)]
    pub(crate) speed: Option<f64>,

    /// Also run tests marked as skipped (default: $INCLUDE_SKIPPED)
    #[arg(long)]
    pub(crate) include_skipped: bool,

    /// Run the subject in a pseudo-terminal with output discarded
    #[arg(long, conflicts_with = "interactive")]
    pub(crate) headless: bool,

    /// Run the subject on this terminal
    #[arg(long)]
    pub(crate) interactive: bool,

    #[command(flatten)]
    pub(crate) binary: BinaryArgs,

    /// Number of shards the catalog is split into (default: $PARALLEL_TOTAL)
    #[arg(long, requires = "parallel_index")]
    pub(crate) parallel_total: Option<usize>,

    /// Shard to run, counting from 0 (default: $PARALLEL_INDEX)
    #[arg(long, requires = "parallel_total")]
    pub(crate) parallel_index: Option<usize>,

    /// Only run these tests
    pub(crate) names: Vec<String>,
}

fn speed_arg(value: &str) -> Result<f64, String> {
    match parse_speed(Some(value)) {
        Ok(Some(speed)) => Ok(speed),
        Ok(None) => Err("speed must not be empty".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

impl RunArgs {
    /// The environment's configuration with command-line flags applied on top.
    fn configuration(&self) -> Result<RunConfiguration> {
        let mut config = match self.mode {
            None => RunConfiguration::from_env()?,
            Some(mode) => RunConfiguration::from_lookup(|key| match key {
                "MODE" => Some(mode.to_string()),
                _ => std::env::var(key).ok(),
            })?,
        };
        if self.speed.is_some() {
            config.speed_override = self.speed;
        }
        if self.include_skipped {
            config.include_skipped = true;
        }
        if let (Some(total), Some(index)) = (self.parallel_total, self.parallel_index) {
            config.parallel_total = total.max(1);
            config.parallel_index = index;
        }
        config.only = self.names.clone();
        Ok(config)
    }

    fn headless(&self) -> bool {
        if self.headless {
            return true;
        }
        if self.interactive {
            return false;
        }
        let no_term = std::env::var_os("TERM").map_or(true, |t| t.is_empty());
        no_term || !std::io::stdin().is_terminal()
    }
}

pub fn run(args: &RunArgs, cli: &Cli, root: &Path) -> Result<i32> {
    let config = args.configuration()?;
    let layout = args.binary.layout(root);
    tracing::debug!(mode = %config.mode, headless = args.headless(), "starting run");

    let pty = PtyRunner::default();
    let runner: &dyn ProcessRunner = if args.headless() { &pty } else { &PassthroughRunner };

    execute(Harness::new(layout, config).runner(runner), cli)
}

/// Run the harness with console output and map the summary to an exit code.
pub(crate) fn execute(harness: Harness<'_>, cli: &Cli) -> Result<i32> {
    let wrapper = ConsoleWrapper::default();
    let reporter = ConsoleReporter {
        full: cli.verbose > 0,
    };
    let summary = harness.wrapper(&wrapper).reporter(&reporter).run_tests()?;

    print_summary(&summary)?;
    Ok(if summary.is_success() { 0 } else { 1 })
}
