use std::path::Path;

use anyhow::{bail, Result};
use clap::Args;
use itest_harness::{Harness, Mode, PassthroughRunner, RunConfiguration};

use super::run::execute;
use super::BinaryArgs;
use crate::Cli;

#[derive(Args)]
pub struct SandboxArgs {
    /// Test whose fixture to open
    pub(crate) name: String,

    #[command(flatten)]
    pub(crate) binary: BinaryArgs,
}

pub fn run(args: &SandboxArgs, cli: &Cli, root: &Path) -> Result<i32> {
    let layout = args.binary.layout(root);
    if !layout.test_paths(&args.name).metadata().is_file() {
        bail!("no such test: {}", args.name);
    }

    let config = RunConfiguration {
        mode: Mode::Sandbox,
        include_skipped: true,
        only: vec![args.name.clone()],
        ..RunConfiguration::default()
    };
    execute(Harness::new(layout, config).runner(&PassthroughRunner), cli)
}
