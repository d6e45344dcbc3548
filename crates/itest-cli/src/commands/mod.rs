pub mod list;
pub mod manage;
pub mod run;
pub mod sandbox;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};
use itest_harness::ProjectLayout;

use crate::Cli;

#[derive(Subcommand)]
pub enum Commands {
    /// Run integration tests
    Run(run::RunArgs),
    /// Open the subject on a test's fixture, then compare without recording
    Sandbox(sandbox::SandboxArgs),
    /// List the tests in the catalog
    List,
    /// Copy a test to <NAME>_Copy
    Duplicate(manage::NameArgs),
    /// Rename a test
    Rename(manage::RenameArgs),
    /// Delete a test and everything in its directory
    Delete(manage::NameArgs),
}

/// How the subject binary is obtained.
#[derive(Args, Debug, Clone, Default)]
pub struct BinaryArgs {
    /// Use this subject binary instead of building one
    #[arg(long, value_name = "PATH")]
    binary: Option<PathBuf>,

    /// Do not build the subject; use the binary already at the default path
    #[arg(long)]
    no_build: bool,
}

impl BinaryArgs {
    pub fn layout(&self, root: &Path) -> ProjectLayout {
        let layout = ProjectLayout::new(root);
        match &self.binary {
            Some(binary) => layout.with_prebuilt_binary(binary),
            None if self.no_build => {
                let binary = layout.subject_binary.clone();
                layout.with_prebuilt_binary(binary)
            }
            None => layout,
        }
    }
}

pub fn run(cli: &Cli, root: &Path) -> Result<i32> {
    match &cli.command {
        Commands::Run(args) => run::run(args, cli, root),
        Commands::Sandbox(args) => sandbox::run(args, cli, root),
        Commands::List => list::run(root),
        Commands::Duplicate(args) => manage::duplicate(args, root),
        Commands::Rename(args) => manage::rename(args, root),
        Commands::Delete(args) => manage::delete(args, root),
    }
}
