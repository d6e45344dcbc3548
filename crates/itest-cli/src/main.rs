mod commands;
mod console;

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{error::ErrorKind, ArgAction, Parser};
use tracing::Level;

use commands::Commands;

#[derive(Parser)]
#[command(
    name = "itest",
    about = "Replay and record lazygit integration tests",
    version = env!("CARGO_PKG_VERSION")
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Project root (default: the nearest directory above the current one holding .git)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Show more diagnostics (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only show warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> Level {
        if self.quiet {
            return Level::WARN;
        }
        match self.verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn init_tracing(level: Level) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .try_init();
}

/// Resolve the project root and make it the working directory.
fn enter_project_root(cli: &Cli) -> Result<PathBuf> {
    let start = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("cannot read current directory")?,
    };
    let start = start
        .canonicalize()
        .with_context(|| format!("cannot access '{}'", start.display()))?;
    let root = itest_harness::discover_project_root(&start)?;
    std::env::set_current_dir(&root)
        .with_context(|| format!("cannot change to '{}'", root.display()))?;
    tracing::debug!(root = %root.display(), "entered project root");
    Ok(root)
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => process::exit(0),
                _ => process::exit(128),
            }
        }
    };

    init_tracing(cli.log_level());

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("fatal: {e:#}");
            process::exit(128);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let root = enter_project_root(&cli)?;
    commands::run(&cli, &root)
}
