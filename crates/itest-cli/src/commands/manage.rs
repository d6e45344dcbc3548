use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use clap::Args;
use itest_harness::catalog::{delete_test, duplicate_test, rename_test};
use itest_harness::ProjectLayout;

#[derive(Args)]
pub struct NameArgs {
    /// Test name (its directory under test/integration)
    pub(crate) name: String,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Current test name
    pub(crate) name: String,
    /// New test name
    pub(crate) new_name: String,
}

fn tests_dir(root: &Path) -> std::path::PathBuf {
    ProjectLayout::new(root).tests_dir
}

pub fn duplicate(args: &NameArgs, root: &Path) -> Result<i32> {
    let new_name = duplicate_test(&tests_dir(root), &args.name)?;
    writeln!(io::stdout(), "Duplicated '{}' to '{}'", args.name, new_name)?;
    Ok(0)
}

pub fn rename(args: &RenameArgs, root: &Path) -> Result<i32> {
    rename_test(&tests_dir(root), &args.name, &args.new_name)?;
    writeln!(io::stdout(), "Renamed '{}' to '{}'", args.name, args.new_name)?;
    Ok(0)
}

pub fn delete(args: &NameArgs, root: &Path) -> Result<i32> {
    delete_test(&tests_dir(root), &args.name)?;
    writeln!(io::stdout(), "Deleted '{}'", args.name)?;
    Ok(0)
}
