use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use itest_harness::catalog::load_tests;
use itest_harness::driver::has_config_override;
use itest_harness::ProjectLayout;

pub fn run(root: &Path) -> Result<i32> {
    let layout = ProjectLayout::new(root);
    let tests = load_tests(&layout.tests_dir)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let width = tests.iter().map(|t| t.name.len()).max().unwrap_or(0);
    for test in &tests {
        let mut flags = String::new();
        if test.skip {
            flags.push_str(" [skip]");
        }
        if has_config_override(&layout.test_paths(&test.name).test_dir) {
            flags.push_str(" [config]");
        }
        writeln!(out, "{:<width$}  {}{}", test.name, test.description, flags)?;
    }

    Ok(0)
}
