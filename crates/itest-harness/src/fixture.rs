use std::path::Path;

use itest_utils::subprocess::ExternalCommand;

use crate::error::HarnessError;

/// Name of the script that materializes a test's starting repository.
pub const SETUP_SCRIPT: &str = "setup.sh";

/// Run `<test_dir>/setup.sh <target>` with bash.
///
/// The script is expected to leave a ready git repository in `target`. A
/// non-zero exit becomes [`HarnessError::Fixture`] carrying the script's
/// combined output.
pub fn create_fixture(test_dir: &Path, target: &Path) -> Result<(), HarnessError> {
    let script = test_dir.join(SETUP_SCRIPT);
    let cmd = ExternalCommand::new("bash").arg(&script).arg(target);
    tracing::debug!(command = %cmd.command_string(), "creating fixture");

    let output = cmd.run()?;
    if !output.success() {
        let mut message = output.combined_lossy();
        if message.is_empty() {
            message = format!("{} exited with {}", script.display(), output.status);
        }
        return Err(HarnessError::Fixture(message));
    }
    Ok(())
}
