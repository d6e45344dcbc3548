use std::path::PathBuf;

/// Errors from reading the run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "unknown test mode: {0}, must be one of [test, record, updateSnapshot, sandbox]"
    )]
    UnknownMode(String),

    #[error("invalid speed value: {0}")]
    InvalidSpeed(String),

    #[error("invalid boolean value for {var}: {value}")]
    InvalidBool { var: String, value: String },
}

/// Errors from running integration tests.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error(
        "must run in a project folder or child folder (no .git found above {0})"
    )]
    RootNotFound(PathBuf),

    #[error("cannot enter project root '{path}': {source}")]
    EnterRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build subject binary with `{command}`:\n{output}")]
    Build { command: String, output: String },

    #[error("test catalog: {0}")]
    Catalog(String),

    #[error("malformed test metadata {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("fixture setup failed:\n{0}")]
    Fixture(String),

    #[error("subject `{command}` failed: {message}")]
    Subject { command: String, message: String },

    #[error(
        "expected and actual repo dirs do not match: expected: {expected:?}, actual: {actual:?}"
    )]
    RepoMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error(
        "unexpected file (as opposed to directory) in integration test 'expected' directory: {0}"
    )]
    UnexpectedFile(PathBuf),

    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot rename '{from}' to '{to}': {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pseudo-terminal: {0}")]
    Pty(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Util(#[from] itest_utils::UtilError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl HarnessError {
    /// Whether this error aborts the whole run rather than a single test.
    ///
    /// Filesystem errors are fatal wherever they occur; a failing fixture
    /// script, a crashing subject, or a structural mismatch between the
    /// expected and actual repos only ends the current test.
    pub fn is_run_fatal(&self) -> bool {
        !matches!(
            self,
            HarnessError::Fixture(_)
                | HarnessError::Subject { .. }
                | HarnessError::RepoMismatch { .. }
                | HarnessError::UnexpectedFile(_)
                | HarnessError::Pty(_)
        )
    }
}
