use std::path::PathBuf;

/// Base error type for itest-utils operations.
#[derive(Debug, thiserror::Error)]
pub enum UtilError {
    #[error("subprocess failed: {command}: {source}")]
    Subprocess {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot copy '{from}' to '{to}': {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
