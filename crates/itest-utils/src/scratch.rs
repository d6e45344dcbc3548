use std::path::Path;

use crate::fs::copy_dir;
use crate::Result;

/// A throwaway copy of a directory tree with RAII cleanup.
///
/// The copy is created next to the source (in the source's parent
/// directory) so it lives on the same filesystem. It is removed when the
/// `ScratchCopy` is dropped, on every exit path.
pub struct ScratchCopy {
    inner: ::tempfile::TempDir,
}

impl ScratchCopy {
    /// Copy `src` into a fresh sibling directory whose name starts with `prefix`.
    pub fn of(src: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let src = src.as_ref();
        let parent = src.parent().unwrap_or(Path::new("."));
        let mut builder = ::tempfile::Builder::new();
        let inner = builder.prefix(prefix).tempdir_in(parent)?;
        copy_dir(src, inner.path())?;
        tracing::trace!(from = %src.display(), to = %inner.path().display(), "scratch copy");
        Ok(Self { inner })
    }

    /// Get the path of the copy.
    pub fn path(&self) -> &Path {
        self.inner.path()
    }
}
