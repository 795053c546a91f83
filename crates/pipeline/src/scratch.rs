//! Per-work-unit scratch directories.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::CleanupError;

const UNIT_PREFIX: &str = "unit-";

/// Root under which each work unit gets its own directory.
#[derive(Debug, Clone)]
pub struct ScratchSpace {
    root: PathBuf,
}

impl ScratchSpace {
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Remove unit directories left behind by an interrupted run.
    pub fn sweep(&self) -> usize {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.root.display(), error = %e, "Cannot list scratch root");
                return 0;
            }
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_unit = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.starts_with(UNIT_PREFIX));
            if !is_unit || !path.is_dir() {
                continue;
            }
            match std::fs::remove_dir_all(&path) {
                Ok(()) => removed += 1,
                Err(source) => {
                    let e = CleanupError { path, source };
                    warn!(error = %e, "Failed to sweep stale scratch directory");
                }
            }
        }
        if removed > 0 {
            debug!(removed, "Swept stale scratch directories");
        }
        removed
    }

    /// Create a fresh, uniquely named unit directory.
    pub fn create_unit(&self) -> std::io::Result<ScratchUnit> {
        let dir = tempfile::Builder::new()
            .prefix(UNIT_PREFIX)
            .tempdir_in(&self.root)?;
        Ok(ScratchUnit { dir })
    }
}

/// A unit's scratch directory. Removed by [`close`](Self::close), or on drop.
#[derive(Debug)]
pub struct ScratchUnit {
    dir: TempDir,
}

impl ScratchUnit {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory and its contents.
    pub fn close(self) -> Result<(), CleanupError> {
        let path = self.dir.path().to_path_buf();
        self.dir.close().map_err(|source| CleanupError { path, source })
    }

    /// Close and log any failure at warn.
    pub fn close_logged(self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "Scratch cleanup failed");
        }
    }
}
