//! Write-then-rename file output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{RenderError, RenderResult};

/// Temporary sibling used while `path` is being written.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

/// Run `write` against a buffered temp file, then rename it onto `path`.
/// The temp file is removed if anything fails.
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> RenderResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> RenderResult<()>,
{
    let tmp = temp_path(path);
    let result = write_then_rename(&tmp, path, write);
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp);
    }
    result
}

fn write_then_rename<F>(tmp: &Path, path: &Path, write: F) -> RenderResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> RenderResult<()>,
{
    let mut writer = BufWriter::new(File::create(tmp)?);
    write(&mut writer)?;
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| RenderError::Io(e.into_error()))?
        .sync_all()?;
    std::fs::rename(tmp, path)?;
    Ok(())
}
