//! Whole-file output writes.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::{LangError, LangResult};

/// Write `bytes` to `path` so that readers see either the old file or the complete new one.
///
/// The data goes to a temporary file in the destination directory first, which is then
/// renamed over `path`. Nothing is left behind on failure.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> LangResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| LangError::Io(e.error))?;
    Ok(())
}

/// Create `dir` (and parents) unless it already exists.
pub fn ensure_dir(dir: &Path) -> LangResult<()> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}
