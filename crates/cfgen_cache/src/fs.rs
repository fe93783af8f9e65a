//! Atomic file publication.

use std::io::Write;
use std::path::Path;

use crate::error::CacheError;

/// Writes `bytes` to `path` so that readers see either the old file or the
/// complete new one.
///
/// The data goes to a temporary file in the destination directory, is
/// synced, then renamed over `path`. Parent directories are created.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), CacheError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CacheError::io(dir, e))?;
    temp.as_file_mut()
        .write_all(bytes)
        .map_err(|e| CacheError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| CacheError::io(temp.path(), e))?;
    temp.persist(path)
        .map_err(|e| CacheError::io(path, e.error))?;
    Ok(())
}
