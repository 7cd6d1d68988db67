//! Crash-safe file writes
//!
//! Content is written to a temporary file in the destination directory,
//! synced, and renamed over the destination in one step. Readers observe
//! either the old or the new file, never a partial one. The temporary file
//! is removed by `NamedTempFile`'s drop guard on every failure path.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::trace;

/// Atomically replace `path` with `content`
pub fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let temp = write_temp(path, content)?;
    temp.persist(path).map_err(|e| e.error)?;
    sync_parent(path);
    trace!(path = %path.display(), bytes = content.len(), "Atomic write complete");
    Ok(())
}

/// Atomically create `path`, failing with `AlreadyExists` if it is present
///
/// The existence check and the rename are a single `link`-based operation,
/// so two racing creators cannot both succeed.
pub fn create_atomic(path: &Path, content: &str) -> io::Result<()> {
    let temp = write_temp(path, content)?;
    temp.persist_noclobber(path).map_err(|e| e.error)?;
    sync_parent(path);
    trace!(path = %path.display(), bytes = content.len(), "Atomic create complete");
    Ok(())
}

fn write_temp(path: &Path, content: &str) -> io::Result<NamedTempFile> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    let mut temp = tempfile::Builder::new()
        .prefix(".persona-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    Ok(temp)
}

/// Persist the rename itself; best effort, not all platforms allow it
fn sync_parent(path: &Path) {
    #[cfg(unix)]
    {
        if let Some(dir) = path.parent() {
            if let Ok(dir) = File::open(dir) {
                let _ = dir.sync_all();
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}

/// Remove stray temporary files left by a process killed mid-write
pub fn sweep_temp_files(dir: &Path) -> io::Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(".persona-") && name.ends_with(".tmp") {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
