//! Core filesystem utilities
//!
//! Shared primitives for the reference stores:
//!
//! - `read_updated`: full-file read with mtime-based freshness detection
//! - `atomic_write`: write-to-lock-file-then-rename commit with an
//!   exclusive advisory lock held while writing
//!
//! Both loose ref files and the `packed-refs` file go through
//! `atomic_write`, so concurrent readers always observe either the pre- or
//! the post-state of a mutation.

use bytes::Bytes;
use file_guard::Lock;
use std::fs::OpenOptions;
use std::io::{self, Read, Write};
use std::ops::DerefMut;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Suffix of the temporary file used by `atomic_write`
pub const LOCK_FILE_SUFFIX: &str = ".lock";

/// File mode for committed ref and packed-refs files on Unix
#[cfg(unix)]
const REFS_FILE_MODE: u32 = 0o644;

/// Read a file fully, skipping the read when the mtime is unchanged
///
/// # Arguments
///
/// * `path` - File to read
/// * `last_mtime` - Modification time recorded by a previous read, if any
///
/// # Returns
///
/// None when the file's mtime equals `last_mtime` (content unchanged),
/// otherwise the full content together with the observed mtime.
pub fn read_updated(
    path: &Path,
    last_mtime: Option<SystemTime>,
) -> io::Result<Option<(Bytes, SystemTime)>> {
    let mut file = std::fs::File::open(path)?;
    let mtime = file.metadata()?.modified()?;

    if last_mtime == Some(mtime) {
        return Ok(None);
    }

    let mut content = Vec::new();
    file.read_to_end(&mut content)?;

    Ok(Some((content.into(), mtime)))
}

/// Stat a file's modification time
pub fn modified_time(path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
}

/// Path of the lock file that guards `path` during an atomic write
pub fn lock_path_for(path: &Path) -> PathBuf {
    let mut lock_path = path.as_os_str().to_os_string();
    lock_path.push(LOCK_FILE_SUFFIX);
    PathBuf::from(lock_path)
}

/// Atomically replace the file at `path` with `content`
///
/// Creates missing parent directories, writes `content` to a sibling
/// `<path>.lock` file while holding an exclusive lock on it, flushes to
/// disk, and renames the lock file into place. On any failure the lock
/// file is removed and the target is left untouched.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let lock_path = lock_path_for(path);
    let result = write_and_commit(path, &lock_path, content);

    if result.is_err() {
        // best effort; the write error is the one worth reporting
        let _ = std::fs::remove_file(&lock_path);
    }

    result
}

fn write_and_commit(path: &Path, lock_path: &Path, content: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(REFS_FILE_MODE);
    }

    let mut lock_file = options.open(lock_path)?;

    {
        let mut lock = file_guard::lock(&mut lock_file, Lock::Exclusive, 0, 1)?;
        lock.deref_mut().write_all(content)?;
        lock.deref_mut().flush()?;
    }

    lock_file.sync_all()?;
    drop(lock_file);

    std::fs::rename(lock_path, path)
}
