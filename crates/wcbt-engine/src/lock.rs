//! Cross-process exclusive lock over a destination root. Acquired before
//! any write-side pipeline (backup, restore); read-side pipelines (Verify,
//! RestorePlan) never take it.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use wcbt_core::clock::Clock;
use wcbt_core::error::{ErrorKind, WcbtError};

const LOCK_FILE_NAME: &str = ".wcbt.lock";

#[derive(Debug, Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    acquired_at: String,
}

/// An exclusive lock held over a destination root for the lifetime of a
/// write-side pipeline. Dropping it releases the OS-level lock but leaves
/// the lock file itself in place (see [`ProfileLock::force_clear`]).
pub struct ProfileLock {
    _file: File,
    path: PathBuf,
}

impl ProfileLock {
    /// Attempts to take the exclusive lock for `destination_root`,
    /// creating the root if it does not yet exist. Contention is reported
    /// as `locked`, not a generic I/O error, so the CLI can map it to its
    /// own exit code immediately.
    pub fn acquire(destination_root: &Path, clock: &dyn Clock) -> Result<Self, WcbtError> {
        std::fs::create_dir_all(destination_root).map_err(|e| {
            WcbtError::with_source(
                ErrorKind::IoError,
                format!("cannot create destination root: {}", destination_root.display()),
                e,
            )
        })?;

        let path = destination_root.join(LOCK_FILE_NAME);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| {
                WcbtError::with_source(ErrorKind::IoError, format!("cannot open lock file: {}", path.display()), e)
            })?;

        file.try_lock_exclusive().map_err(|_| {
            WcbtError::new(
                ErrorKind::Locked,
                format!("destination is locked by another run: {}", destination_root.display()),
            )
        })?;

        let info = LockInfo {
            pid: std::process::id(),
            acquired_at: wcbt_core::clock::rfc3339_utc(clock.now()),
        };
        // Best-effort: lock ownership already holds; failure to record the
        // diagnostic pid/timestamp must not fail the acquire itself.
        if let Ok(bytes) = serde_json::to_vec(&info) {
            let _ = std::fs::write(&path, bytes);
        }

        Ok(Self { _file: file, path })
    }

    /// Reads back the owner info of a lock file without attempting to
    /// acquire it. Used for stale-lock diagnosis by an operator, never by
    /// the pipelines themselves.
    pub fn inspect(destination_root: &Path) -> Option<(u32, String)> {
        let path = destination_root.join(LOCK_FILE_NAME);
        let bytes = std::fs::read(path).ok()?;
        let info: LockInfo = serde_json::from_slice(&bytes).ok()?;
        Some((info.pid, info.acquired_at))
    }

    /// Explicit, caller-invoked removal of a lock file. Never called
    /// automatically by any pipeline, since stale-lock recovery is a human
    /// decision per the design.
    pub fn force_clear(destination_root: &Path) -> Result<(), WcbtError> {
        let path = destination_root.join(LOCK_FILE_NAME);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WcbtError::with_source(
                ErrorKind::IoError,
                format!("cannot remove lock file: {}", path.display()),
                e,
            )),
        }
    }
}

impl Drop for ProfileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self._file);
        let _ = &self.path;
    }
}
