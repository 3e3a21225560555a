//! Filesystem device identity, used by RestoreStage's `cross_device_stage`
//! pre-flight check: the stage root and the restore destination must share a
//! device for the final promotion rename to be atomic.

use std::path::Path;

#[cfg(unix)]
pub fn device_id(path: &Path) -> std::io::Result<u64> {
    use std::os::unix::fs::MetadataExt;
    Ok(std::fs::metadata(path)?.dev())
}

#[cfg(windows)]
pub fn device_id(path: &Path) -> std::io::Result<u64> {
    use file_id::{FileId, get_file_id};
    match get_file_id(path)? {
        FileId::HighRes { volume_serial_number, .. } => Ok(volume_serial_number),
        FileId::LowRes { volume_serial_number, .. } => Ok(volume_serial_number as u64),
    }
}

/// Walks up from `path` to the nearest existing ancestor and returns its
/// device id. A restore destination frequently does not exist yet, so the
/// comparison is made against whichever parent directory is actually there.
pub fn device_id_of_nearest_existing(path: &Path) -> std::io::Result<u64> {
    let mut current = path;
    loop {
        match device_id(current) {
            Ok(id) => return Ok(id),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => match current.parent() {
                Some(parent) => current = parent,
                None => return Err(e),
            },
            Err(e) => return Err(e),
        }
    }
}
