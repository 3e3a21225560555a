//! Walks the source tree depth-first with directories sorted, yielding
//! `(abs, rel)` pairs for regular files only. Hidden files are included;
//! symlinks are rejected outright rather than silently skipped or
//! followed.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use wcbt_core::error::{ErrorKind, WcbtError};

#[derive(Debug, Clone)]
pub struct ScanEntry {
    pub abs: PathBuf,
    pub rel: String,
}

/// Scans `source_root` and returns every regular file under it, in
/// deterministic directory-sorted depth-first order. Encountering any
/// symlink anywhere in the tree aborts the whole scan with
/// `unsupported_entry` before any file is copied. This is a pre-flight
/// check, not a per-file skip.
pub fn scan(source_root: &Path) -> Result<Vec<ScanEntry>, WcbtError> {
    let mut entries = Vec::new();

    let walker = WalkDir::new(source_root)
        .follow_links(false)
        .sort_by(|a, b| a.file_name().cmp(b.file_name()));

    for item in walker {
        let item = item.map_err(|e| {
            let path = e.path().map(Path::to_path_buf);
            WcbtError::with_source(
                ErrorKind::IoError,
                format!(
                    "walk error{}",
                    path.map(|p| format!(": {}", p.display())).unwrap_or_default()
                ),
                e,
            )
        })?;

        if item.path() == source_root {
            continue;
        }

        if item.path_is_symlink() {
            return Err(WcbtError::new(
                ErrorKind::UnsafePath,
                format!("unsupported_entry: symlinks are not supported: {}", item.path().display()),
            ));
        }

        if item.file_type().is_dir() {
            continue;
        }

        if !item.file_type().is_file() {
            return Err(WcbtError::new(
                ErrorKind::UnsafePath,
                format!("unsupported_entry: not a regular file: {}", item.path().display()),
            ));
        }

        let rel = item
            .path()
            .strip_prefix(source_root)
            .map_err(|e| WcbtError::with_source(ErrorKind::IoError, "path not under source root", e))?
            .to_string_lossy()
            .replace('\\', "/");

        entries.push(ScanEntry {
            abs: item.path().to_path_buf(),
            rel,
        });
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn scans_files_in_sorted_order() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.txt"), b"hello\n").unwrap();
        std::fs::write(dir.path().join("sub/b.bin"), [0u8, 1, 2]).unwrap();

        let entries = scan(dir.path()).unwrap();
        let rels: Vec<_> = entries.iter().map(|e| e.rel.clone()).collect();
        assert_eq!(rels, vec!["a.txt".to_string(), "sub/b.bin".to_string()]);
    }

    #[test]
    fn empty_source_yields_empty_scan() {
        let dir = tempdir().unwrap();
        assert!(scan(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn includes_hidden_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".hidden"), b"x").unwrap();
        let entries = scan(dir.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rel, ".hidden");
    }

    #[cfg(unix)]
    #[test]
    fn symlink_aborts_scan() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("real.txt"), b"x").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("link.txt")).unwrap();
        assert!(scan(dir.path()).is_err());
    }
}
