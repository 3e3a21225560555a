//! Path normalization, traversal checks, safe-join and safe-relpath.
//!
//! Every other component routes path manipulation through this module;
//! raw concatenation of user/manifest-controlled path fragments is
//! forbidden elsewhere in the engine.

use std::path::{Component, Path, PathBuf};

use wcbt_core::error::{ErrorKind, WcbtError};

/// Lexically normalizes a path: resolves `.` and `..` components without
/// touching the filesystem, and rejects a `..` that would climb above the
/// start of the path (there is nothing above it to resolve against).
pub fn normalize(p: &Path) -> Result<PathBuf, WcbtError> {
    let mut out = PathBuf::new();
    for component in p.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return Err(WcbtError::new(
                        ErrorKind::UnsafePath,
                        format!("path escapes its root via '..': {}", p.display()),
                    ));
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}

/// Computes `child`'s path relative to `base`, after resolving both to
/// their canonical (symlink-free) form, and rejects any result that would
/// fall outside `base`, including a symlink inside `base` that points
/// outside it.
pub fn safe_relpath(base: &Path, child: &Path) -> Result<PathBuf, WcbtError> {
    let base_real = canonicalize_existing(base)?;
    let child_real = canonicalize_existing(child)?;

    child_real.strip_prefix(&base_real).map(Path::to_path_buf).map_err(|_| {
        WcbtError::new(
            ErrorKind::UnsafePath,
            format!(
                "{} is not within {}",
                child.display(),
                base.display()
            ),
        )
    })
}

/// Joins `base` with a relative path, rejecting anything absolute,
/// containing `..`, or that would resolve outside `base`.
pub fn safe_join(base: &Path, rel: &Path) -> Result<PathBuf, WcbtError> {
    if rel.is_absolute() {
        return Err(WcbtError::new(
            ErrorKind::UnsafePath,
            format!("rel path must not be absolute: {}", rel.display()),
        ));
    }

    let mut out = base.to_path_buf();
    for component in rel.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            _ => {
                return Err(WcbtError::new(
                    ErrorKind::UnsafePath,
                    format!("rel path must not contain '..': {}", rel.display()),
                ));
            }
        }
    }

    // Guard against a symlink component smuggling the resolved path outside
    // `base` even though the textual join looked safe.
    if let Ok(real_base) = base.canonicalize()
        && let Ok(real_out) = out.canonicalize()
        && real_out.strip_prefix(&real_base).is_err()
    {
        return Err(WcbtError::new(
            ErrorKind::UnsafePath,
            format!("joined path escapes base via symlink: {}", out.display()),
        ));
    }

    Ok(out)
}

fn canonicalize_existing(p: &Path) -> Result<PathBuf, WcbtError> {
    p.canonicalize().map_err(|e| {
        WcbtError::with_source(
            ErrorKind::UnsafePath,
            format!("cannot resolve path: {}", p.display()),
            e,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn normalize_resolves_dot_and_dotdot() {
        let p = Path::new("a/./b/../c");
        assert_eq!(normalize(p).unwrap(), PathBuf::from("a/c"));
    }

    #[test]
    fn normalize_rejects_escaping_dotdot() {
        assert!(normalize(Path::new("../etc")).is_err());
    }

    #[test]
    fn safe_join_accepts_nested_relative_path() {
        let dir = tempdir().unwrap();
        let joined = safe_join(dir.path(), Path::new("sub/file.txt")).unwrap();
        assert_eq!(joined, dir.path().join("sub/file.txt"));
    }

    #[test]
    fn safe_join_rejects_absolute_rel() {
        let dir = tempdir().unwrap();
        assert!(safe_join(dir.path(), Path::new("/etc/passwd")).is_err());
    }

    #[test]
    fn safe_join_rejects_dotdot() {
        let dir = tempdir().unwrap();
        assert!(safe_join(dir.path(), Path::new("../escape")).is_err());
    }

    #[test]
    fn safe_relpath_rejects_path_outside_base() {
        let base = tempdir().unwrap();
        let outside = tempdir().unwrap();
        std::fs::write(outside.path().join("f"), b"x").unwrap();
        assert!(safe_relpath(base.path(), &outside.path().join("f")).is_err());
    }

    #[test]
    fn safe_relpath_accepts_path_inside_base() {
        let base = tempdir().unwrap();
        std::fs::create_dir_all(base.path().join("sub")).unwrap();
        std::fs::write(base.path().join("sub/f"), b"x").unwrap();
        let rel = safe_relpath(base.path(), &base.path().join("sub/f")).unwrap();
        assert_eq!(rel, PathBuf::from("sub/f"));
    }

    #[cfg(unix)]
    #[test]
    fn safe_relpath_rejects_symlink_escaping_base() {
        let base = tempdir().unwrap();
        let outside = tempdir().unwrap();
        std::fs::write(outside.path().join("secret"), b"x").unwrap();
        let link = base.path().join("link");
        std::os::unix::fs::symlink(outside.path().join("secret"), &link).unwrap();
        assert!(safe_relpath(base.path(), &link).is_err());
    }
}
