//! Read/write of the run manifest, and discovery/listing of runs under a
//! destination root.

use std::path::Path;

use wcbt_core::error::{ErrorKind, WcbtError};
use wcbt_core::manifest::RunManifest;

use crate::artifact_writer;

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

pub fn manifest_path(run_dir: &Path) -> std::path::PathBuf {
    run_dir.join(MANIFEST_FILE_NAME)
}

pub fn write_manifest(run_dir: &Path, manifest: &RunManifest) -> Result<(), WcbtError> {
    artifact_writer::write_json_atomic(&manifest_path(run_dir), manifest)
}

/// Reads and structurally validates a manifest. Never trusts the
/// filesystem beyond what the manifest itself asserts.
pub fn read_manifest(run_dir: &Path) -> Result<RunManifest, WcbtError> {
    let path = manifest_path(run_dir);
    let bytes = std::fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            WcbtError::with_source(
                ErrorKind::IncompleteRun,
                format!("run has no manifest (in-progress or aborted write): {}", run_dir.display()),
                e,
            )
        } else {
            WcbtError::with_source(ErrorKind::IoError, format!("cannot read manifest: {}", path.display()), e)
        }
    })?;

    let manifest: RunManifest = serde_json::from_slice(&bytes).map_err(|e| {
        WcbtError::with_source(ErrorKind::ManifestInvalid, format!("malformed manifest: {}", path.display()), e)
    })?;

    manifest.validate()?;
    Ok(manifest)
}

/// Lists run ids under a destination root, ascending. A missing
/// destination root is reported as an empty list, not an error: the
/// destination simply has no runs yet.
pub fn list_runs(destination_root: &Path) -> Result<Vec<String>, WcbtError> {
    let entries = match std::fs::read_dir(destination_root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(WcbtError::with_source(
                ErrorKind::IoError,
                format!("cannot list runs under {}", destination_root.display()),
                e,
            ));
        }
    };

    let mut runs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            WcbtError::with_source(ErrorKind::IoError, "cannot read destination root entry", e)
        })?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false)
            && let Some(name) = entry.file_name().to_str()
        {
            runs.push(name.to_string());
        }
    }
    runs.sort();
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wcbt_core::manifest::{HashAlgorithm, RunStatus};

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let run_dir = dir.path().join("2025-01-01T12-00-00Z");
        std::fs::create_dir_all(&run_dir).unwrap();

        let manifest = RunManifest::new(
            "2025-01-01T12-00-00Z",
            "2025-01-01T12:00:00Z",
            "/src",
            dir.path().to_string_lossy().to_string(),
            HashAlgorithm::Sha256,
            RunStatus::Ok,
            vec![],
        );
        write_manifest(&run_dir, &manifest).unwrap();
        let read_back = read_manifest(&run_dir).unwrap();
        assert_eq!(manifest, read_back);
    }

    #[test]
    fn list_runs_on_missing_destination_is_empty() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        assert_eq!(list_runs(&missing).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn list_runs_is_sorted_ascending() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("2025-01-02T00-00-00Z")).unwrap();
        std::fs::create_dir_all(dir.path().join("2025-01-01T00-00-00Z")).unwrap();
        assert_eq!(
            list_runs(dir.path()).unwrap(),
            vec!["2025-01-01T00-00-00Z".to_string(), "2025-01-02T00-00-00Z".to_string()]
        );
    }

    #[test]
    fn missing_manifest_is_incomplete_run() {
        let dir = tempdir().unwrap();
        let run_dir = dir.path().join("run");
        std::fs::create_dir_all(&run_dir).unwrap();
        let err = read_manifest(&run_dir).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IncompleteRun);
    }
}
