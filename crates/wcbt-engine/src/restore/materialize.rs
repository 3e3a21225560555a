//! RestoreMaterialize: turns a validated manifest into concrete
//! [`RestoreCandidate`]s, resolving every path through [`crate::path_safety`]
//! rather than plain concatenation.

use std::path::Path;

use wcbt_core::error::WcbtError;
use wcbt_core::manifest::RunManifest;
use wcbt_core::restore_model::{RestoreCandidate, RestorePlanDoc};

use crate::artifact_writer;
use crate::backup::PAYLOAD_DIR_NAME;
use crate::path_safety;

pub const RESTORE_PLAN_FILE: &str = "restore_plan.json";

/// File names this module writes directly under the stage directory, for
/// [`super::execute::relocate_stage_artifacts`] to move post-promotion.
pub const ARTIFACT_FILE_NAMES: &[&str] = &[RESTORE_PLAN_FILE];

/// Builds one candidate per manifest entry, in manifest order. `run_dir` is
/// the backup run directory holding `payload/`; `destination_root` is where
/// the restore will eventually be promoted to (it need not exist yet).
pub fn materialize(
    run_dir: &Path,
    destination_root: &Path,
    manifest: &RunManifest,
) -> Result<Vec<RestoreCandidate>, WcbtError> {
    let payload_dir = run_dir.join(PAYLOAD_DIR_NAME);

    manifest
        .files
        .iter()
        .map(|entry| {
            let rel = Path::new(&entry.rel_path);
            let source_abs = path_safety::safe_join(&payload_dir, rel)?;
            let dest_abs = destination_root.join(&entry.rel_path);
            Ok(RestoreCandidate {
                rel_path: entry.rel_path.clone(),
                source_abs,
                dest_abs,
                expected_hash: entry.hash_hex.clone(),
                size_bytes: entry.size_bytes,
            })
        })
        .collect()
}

pub fn plan_doc(run_id: &str, destination_root: &Path, candidates: &[RestoreCandidate]) -> RestorePlanDoc {
    RestorePlanDoc::new(run_id, destination_root.to_string_lossy().to_string(), candidates)
}

/// Writes the `wcbt_restore_plan_v1` artifact (the candidate list this
/// restore intends to stage) into `stage_dir`, so the decision RestorePlan
/// made is recorded on disk alongside the rest of the restore's artifacts.
pub fn write_plan_doc(
    stage_dir: &Path,
    run_id: &str,
    destination_root: &Path,
    candidates: &[RestoreCandidate],
) -> Result<(), WcbtError> {
    let doc = plan_doc(run_id, destination_root, candidates);
    artifact_writer::write_json_atomic(&stage_dir.join(RESTORE_PLAN_FILE), &doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wcbt_core::manifest::{HashAlgorithm, ManifestFileEntry, RunStatus};

    #[test]
    fn materializes_source_and_dest_paths_under_their_respective_roots() {
        let run_dir = tempdir().unwrap();
        std::fs::create_dir_all(run_dir.path().join("payload/sub")).unwrap();
        std::fs::write(run_dir.path().join("payload/sub/a.txt"), b"x").unwrap();

        let manifest = RunManifest::new(
            "run",
            "2025-01-01T12:00:00Z",
            "/src",
            "/dest",
            HashAlgorithm::Sha256,
            RunStatus::Ok,
            vec![ManifestFileEntry {
                rel_path: "sub/a.txt".to_string(),
                size_bytes: 1,
                hash_hex: "deadbeef".to_string(),
                mtime_ns: 0,
            }],
        );

        let destination_root = Path::new("/some/destination/that/does/not/exist/yet");
        let candidates = materialize(run_dir.path(), destination_root, &manifest).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].rel_path, "sub/a.txt");
        assert_eq!(candidates[0].source_abs, run_dir.path().join("payload/sub/a.txt"));
        assert_eq!(candidates[0].dest_abs, destination_root.join("sub/a.txt"));
    }

    #[test]
    fn rejects_manifest_entry_whose_rel_path_would_escape_payload() {
        let run_dir = tempdir().unwrap();
        std::fs::create_dir_all(run_dir.path().join("payload")).unwrap();

        let manifest = RunManifest {
            files: vec![ManifestFileEntry {
                rel_path: "../escape.txt".to_string(),
                size_bytes: 1,
                hash_hex: "deadbeef".to_string(),
                mtime_ns: 0,
            }],
            ..RunManifest::new(
                "run",
                "2025-01-01T12:00:00Z",
                "/src",
                "/dest",
                HashAlgorithm::Sha256,
                RunStatus::Ok,
                vec![],
            )
        };

        assert!(materialize(run_dir.path(), Path::new("/dest"), &manifest).is_err());
    }

    #[test]
    fn write_plan_doc_emits_a_restore_plan_v1_document() {
        let run_dir = tempdir().unwrap();
        std::fs::create_dir_all(run_dir.path().join("payload")).unwrap();
        std::fs::write(run_dir.path().join("payload/a.txt"), b"x").unwrap();

        let manifest = RunManifest::new(
            "run",
            "2025-01-01T12:00:00Z",
            "/src",
            "/dest",
            HashAlgorithm::Sha256,
            RunStatus::Ok,
            vec![ManifestFileEntry {
                rel_path: "a.txt".to_string(),
                size_bytes: 1,
                hash_hex: "deadbeef".to_string(),
                mtime_ns: 0,
            }],
        );
        let destination_root = Path::new("/dest");
        let candidates = materialize(run_dir.path(), destination_root, &manifest).unwrap();

        let stage_dir = tempdir().unwrap();
        write_plan_doc(stage_dir.path(), "run", destination_root, &candidates).unwrap();

        let written = std::fs::read_to_string(stage_dir.path().join(RESTORE_PLAN_FILE)).unwrap();
        assert!(written.contains("wcbt_restore_plan_v1"));
        assert!(written.contains("a.txt"));
    }
}
