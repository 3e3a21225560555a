//! RestorePlan: validates a manifest for restore and establishes the order
//! candidates will be materialized and staged in. The manifest's own
//! ordering (lexicographic on `rel_path`, already checked by
//! [`wcbt_core::manifest::RunManifest::validate`]) is preserved unchanged.

use wcbt_core::error::{ErrorKind, WcbtError};
use wcbt_core::manifest::RunManifest;

/// Confirms `manifest` is restorable: known schema (checked by
/// `validate()`, called again here defensively) and no two entries whose
/// `rel_path` would collide once merged onto a case-insensitive target.
/// Applied regardless of host OS, so the check and its artifacts stay the
/// same whether or not the destination filesystem actually is
/// case-insensitive.
pub fn plan_restore(manifest: &RunManifest) -> Result<(), WcbtError> {
    manifest.validate()?;

    let mut seen = std::collections::HashSet::with_capacity(manifest.files.len());
    for entry in &manifest.files {
        let folded = entry.rel_path.to_lowercase();
        if !seen.insert(folded) {
            return Err(WcbtError::new(
                ErrorKind::CaseCollision,
                format!(
                    "rel_path '{}' collides with another entry on a case-insensitive destination",
                    entry.rel_path
                ),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcbt_core::manifest::{HashAlgorithm, ManifestFileEntry, RunStatus};

    fn entry(rel: &str) -> ManifestFileEntry {
        ManifestFileEntry {
            rel_path: rel.to_string(),
            size_bytes: 1,
            hash_hex: "deadbeef".to_string(),
            mtime_ns: 0,
        }
    }

    fn manifest(files: Vec<ManifestFileEntry>) -> RunManifest {
        RunManifest::new(
            "run",
            "2025-01-01T12:00:00Z",
            "/src",
            "/dest",
            HashAlgorithm::Sha256,
            RunStatus::Ok,
            files,
        )
    }

    #[test]
    fn accepts_manifest_with_distinct_names() {
        let m = manifest(vec![entry("A.txt.bak"), entry("a.txt")]);
        assert!(plan_restore(&m).is_ok());
    }

    #[test]
    fn rejects_case_insensitive_collision_regardless_of_host_os() {
        let m = manifest(vec![entry("README.md"), entry("Readme.md")]);
        let err = plan_restore(&m).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CaseCollision);
    }
}
