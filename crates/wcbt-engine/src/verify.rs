//! Verify: validates an executed run's payload against its manifest.
//! Reads the manifest and the payload only, never the journal, which is a
//! diagnostic record of the backup, not a source of truth for content.

use std::path::Path;

use wcbt_core::error::{ErrorKind, WcbtError};
use wcbt_core::manifest::RunManifest;
use wcbt_core::verify_model::{VerifyCounts, VerifyRecord, VerifyReport, VerifyStatus};

use crate::artifact_writer;
use crate::backup::PAYLOAD_DIR_NAME;
use crate::hasher;

pub const VERIFY_REPORT_JSONL_FILE: &str = "verify_report.jsonl";
pub const VERIFY_REPORT_JSON_FILE: &str = "verify_report.json";
pub const VERIFY_SUMMARY_TXT_FILE: &str = "verify_summary.txt";

const VERIFY_STAGING_DIR_NAME: &str = ".verify_tmp";
const VERIFY_ARTIFACT_FILE_NAMES: &[&str] =
    &[VERIFY_REPORT_JSONL_FILE, VERIFY_REPORT_JSON_FILE, VERIFY_SUMMARY_TXT_FILE];

#[derive(Debug)]
pub struct VerifyOutcome {
    pub counts: VerifyCounts,
}

impl VerifyOutcome {
    pub fn all_ok(&self) -> bool {
        self.counts.all_ok()
    }
}

/// Verifies every entry of `manifest` against the payload under `run_dir`,
/// writing `verify_report.jsonl`, `verify_report.json`, and
/// `verify_summary.txt` into `run_dir` regardless of outcome. The three are
/// built in a staging subdirectory first and committed into `run_dir`
/// together, so a crash mid-verify leaves either the complete set or none of
/// it, never a partial one.
pub fn verify(run_dir: &Path, manifest: &RunManifest) -> Result<VerifyOutcome, WcbtError> {
    let payload_dir = run_dir.join(PAYLOAD_DIR_NAME);
    let mut records = Vec::with_capacity(manifest.files.len());
    let mut counts = VerifyCounts::default();

    for entry in &manifest.files {
        let path = payload_dir.join(&entry.rel_path);
        let status = classify(&path, entry.hash_hex.as_str());
        counts.record(status);
        records.push(VerifyRecord::new(&manifest.run_id, &entry.rel_path, status));
    }

    let report = VerifyReport::new(&manifest.run_id, manifest.hash_algorithm.as_str(), counts);
    let summary_text = render_summary(&manifest.run_id, &records, &counts);

    let staging_dir = run_dir.join(VERIFY_STAGING_DIR_NAME);
    if staging_dir.exists() {
        std::fs::remove_dir_all(&staging_dir).map_err(|e| {
            WcbtError::with_source(ErrorKind::IoError, format!("cannot clear stale verify staging dir: {}", staging_dir.display()), e)
        })?;
    }
    std::fs::create_dir_all(&staging_dir).map_err(|e| {
        WcbtError::with_source(ErrorKind::IoError, format!("cannot create verify staging dir: {}", staging_dir.display()), e)
    })?;

    artifact_writer::write_jsonl_atomic(&staging_dir.join(VERIFY_REPORT_JSONL_FILE), &records)?;
    artifact_writer::write_json_atomic(&staging_dir.join(VERIFY_REPORT_JSON_FILE), &report)?;
    artifact_writer::write_text_atomic(&staging_dir.join(VERIFY_SUMMARY_TXT_FILE), &summary_text)?;

    artifact_writer::commit_batch(&staging_dir, run_dir, VERIFY_ARTIFACT_FILE_NAMES)?;

    Ok(VerifyOutcome { counts })
}

fn classify(path: &Path, expected_hash: &str) -> VerifyStatus {
    if !path.exists() {
        return VerifyStatus::Missing;
    }
    match hasher::hash_file(path) {
        Ok(result) if result.hex == expected_hash => VerifyStatus::Ok,
        Ok(_) => VerifyStatus::HashMismatch,
        Err(_) => VerifyStatus::Unreadable,
    }
}

/// A fixed-width, sorted, deterministic text rendering of the verify run,
/// the one artifact meant for a person to read directly rather than parse.
fn render_summary(run_id: &str, records: &[VerifyRecord], counts: &VerifyCounts) -> String {
    let mut lines = Vec::new();
    lines.push(format!("run_id: {run_id}"));
    lines.push(format!(
        "counts: ok={:<6} missing={:<6} unreadable={:<6} hash_mismatch={:<6} total={}",
        counts.ok,
        counts.missing,
        counts.unreadable,
        counts.hash_mismatch,
        counts.total()
    ));
    lines.push(String::new());

    let mut sorted: Vec<&VerifyRecord> = records.iter().collect();
    sorted.sort_by(|a, b| a.path.cmp(&b.path));
    for record in sorted {
        lines.push(format!("{:<10} {}", status_label(record.status), record.path));
    }

    lines.join("\n")
}

fn status_label(status: VerifyStatus) -> &'static str {
    match status {
        VerifyStatus::Ok => "ok",
        VerifyStatus::Missing => "missing",
        VerifyStatus::Unreadable => "unreadable",
        VerifyStatus::HashMismatch => "hash_mismatch",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use wcbt_core::manifest::{HashAlgorithm, ManifestFileEntry, RunStatus};

    fn write_payload_file(run_dir: &Path, rel: &str, content: &[u8]) {
        let path = run_dir.join(PAYLOAD_DIR_NAME).join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn all_matching_files_verify_ok() {
        let run_dir = tempdir().unwrap();
        write_payload_file(run_dir.path(), "a.txt", b"hello\n");

        let manifest = RunManifest::new(
            "run",
            "2025-01-01T12:00:00Z",
            "/src",
            "/dest",
            HashAlgorithm::Sha256,
            RunStatus::Ok,
            vec![ManifestFileEntry {
                rel_path: "a.txt".to_string(),
                size_bytes: 6,
                hash_hex: "5891b5b522d5df086d0ff0b110fbd9d21bb4fc7163af34d08286a2e846f6be03".to_string(),
                mtime_ns: 0,
            }],
        );

        let outcome = verify(run_dir.path(), &manifest).unwrap();
        assert!(outcome.all_ok());
        assert_eq!(outcome.counts.ok, 1);
        assert!(run_dir.path().join(VERIFY_REPORT_JSONL_FILE).exists());
        assert!(run_dir.path().join(VERIFY_REPORT_JSON_FILE).exists());
        assert!(run_dir.path().join(VERIFY_SUMMARY_TXT_FILE).exists());
    }

    #[test]
    fn missing_and_corrupted_files_are_classified_correctly() {
        let run_dir = tempdir().unwrap();
        write_payload_file(run_dir.path(), "corrupt.txt", b"tampered");

        let manifest = RunManifest::new(
            "run",
            "2025-01-01T12:00:00Z",
            "/src",
            "/dest",
            HashAlgorithm::Sha256,
            RunStatus::Ok,
            vec![
                ManifestFileEntry {
                    rel_path: "corrupt.txt".to_string(),
                    size_bytes: 5,
                    hash_hex: "0".repeat(64),
                    mtime_ns: 0,
                },
                ManifestFileEntry {
                    rel_path: "gone.txt".to_string(),
                    size_bytes: 5,
                    hash_hex: "1".repeat(64),
                    mtime_ns: 0,
                },
            ],
        );

        let outcome = verify(run_dir.path(), &manifest).unwrap();
        assert!(!outcome.all_ok());
        assert_eq!(outcome.counts.hash_mismatch, 1);
        assert_eq!(outcome.counts.missing, 1);
    }
}
