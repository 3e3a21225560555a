//! Executes a backup plan: copies each planned file to
//! `payload/<rel_path>`, appending a journal line per op in plan order,
//! then writes the manifest (or, in dry-run mode, the plan) as the
//! run's commit point.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use wcbt_core::clock::{self, Clock};
use wcbt_core::error::{ErrorKind, WcbtError};
use wcbt_core::journal::JournalRecord;
use wcbt_core::manifest::{HashAlgorithm, ManifestFileEntry, RunManifest, RunStatus};
use wcbt_core::plan::{BackupPlanDoc, PlanOp};

use crate::artifact_writer;
use crate::cancel::CancellationFlag;
use crate::hasher::StreamingHasher;
use crate::manifest_store;

const COPY_CHUNK_SIZE: usize = 1024 * 1024;
pub const PAYLOAD_DIR_NAME: &str = "payload";
pub const JOURNAL_FILE_NAME: &str = "execution_journal.jsonl";
pub const PLAN_FILE_NAME: &str = "plan.json";

#[derive(Debug)]
pub struct BackupOutcome {
    pub run_id: String,
    pub run_dir: PathBuf,
    pub dry_run: bool,
    pub run_status: Option<RunStatus>,
    pub copied: u64,
    pub failed: u64,
}

impl BackupOutcome {
    pub fn is_partial(&self) -> bool {
        matches!(self.run_status, Some(RunStatus::Partial))
    }
}

#[allow(clippy::too_many_arguments)]
pub fn execute(
    destination_root: &Path,
    run_id: &str,
    source_root: &Path,
    ops: Vec<PlanOp>,
    dry_run: bool,
    clock: &dyn Clock,
    cancel: &CancellationFlag,
) -> Result<BackupOutcome, WcbtError> {
    let run_dir = destination_root.join(run_id);
    let payload_dir = run_dir.join(PAYLOAD_DIR_NAME);
    std::fs::create_dir_all(&payload_dir)
        .map_err(|e| WcbtError::with_source(ErrorKind::IoError, format!("cannot create run directory: {}", run_dir.display()), e))?;

    let started_at = clock.now();
    let mut journal = Vec::with_capacity(ops.len());
    let mut copied = 0u64;
    let mut failed = 0u64;
    let mut manifest_entries = Vec::new();
    let mut cancelled = false;

    for op in &ops {
        if cancel.is_cancelled() {
            journal.push(JournalRecord::failed(run_id, &op.rel_path, "cancelled"));
            failed += 1;
            cancelled = true;
            break;
        }

        match copy_and_verify(op, dry_run, cancel) {
            Ok(CopyOutcome::Committed(observed)) => {
                journal.push(JournalRecord::copied(run_id, &op.rel_path, observed.hex.clone(), observed.size_bytes));
                let mtime_ns = mtime_ns_of(&op.source_abs).unwrap_or(0);
                manifest_entries.push(ManifestFileEntry {
                    rel_path: op.rel_path.clone(),
                    size_bytes: observed.size_bytes,
                    hash_hex: observed.hex,
                    mtime_ns,
                });
                copied += 1;
            }
            Ok(CopyOutcome::DryRun(observed)) => {
                journal.push(JournalRecord::skipped_dry_run(run_id, &op.rel_path, observed.hex, observed.size_bytes));
            }
            Ok(CopyOutcome::Cancelled) => {
                journal.push(JournalRecord::failed(run_id, &op.rel_path, "cancelled"));
                failed += 1;
                cancelled = true;
                break;
            }
            Err(error) => {
                journal.push(JournalRecord::failed(run_id, &op.rel_path, error.to_string()));
                failed += 1;
            }
        }
    }

    let journal_path = run_dir.join(JOURNAL_FILE_NAME);
    artifact_writer::write_jsonl_atomic(&journal_path, &journal)?;

    if dry_run {
        let plan_doc = BackupPlanDoc::new(
            run_id,
            source_root.to_string_lossy().to_string(),
            destination_root.to_string_lossy().to_string(),
            HashAlgorithm::Sha256,
            &ops,
        );
        artifact_writer::write_json_atomic(&run_dir.join(PLAN_FILE_NAME), &plan_doc)?;

        return Ok(BackupOutcome {
            run_id: run_id.to_string(),
            run_dir,
            dry_run: true,
            run_status: None,
            copied: 0,
            failed,
        });
    }

    let run_status = if failed > 0 { RunStatus::Partial } else { RunStatus::Ok };
    let manifest = RunManifest::new(
        run_id,
        clock::rfc3339_utc(started_at),
        source_root.to_string_lossy().to_string(),
        destination_root.to_string_lossy().to_string(),
        HashAlgorithm::Sha256,
        run_status,
        manifest_entries,
    );
    manifest_store::write_manifest(&run_dir, &manifest)?;

    if cancelled {
        return Err(WcbtError::new(
            ErrorKind::Cancelled,
            format!("backup run {run_id} was cancelled; {copied} file(s) committed before cancellation"),
        ));
    }

    Ok(BackupOutcome {
        run_id: run_id.to_string(),
        run_dir,
        dry_run: false,
        run_status: Some(run_status),
        copied,
        failed,
    })
}

enum CopyOutcome {
    Committed(crate::hasher::HashResult),
    DryRun(crate::hasher::HashResult),
    Cancelled,
}

fn copy_and_verify(op: &PlanOp, dry_run: bool, cancel: &CancellationFlag) -> anyhow::Result<CopyOutcome> {
    let dest_abs = op.dest_abs.as_path();
    if let Some(parent) = dest_abs.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp = part_temp_path(dest_abs);
    let result = (|| -> anyhow::Result<crate::hasher::HashResult> {
        let mut src = std::fs::File::open(&op.source_abs)?;
        let mut dst = std::fs::File::create(&tmp)?;
        let mut hasher = StreamingHasher::new();
        let mut buf = vec![0u8; COPY_CHUNK_SIZE];

        loop {
            if cancel.is_cancelled() {
                anyhow::bail!("cancelled");
            }
            let n = src.read(&mut buf)?;
            if n == 0 {
                break;
            }
            dst.write_all(&buf[..n])?;
            hasher.update(&buf[..n]);
        }
        dst.sync_all()?;
        Ok(hasher.finalize())
    })();

    match result {
        Ok(_) if cancel.is_cancelled() => {
            let _ = std::fs::remove_file(&tmp);
            Ok(CopyOutcome::Cancelled)
        }
        Ok(observed) => {
            if observed.hex != op.expected_hash {
                let _ = std::fs::remove_file(&tmp);
                anyhow::bail!(
                    "hash_mismatch: expected {}, got {}",
                    op.expected_hash,
                    observed.hex
                );
            }

            if dry_run {
                let _ = std::fs::remove_file(&tmp);
                Ok(CopyOutcome::DryRun(observed))
            } else {
                std::fs::rename(&tmp, dest_abs)?;
                Ok(CopyOutcome::Committed(observed))
            }
        }
        Err(error) => {
            let _ = std::fs::remove_file(&tmp);
            if error.to_string() == "cancelled" {
                Ok(CopyOutcome::Cancelled)
            } else {
                Err(error)
            }
        }
    }
}

fn part_temp_path(dest_abs: &Path) -> PathBuf {
    let file_name = dest_abs.file_name().and_then(|n| n.to_str()).unwrap_or("part");
    dest_abs.with_file_name(format!("{file_name}.part"))
}

fn mtime_ns_of(path: &Path) -> Option<i64> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    let duration = modified.duration_since(std::time::UNIX_EPOCH).ok()?;
    i64::try_from(duration.as_nanos()).ok()
}
