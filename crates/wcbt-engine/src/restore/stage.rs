//! RestoreStage: copies every candidate into an isolated stage root so a
//! restore is fully assembled, and known-good, before anything under the
//! real destination is touched.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use wcbt_core::error::{ErrorKind, WcbtError};
use wcbt_core::restore_model::{RestoreCandidate, StageCopyOutcome, StageCopyRecord, StageCopySummary, StageStatus};

use crate::artifact_writer;
use crate::cancel::CancellationFlag;
use crate::device;

pub const STAGE_COPY_RESULTS_FILE: &str = "stage_copy_results.jsonl";
pub const STAGE_COPY_SUMMARY_FILE: &str = "stage_copy_summary.json";

/// File names this module writes directly under the stage directory, for
/// [`super::execute::relocate_stage_artifacts`] to move post-promotion.
pub const ARTIFACT_FILE_NAMES: &[&str] = &[STAGE_COPY_RESULTS_FILE, STAGE_COPY_SUMMARY_FILE];

#[derive(Debug)]
pub struct StageOutcome {
    pub stage_dir: PathBuf,
    pub stage_root: PathBuf,
    pub status: StageStatus,
    pub copied: u64,
    pub skipped_dry_run: u64,
    pub failed: u64,
}

/// `<destination>.wcbt_stage/<run_id>/`, the directory holding both the
/// staged tree (`stage_root/`) and this pipeline's own artifacts.
pub fn stage_dir(destination_root: &Path, run_id: &str) -> PathBuf {
    let mut name = OsString::from(destination_root.as_os_str());
    name.push(".wcbt_stage");
    PathBuf::from(name).join(run_id)
}

/// Verifies the stage directory and the restore destination resolve to the
/// same device, so the final promotion rename can be atomic. The
/// destination frequently does not exist yet, so the nearest existing
/// ancestor of each is compared.
fn check_same_device(stage_dir: &Path, destination_root: &Path) -> Result<(), WcbtError> {
    let stage_dev = device::device_id_of_nearest_existing(stage_dir).map_err(|e| {
        WcbtError::with_source(ErrorKind::IoError, format!("cannot stat stage path: {}", stage_dir.display()), e)
    })?;
    let dest_dev = device::device_id_of_nearest_existing(destination_root).map_err(|e| {
        WcbtError::with_source(
            ErrorKind::IoError,
            format!("cannot stat destination path: {}", destination_root.display()),
            e,
        )
    })?;

    if stage_dev != dest_dev {
        return Err(WcbtError::new(
            ErrorKind::CrossDeviceStage,
            format!(
                "stage ({}) and destination ({}) are on different filesystems; promotion rename would not be atomic",
                stage_dir.display(),
                destination_root.display()
            ),
        ));
    }
    Ok(())
}

pub fn stage(
    destination_root: &Path,
    run_id: &str,
    candidates: &[RestoreCandidate],
    dry_run: bool,
    cancel: &CancellationFlag,
) -> Result<StageOutcome, WcbtError> {
    let stage_dir_path = stage_dir(destination_root, run_id);
    let stage_root = stage_dir_path.join("stage_root");
    std::fs::create_dir_all(&stage_root).map_err(|e| {
        WcbtError::with_source(ErrorKind::IoError, format!("cannot create stage root: {}", stage_root.display()), e)
    })?;

    check_same_device(&stage_dir_path, destination_root)?;

    let mut records = Vec::with_capacity(candidates.len());
    let mut copied = 0u64;
    let mut skipped_dry_run = 0u64;
    let mut failed = 0u64;
    let mut aborted = false;

    for candidate in candidates {
        if cancel.is_cancelled() {
            records.push(StageCopyRecord::new(&candidate.rel_path, StageCopyOutcome::Failed, Some("cancelled".to_string())));
            failed += 1;
            aborted = true;
            break;
        }

        let dest_in_stage = stage_root.join(&candidate.rel_path);
        match copy_into_stage(&candidate.source_abs, &dest_in_stage, dry_run) {
            Ok(true) => {
                records.push(StageCopyRecord::new(&candidate.rel_path, StageCopyOutcome::Copied, None));
                copied += 1;
            }
            Ok(false) => {
                records.push(StageCopyRecord::new(&candidate.rel_path, StageCopyOutcome::SkippedDryRun, None));
                skipped_dry_run += 1;
            }
            Err(e) => {
                records.push(StageCopyRecord::new(&candidate.rel_path, StageCopyOutcome::Failed, Some(e.to_string())));
                failed += 1;
                aborted = true;
                break;
            }
        }
    }

    artifact_writer::write_jsonl_atomic(&stage_dir_path.join(STAGE_COPY_RESULTS_FILE), &records)?;

    let status = if failed > 0 { StageStatus::Failed } else { StageStatus::Success };
    let summary = StageCopySummary {
        schema: wcbt_core::schema::STAGE_COPY_RECORD_V1.to_string(),
        status,
        copied,
        skipped_dry_run,
        failed,
    };
    artifact_writer::write_json_atomic(&stage_dir_path.join(STAGE_COPY_SUMMARY_FILE), &summary)?;

    if aborted || status == StageStatus::Failed {
        return Err(WcbtError::new(
            ErrorKind::IoError,
            format!("stage build aborted after {copied} copied, {failed} failed; stage retained at {}", stage_dir_path.display()),
        ));
    }

    Ok(StageOutcome {
        stage_dir: stage_dir_path,
        stage_root,
        status,
        copied,
        skipped_dry_run,
        failed,
    })
}

/// Copies `source` into `dest` via a `.part` sibling, renamed into place on
/// success. Returns `Ok(true)` for a committed copy, `Ok(false)` for a
/// dry-run (no file left behind).
fn copy_into_stage(source: &Path, dest: &Path, dry_run: bool) -> io::Result<bool> {
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_name = dest.file_name().and_then(|n| n.to_str()).unwrap_or("part");
    let tmp = dest.with_file_name(format!("{file_name}.part"));

    let result = std::fs::copy(source, &tmp).map(|_| ());
    match result {
        Ok(()) if dry_run => {
            std::fs::remove_file(&tmp)?;
            Ok(false)
        }
        Ok(()) => {
            std::fs::rename(&tmp, dest)?;
            Ok(true)
        }
        Err(e) => {
            let _ = std::fs::remove_file(&tmp);
            Err(e)
        }
    }
}
