//! The WCBT engine: Backup, Restore, and Verify pipelines over a shared
//! on-disk artifact model. This crate has no knowledge of CLI argument
//! parsing or process exit codes. Callers (the `wcbt` binary, tests, or any
//! future embedder) drive these entry points directly and translate
//! [`wcbt_core::error::WcbtError`] into whatever surface they need.

pub mod artifact_writer;
pub mod backup;
pub mod cancel;
pub mod device;
pub mod hasher;
pub mod lock;
pub mod manifest_store;
pub mod path_safety;
pub mod restore;
pub mod verify;

use std::path::{Path, PathBuf};

use wcbt_core::clock::Clock;
use wcbt_core::error::{ErrorKind, WcbtError};
use wcbt_core::manifest::RunManifest;
use wcbt_core::restore_model::StageStatus;

use cancel::CancellationFlag;
use lock::ProfileLock;
use restore::verify_stage::VerifyStageMode;

/// Runs BackupScan → BackupPlan → BackupExecute against a freshly minted
/// run id. Takes the destination's [`ProfileLock`] for its own duration.
pub fn run_backup(
    source_root: &Path,
    destination_root: &Path,
    dry_run: bool,
    clock: &dyn Clock,
    cancel: &CancellationFlag,
) -> Result<backup::BackupOutcome, WcbtError> {
    tracing::info!(source = %source_root.display(), destination = %destination_root.display(), dry_run, "backup starting");
    let _lock = ProfileLock::acquire(destination_root, clock)?;

    let run_id = wcbt_core::clock::run_id_for(clock.now());
    let entries = backup::scan::scan(source_root)?;
    let payload_dir = destination_root.join(&run_id).join(backup::PAYLOAD_DIR_NAME);
    let ops = backup::plan::build_plan(&entries, &payload_dir)?;

    let outcome = backup::execute::execute(destination_root, &run_id, source_root, ops, dry_run, clock, cancel)?;
    if outcome.is_partial() {
        tracing::warn!(run_id = %outcome.run_id, failed = outcome.failed, "backup finished partial");
    } else {
        tracing::info!(run_id = %outcome.run_id, copied = outcome.copied, "backup finished");
    }
    Ok(outcome)
}

/// Options governing a restore beyond the run/destination pair itself.
#[derive(Debug, Clone, Copy)]
pub struct RestoreOptions {
    pub verify_mode: VerifyStageMode,
    pub dry_run: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            verify_mode: VerifyStageMode::Size,
            dry_run: false,
        }
    }
}

#[derive(Debug)]
pub struct RestoreOutcome {
    pub run_id: String,
    pub dry_run: bool,
    pub promoted: bool,
    pub preserved_prior: Option<PathBuf>,
    pub copied: u64,
    pub skipped_dry_run: u64,
    /// `<destination>/.wcbt_restore/<run_id>/`, populated once the stage's
    /// own artifacts have been relocated there post-promotion. `None` for a
    /// dry run, where nothing is promoted and the stage is left in place.
    pub artifacts_dir: Option<PathBuf>,
}

/// Runs RestorePlan → RestoreMaterialize → RestoreStage → RestoreVerifyStage
/// → RestoreExecute for the run at `run_dir`, restoring into
/// `destination_root`. Takes `destination_root`'s [`ProfileLock`] for its
/// own duration; a dry run stages and reports but never promotes.
pub fn run_restore(
    run_dir: &Path,
    destination_root: &Path,
    options: RestoreOptions,
    clock: &dyn Clock,
    cancel: &CancellationFlag,
) -> Result<RestoreOutcome, WcbtError> {
    tracing::info!(run = %run_dir.display(), destination = %destination_root.display(), dry_run = options.dry_run, "restore starting");
    let _lock = ProfileLock::acquire(destination_root, clock)?;

    let manifest: RunManifest = manifest_store::read_manifest(run_dir)?;
    if manifest.run_status == wcbt_core::manifest::RunStatus::Partial {
        tracing::warn!(run_id = %manifest.run_id, "restoring from a partial run; some source files were not captured");
    }
    restore::plan::plan_restore(&manifest)?;
    let candidates = restore::materialize::materialize(run_dir, destination_root, &manifest)?;

    let stage_outcome = restore::stage::stage(
        destination_root,
        &manifest.run_id,
        &candidates,
        options.dry_run,
        cancel,
    )?;
    restore::materialize::write_plan_doc(&stage_outcome.stage_dir, &manifest.run_id, destination_root, &candidates)?;

    if options.dry_run {
        restore::verify_stage::verify_stage(
            &stage_outcome.stage_dir,
            &stage_outcome.stage_root,
            &candidates,
            VerifyStageMode::None,
        )?;
        return Ok(RestoreOutcome {
            run_id: manifest.run_id,
            dry_run: true,
            promoted: false,
            preserved_prior: None,
            copied: stage_outcome.copied,
            skipped_dry_run: stage_outcome.skipped_dry_run,
            artifacts_dir: None,
        });
    }

    let verify_outcome = restore::verify_stage::verify_stage(
        &stage_outcome.stage_dir,
        &stage_outcome.stage_root,
        &candidates,
        options.verify_mode,
    )?;

    if verify_outcome.status != StageStatus::Success {
        return Err(WcbtError::new(
            ErrorKind::IncompleteRun,
            format!(
                "stage verification failed for run {}; promotion aborted, stage retained at {}",
                manifest.run_id,
                stage_outcome.stage_dir.display()
            ),
        ));
    }

    let promotion = restore::execute::promote(&stage_outcome.stage_root, destination_root, &manifest.run_id)?;
    if let Some(preserved) = promotion.preserved_prior.as_ref() {
        tracing::info!(run_id = %manifest.run_id, preserved = %preserved.display(), "restore promoted; prior destination preserved");
    } else {
        tracing::info!(run_id = %manifest.run_id, "restore promoted");
    }

    let artifacts_dir =
        restore::execute::relocate_stage_artifacts(&stage_outcome.stage_dir, destination_root, &manifest.run_id)?;
    tracing::info!(run_id = %manifest.run_id, artifacts = %artifacts_dir.display(), "restore artifacts relocated");

    Ok(RestoreOutcome {
        run_id: manifest.run_id,
        dry_run: false,
        promoted: true,
        preserved_prior: promotion.preserved_prior,
        copied: stage_outcome.copied,
        skipped_dry_run: stage_outcome.skipped_dry_run,
        artifacts_dir: Some(artifacts_dir),
    })
}

/// Runs Verify over the run at `run_dir`. Read-only: never takes the
/// destination's [`ProfileLock`].
pub fn run_verify(run_dir: &Path) -> Result<verify::VerifyOutcome, WcbtError> {
    tracing::info!(run = %run_dir.display(), "verify starting");
    let manifest = manifest_store::read_manifest(run_dir)?;
    let outcome = verify::verify(run_dir, &manifest)?;
    if outcome.all_ok() {
        tracing::info!(run_id = %manifest.run_id, "verify finished: all ok");
    } else {
        tracing::warn!(run_id = %manifest.run_id, counts = ?outcome.counts, "verify finished with non-ok records");
    }
    Ok(outcome)
}
