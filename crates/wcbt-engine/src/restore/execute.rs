//! RestoreExecute: atomic promotion of a verified stage to the destination.
//! Add-only: an existing, non-empty destination is preserved under a
//! sibling name rather than overwritten or merged.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use wcbt_core::error::{ErrorKind, WcbtError};

pub const RESTORE_ARTIFACTS_DIR_NAME: &str = ".wcbt_restore";

#[derive(Debug)]
pub struct PromotionOutcome {
    pub destination: PathBuf,
    pub preserved_prior: Option<PathBuf>,
}

/// Promotes `stage_root` to `destination_root`. On success the stage
/// directory no longer exists at its old location; its tree now lives at
/// `destination_root` (or, if `destination_root` pre-existed, alongside the
/// preserved prior tree).
pub fn promote(stage_root: &Path, destination_root: &Path, run_id: &str) -> Result<PromotionOutcome, WcbtError> {
    let destination_exists = destination_root
        .symlink_metadata()
        .map(|_| true)
        .unwrap_or(false);

    if !destination_exists {
        rename(stage_root, destination_root)?;
        return Ok(PromotionOutcome {
            destination: destination_root.to_path_buf(),
            preserved_prior: None,
        });
    }

    let preserved = preserved_prior_path(destination_root, run_id);
    rename(destination_root, &preserved)?;

    if let Err(stage_err) = rename(stage_root, destination_root) {
        rename(&preserved, destination_root).map_err(|rollback_err| {
            WcbtError::new(
                ErrorKind::PromotionFailed,
                format!(
                    "promotion failed ({stage_err}) and rollback of preserved destination also failed ({rollback_err}); \
                     preserved tree remains at {}",
                    preserved.display()
                ),
            )
        })?;
        return Err(WcbtError::new(
            ErrorKind::PromotionFailed,
            format!("could not promote stage to destination, rolled back: {stage_err}"),
        ));
    }

    Ok(PromotionOutcome {
        destination: destination_root.to_path_buf(),
        preserved_prior: Some(preserved),
    })
}

fn preserved_prior_path(destination_root: &Path, run_id: &str) -> PathBuf {
    let parent = destination_root.parent().unwrap_or_else(|| Path::new("."));
    let dest_name = destination_root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("destination");
    let name = OsString::from(format!(".wcbt_restore_previous_{dest_name}_{run_id}"));
    parent.join(name)
}

fn rename(from: &Path, to: &Path) -> Result<(), WcbtError> {
    std::fs::rename(from, to).map_err(|e| {
        WcbtError::with_source(
            ErrorKind::PromotionFailed,
            format!("rename {} -> {} failed", from.display(), to.display()),
            e,
        )
    })
}

/// Where a restore's own artifacts (stage copy/verify results, the restore
/// plan) live once the stage has been promoted.
pub fn restore_artifacts_dir(destination_root: &Path, run_id: &str) -> PathBuf {
    destination_root.join(RESTORE_ARTIFACTS_DIR_NAME).join(run_id)
}

/// Moves every artifact a stage pipeline produced (the restore plan, stage
/// copy/verify results and summaries) from `stage_dir` into
/// `restore_artifacts_dir(destination_root, run_id)`, then removes the now
/// empty stage directories. Called only after a successful promotion, once
/// `stage_root` itself has already been renamed away by [`promote`].
pub fn relocate_stage_artifacts(
    stage_dir: &Path,
    destination_root: &Path,
    run_id: &str,
) -> Result<PathBuf, WcbtError> {
    let target = restore_artifacts_dir(destination_root, run_id);
    std::fs::create_dir_all(&target).map_err(|e| {
        WcbtError::with_source(ErrorKind::IoError, format!("cannot create restore artifacts dir: {}", target.display()), e)
    })?;

    for file_name in super::stage::ARTIFACT_FILE_NAMES
        .iter()
        .chain(super::verify_stage::ARTIFACT_FILE_NAMES.iter())
        .chain(super::materialize::ARTIFACT_FILE_NAMES.iter())
    {
        let from = stage_dir.join(file_name);
        if from.exists() {
            let to = target.join(file_name);
            std::fs::rename(&from, &to).map_err(|e| {
                WcbtError::with_source(
                    ErrorKind::IoError,
                    format!("cannot relocate restore artifact {} -> {}", from.display(), to.display()),
                    e,
                )
            })?;
        }
    }

    // Best effort: the stage directories should now be empty (stage_root
    // was already renamed away by promote()); leave them behind rather than
    // fail the restore if some unexpected file remains.
    let _ = std::fs::remove_dir(stage_dir);
    if let Some(stage_parent) = stage_dir.parent() {
        let _ = std::fs::remove_dir(stage_parent);
    }

    Ok(target)
}
