mod cli;
mod logging;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use wcbt_core::clock::{Clock, SystemClock};
use wcbt_core::error::WcbtError;
use wcbt_engine::cancel::CancellationFlag;
use wcbt_engine::RestoreOptions;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.log.as_deref()) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::from(7);
    }

    let cancel = CancellationFlag::new();
    {
        let cancel_for_handler = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            tracing::warn!("cancellation requested");
            cancel_for_handler.cancel();
        }) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    let clock = SystemClock;

    let result = match cli.command {
        Command::Backup { source, dest, dry_run } => run_backup(&source, &dest, dry_run, &clock, &cancel),
        Command::Restore { manifest, dest, dry_run, verify } => {
            run_restore(&manifest, &dest, dry_run, verify.into(), &clock, &cancel)
        }
        Command::Verify { run } => run_verify(&run),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(e.kind.fatal_exit_code() as u8)
        }
    }
}

fn run_backup(
    source: &Path,
    dest: &Path,
    dry_run: bool,
    clock: &dyn Clock,
    cancel: &CancellationFlag,
) -> Result<u8, WcbtError> {
    let outcome = wcbt_engine::run_backup(source, dest, dry_run, clock, cancel)?;
    if outcome.dry_run {
        println!("dry-run backup planned at {}", outcome.run_dir.display());
        return Ok(0);
    }
    if outcome.is_partial() {
        println!(
            "backup partial: {} copied, {} failed (run {})",
            outcome.copied, outcome.failed, outcome.run_id
        );
        Ok(4)
    } else {
        println!("backup ok: {} copied (run {})", outcome.copied, outcome.run_id);
        Ok(0)
    }
}

fn run_restore(
    manifest: &Path,
    dest: &Path,
    dry_run: bool,
    verify_mode: wcbt_engine::restore::verify_stage::VerifyStageMode,
    clock: &dyn Clock,
    cancel: &CancellationFlag,
) -> Result<u8, WcbtError> {
    let options = RestoreOptions { verify_mode, dry_run };
    let outcome = wcbt_engine::run_restore(manifest, dest, options, clock, cancel)?;

    if outcome.dry_run {
        println!(
            "dry-run restore staged {} file(s) (run {})",
            outcome.copied + outcome.skipped_dry_run,
            outcome.run_id
        );
        return Ok(0);
    }

    match &outcome.preserved_prior {
        Some(preserved) => println!(
            "restore ok: promoted run {} (prior destination preserved at {})",
            outcome.run_id,
            preserved.display()
        ),
        None => println!("restore ok: promoted run {}", outcome.run_id),
    }
    Ok(0)
}

fn run_verify(run: &Path) -> Result<u8, WcbtError> {
    let outcome = wcbt_engine::run_verify(run)?;
    if outcome.all_ok() {
        println!("verify ok: {} file(s)", outcome.counts.total());
        Ok(0)
    } else {
        println!(
            "verify found issues: ok={} missing={} unreadable={} hash_mismatch={}",
            outcome.counts.ok, outcome.counts.missing, outcome.counts.unreadable, outcome.counts.hash_mismatch
        );
        Ok(6)
    }
}
