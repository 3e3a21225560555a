//! Argument parsing. This module owns flag names and defaults only, every
//! verb calls straight into `wcbt_engine` once parsed.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "wcbt", version, about = "Deterministic backup / restore / verify engine for local directory trees")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Tracing env-filter string (e.g. "debug", "wcbt_engine=trace,info").
    /// Falls back to RUST_LOG, then "info".
    #[arg(long, global = true)]
    pub log: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Back up a source directory tree into a new timestamped run.
    Backup {
        #[arg(long)]
        source: PathBuf,
        #[arg(long = "dest")]
        dest: PathBuf,
        #[arg(long = "dry-run")]
        dry_run: bool,
    },
    /// Restore a run's payload into a destination directory.
    Restore {
        /// Path to the run directory produced by `wcbt backup` (contains manifest.json).
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long = "dest")]
        dest: PathBuf,
        #[arg(long = "dry-run")]
        dry_run: bool,
        #[arg(long, value_enum, default_value_t = VerifyModeArg::Size)]
        verify: VerifyModeArg,
    },
    /// Verify a run's payload against its manifest.
    Verify {
        #[arg(long)]
        run: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyModeArg {
    None,
    Size,
}

impl From<VerifyModeArg> for wcbt_engine::restore::verify_stage::VerifyStageMode {
    fn from(mode: VerifyModeArg) -> Self {
        match mode {
            VerifyModeArg::None => wcbt_engine::restore::verify_stage::VerifyStageMode::None,
            VerifyModeArg::Size => wcbt_engine::restore::verify_stage::VerifyStageMode::Size,
        }
    }
}
