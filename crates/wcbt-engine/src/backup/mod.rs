//! Backup pipeline: scan source, build a hashed plan, execute it.

pub mod execute;
pub mod plan;
pub mod scan;

pub use execute::{BackupOutcome, PAYLOAD_DIR_NAME};
