//! Execution journal: one line per executed backup op, in plan order.

use serde::{Deserialize, Serialize};

use crate::schema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JournalOutcome {
    Copied,
    SkippedDryRun,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalRecord {
    pub schema: String,
    pub run_id: String,
    pub rel_path: String,
    pub outcome: JournalOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_size: Option<u64>,
}

impl JournalRecord {
    pub fn copied(run_id: &str, rel_path: &str, hash: String, size: u64) -> Self {
        Self {
            schema: schema::JOURNAL_RECORD_V1.to_string(),
            run_id: run_id.to_string(),
            rel_path: rel_path.to_string(),
            outcome: JournalOutcome::Copied,
            error: None,
            observed_hash: Some(hash),
            observed_size: Some(size),
        }
    }

    pub fn skipped_dry_run(run_id: &str, rel_path: &str, hash: String, size: u64) -> Self {
        Self {
            schema: schema::JOURNAL_RECORD_V1.to_string(),
            run_id: run_id.to_string(),
            rel_path: rel_path.to_string(),
            outcome: JournalOutcome::SkippedDryRun,
            error: None,
            observed_hash: Some(hash),
            observed_size: Some(size),
        }
    }

    pub fn failed(run_id: &str, rel_path: &str, error: impl Into<String>) -> Self {
        Self {
            schema: schema::JOURNAL_RECORD_V1.to_string(),
            run_id: run_id.to_string(),
            rel_path: rel_path.to_string(),
            outcome: JournalOutcome::Failed,
            error: Some(error.into()),
            observed_hash: None,
            observed_size: None,
        }
    }
}
