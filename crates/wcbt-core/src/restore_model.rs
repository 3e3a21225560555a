//! Restore-side data model: candidates built from a manifest, and the
//! record/summary shapes RestoreStage and RestoreVerifyStage emit.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::schema;

#[derive(Debug, Clone)]
pub struct RestoreCandidate {
    pub rel_path: String,
    pub source_abs: PathBuf,
    pub dest_abs: PathBuf,
    pub expected_hash: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestoreCandidateRecord {
    pub schema: String,
    pub rel_path: String,
    pub expected_hash: String,
    pub size_bytes: u64,
}

impl From<&RestoreCandidate> for RestoreCandidateRecord {
    fn from(c: &RestoreCandidate) -> Self {
        Self {
            schema: schema::RESTORE_CANDIDATE_V1.to_string(),
            rel_path: c.rel_path.clone(),
            expected_hash: c.expected_hash.clone(),
            size_bytes: c.size_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestorePlanDoc {
    pub schema: String,
    pub run_id: String,
    pub destination_root: String,
    pub candidates: Vec<RestoreCandidateRecord>,
}

impl RestorePlanDoc {
    pub fn new(run_id: impl Into<String>, destination_root: impl Into<String>, candidates: &[RestoreCandidate]) -> Self {
        Self {
            schema: schema::RESTORE_PLAN_V1.to_string(),
            run_id: run_id.into(),
            destination_root: destination_root.into(),
            candidates: candidates.iter().map(RestoreCandidateRecord::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageCopyOutcome {
    Copied,
    SkippedDryRun,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageCopyRecord {
    pub schema: String,
    pub rel_path: String,
    pub outcome: StageCopyOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageCopyRecord {
    pub fn new(rel_path: &str, outcome: StageCopyOutcome, error: Option<String>) -> Self {
        Self {
            schema: schema::STAGE_COPY_RECORD_V1.to_string(),
            rel_path: rel_path.to_string(),
            outcome,
            error,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageCopySummary {
    pub schema: String,
    pub status: StageStatus,
    pub copied: u64,
    pub skipped_dry_run: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageVerifyStatus {
    Ok,
    Missing,
    SizeMismatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageVerifyRecord {
    pub schema: String,
    pub rel_path: String,
    pub status: StageVerifyStatus,
}

impl StageVerifyRecord {
    pub fn new(rel_path: &str, status: StageVerifyStatus) -> Self {
        Self {
            schema: schema::STAGE_VERIFY_RECORD_V1.to_string(),
            rel_path: rel_path.to_string(),
            status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StageVerifySummary {
    pub schema: String,
    pub status: StageStatus,
    pub verified: u64,
    pub ok: u64,
    pub failed: u64,
}
