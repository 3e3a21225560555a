//! Verify artifacts: per-entry records and the aggregate report.

use serde::{Deserialize, Serialize};

use crate::schema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VerifyStatus {
    Ok,
    Missing,
    Unreadable,
    HashMismatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyRecord {
    pub schema: String,
    pub run_id: String,
    pub path: String,
    pub status: VerifyStatus,
}

impl VerifyRecord {
    pub fn new(run_id: &str, path: &str, status: VerifyStatus) -> Self {
        Self {
            schema: schema::VERIFY_RECORD_V1.to_string(),
            run_id: run_id.to_string(),
            path: path.to_string(),
            status,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyCounts {
    pub ok: u64,
    pub missing: u64,
    pub unreadable: u64,
    pub hash_mismatch: u64,
}

impl VerifyCounts {
    pub fn record(&mut self, status: VerifyStatus) {
        match status {
            VerifyStatus::Ok => self.ok += 1,
            VerifyStatus::Missing => self.missing += 1,
            VerifyStatus::Unreadable => self.unreadable += 1,
            VerifyStatus::HashMismatch => self.hash_mismatch += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.ok + self.missing + self.unreadable + self.hash_mismatch
    }

    pub fn all_ok(&self) -> bool {
        self.missing == 0 && self.unreadable == 0 && self.hash_mismatch == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VerifyReport {
    pub schema: String,
    pub run_id: String,
    pub algorithm: String,
    pub counts: VerifyCounts,
    pub total: u64,
}

impl VerifyReport {
    pub fn new(run_id: &str, algorithm: &str, counts: VerifyCounts) -> Self {
        Self {
            schema: schema::VERIFY_REPORT_V1.to_string(),
            run_id: run_id.to_string(),
            algorithm: algorithm.to_string(),
            total: counts.total(),
            counts,
        }
    }
}
