//! A backup plan: an ordered sequence of intended copy operations plus
//! their expected hashes. Hashing happens at plan time so the plan itself
//! is content-addressed, which is what makes dry-runs meaningful.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::manifest::HashAlgorithm;
use crate::schema;

/// In-memory planned copy. `source_abs`/`dest_abs` are machine-local and are
/// deliberately not part of [`PlanFileRecord`] so the serialized plan stays
/// comparable across machines/runs with identical source content.
#[derive(Debug, Clone)]
pub struct PlanOp {
    pub rel_path: String,
    pub source_abs: PathBuf,
    pub dest_abs: PathBuf,
    pub size_bytes: u64,
    pub expected_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanFileRecord {
    pub rel_path: String,
    pub size_bytes: u64,
    pub expected_hash: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupPlanDoc {
    pub schema: String,
    pub run_id: String,
    pub source_root: String,
    pub destination_root: String,
    pub hash_algorithm: HashAlgorithm,
    pub files: Vec<PlanFileRecord>,
}

impl BackupPlanDoc {
    pub fn new(
        run_id: impl Into<String>,
        source_root: impl Into<String>,
        destination_root: impl Into<String>,
        hash_algorithm: HashAlgorithm,
        ops: &[PlanOp],
    ) -> Self {
        Self {
            schema: schema::BACKUP_PLAN_V1.to_string(),
            run_id: run_id.into(),
            source_root: source_root.into(),
            destination_root: destination_root.into(),
            hash_algorithm,
            files: ops
                .iter()
                .map(|op| PlanFileRecord {
                    rel_path: op.rel_path.clone(),
                    size_bytes: op.size_bytes,
                    expected_hash: op.expected_hash.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_doc_is_deterministic_for_identical_ops() {
        let ops = vec![PlanOp {
            rel_path: "a.txt".to_string(),
            source_abs: PathBuf::from("/src/a.txt"),
            dest_abs: PathBuf::from("/dest/payload/a.txt"),
            size_bytes: 6,
            expected_hash: "abc123".to_string(),
        }];
        let a = BackupPlanDoc::new("run", "/src", "/dest", HashAlgorithm::Sha256, &ops);
        let b = BackupPlanDoc::new("run", "/src", "/dest", HashAlgorithm::Sha256, &ops);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
