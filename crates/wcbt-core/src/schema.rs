//! Schema tag constants shared by every on-disk artifact.
//!
//! Every JSON document WCBT writes carries a `schema` field; this module is
//! the single source of truth for the known values so `schema_unsupported`
//! checks never drift from what the writers actually emit.

pub const RUN_MANIFEST_V1: &str = "wcbt_run_manifest_v1";
pub const BACKUP_PLAN_V1: &str = "wcbt_backup_plan_v1";
pub const JOURNAL_RECORD_V1: &str = "wcbt_journal_record_v1";
pub const RESTORE_PLAN_V1: &str = "wcbt_restore_plan_v1";
pub const RESTORE_CANDIDATE_V1: &str = "wcbt_restore_candidate_v1";
pub const STAGE_COPY_RECORD_V1: &str = "wcbt_stage_copy_record_v1";
pub const STAGE_VERIFY_RECORD_V1: &str = "wcbt_stage_verify_record_v1";
pub const VERIFY_RECORD_V1: &str = "wcbt_verify_record_v1";
pub const VERIFY_REPORT_V1: &str = "wcbt_verify_report_v1";

pub const KNOWN_SCHEMAS: &[&str] = &[
    RUN_MANIFEST_V1,
    BACKUP_PLAN_V1,
    JOURNAL_RECORD_V1,
    RESTORE_PLAN_V1,
    RESTORE_CANDIDATE_V1,
    STAGE_COPY_RECORD_V1,
    STAGE_VERIFY_RECORD_V1,
    VERIFY_RECORD_V1,
    VERIFY_REPORT_V1,
];

pub fn is_known(schema: &str) -> bool {
    KNOWN_SCHEMAS.contains(&schema)
}
