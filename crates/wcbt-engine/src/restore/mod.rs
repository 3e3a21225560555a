//! Restore pipeline: plan, materialize, stage, verify stage, promote.

pub mod execute;
pub mod materialize;
pub mod plan;
pub mod stage;
pub mod verify_stage;
