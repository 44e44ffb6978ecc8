//! proof-cli
//!
//! Orchestration behind the `proof` binary: loads config and dataset, runs
//! the audit across categories, and writes the report.

pub mod access;
pub mod cancel;
pub mod commands;
pub mod orchestrate;

pub use cancel::CancelToken;
pub use orchestrate::{
    audit_category, run_audit, AuditOptions, AuditOutcome, PacingPolicy, RunPlan,
};
