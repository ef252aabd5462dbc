//! Fidelity audit of rendered output against source profiles.

mod auditor;
mod guard;
mod options;

pub use auditor::{audit, source_entities, FidelityAuditor, SourceEntity};
pub use guard::{validate_master_path, CheckedPath, SourceGuard};
pub use options::{
    AuditOptions, DEFAULT_CANONICAL_DIR, DEFAULT_DRIFT_THRESHOLD, DEFAULT_FUZZY_THRESHOLD,
};
