//! Fidelity audit report.

use serde::{Deserialize, Serialize};

/// Points deducted from the integrity score per recorded issue.
pub const ISSUE_PENALTY: u32 = 5;

/// Overall verdict of an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    /// No issues recorded
    Pass,
    /// At least one issue recorded
    Fail,
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditStatus::Pass => write!(f, "PASS"),
            AuditStatus::Fail => write!(f, "FAIL"),
        }
    }
}

/// Counters describing what the audit looked at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMetrics {
    /// Number of word tokens extracted from the rendered output
    pub target_word_count: usize,

    /// Number of non-empty source entities checked
    pub source_entity_count: usize,
}

/// The persisted outcome of a fidelity audit.
///
/// Fields are private so a report always agrees with its issue list;
/// build one with [`AuditReport::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    status: AuditStatus,
    integrity_score: u32,
    issues: Vec<String>,
    metrics: AuditMetrics,
}

impl AuditReport {
    /// Assemble a report, deriving status and score from the issues.
    pub fn new(issues: Vec<String>, metrics: AuditMetrics) -> Self {
        let status = if issues.is_empty() {
            AuditStatus::Pass
        } else {
            AuditStatus::Fail
        };
        let penalty = (issues.len() as u32).saturating_mul(ISSUE_PENALTY);
        Self {
            status,
            integrity_score: 100u32.saturating_sub(penalty),
            issues,
            metrics,
        }
    }

    /// Overall verdict.
    pub fn status(&self) -> AuditStatus {
        self.status
    }

    /// Score in `0..=100`.
    pub fn integrity_score(&self) -> u32 {
        self.integrity_score
    }

    /// Recorded issues in detection order.
    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    /// Audit counters.
    pub fn metrics(&self) -> AuditMetrics {
        self.metrics
    }

    /// Whether the audit passed.
    pub fn passed(&self) -> bool {
        self.status == AuditStatus::Pass
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
