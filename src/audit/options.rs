//! Audit thresholds and source-of-truth locations.

use std::path::PathBuf;

use crate::parser::GeometryOptions;

/// Minimum partial-ratio score for an entity to count as present.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 85.0;

/// Largest mean `top` (points from the page top) allowed for the name.
pub const DEFAULT_DRIFT_THRESHOLD: f32 = 150.0;

/// Directory trusted source profiles must live in.
pub const DEFAULT_CANONICAL_DIR: &str = "data/masters";

/// Options for the fidelity auditor.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Fuzzy score below which an entity is reported missing
    pub fuzzy_threshold: f64,

    /// Mean vertical position above which the name is reported as drifted
    pub drift_threshold: f32,

    /// Canonical data directory, relative to the sandbox root unless absolute
    pub canonical_dir: PathBuf,

    /// Root no source path may escape; the working directory when unset
    pub sandbox_root: Option<PathBuf>,

    /// Geometry extraction settings for the rendered PDF
    pub geometry: GeometryOptions,
}

impl AuditOptions {
    /// Create new audit options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fuzzy threshold, clamped to `0..=100`.
    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold.clamp(0.0, 100.0);
        self
    }

    /// Set the drift threshold.
    pub fn with_drift_threshold(mut self, threshold: f32) -> Self {
        self.drift_threshold = threshold;
        self
    }

    /// Set the canonical data directory.
    pub fn with_canonical_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.canonical_dir = dir.into();
        self
    }

    /// Set the sandbox root.
    pub fn with_sandbox_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sandbox_root = Some(root.into());
        self
    }

    /// Set geometry extraction options.
    pub fn with_geometry(mut self, geometry: GeometryOptions) -> Self {
        self.geometry = geometry;
        self
    }
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            drift_threshold: DEFAULT_DRIFT_THRESHOLD,
            canonical_dir: PathBuf::from(DEFAULT_CANONICAL_DIR),
            sandbox_root: None,
            geometry: GeometryOptions::default(),
        }
    }
}
