//! Document model types for the fidelity pipeline.
//!
//! Two representations live here: the [`SemanticDocument`] extracted from a
//! word-processing source, and the [`GeometryDocument`] recovered from the
//! rendered PDF. The [`AuditReport`] compares a [`Profile`] against the latter.

mod block;
mod document;
mod geometry;
mod paragraph;
mod profile;
mod report;
mod table;

pub use block::{Block, EMPTY_PARAGRAPH_SPACE};
pub use document::{twips_to_points, PageSetup, SemanticDocument, PRIMARY_FONT};
pub use geometry::{GeoLine, GeoPage, GeoToken, GeometryDocument, Metadata};
pub use paragraph::{
    Alignment, Paragraph, ParagraphStyle, Rgb, Run, RunStyle, DEFAULT_RUN_SIZE,
    DEFAULT_SPACE_AFTER,
};
pub use profile::{unwrap_root, Profile, DEFAULT_ROOT_NAME};
pub use report::{AuditMetrics, AuditReport, AuditStatus, ISSUE_PENALTY};
pub use table::{Cell, Table};
