//! Text utilities shared by the renderer and the auditor.
//!
//! - [`normalize`]: comparison form of a string (no whitespace, folded
//!   artifacts, lowercase)
//! - [`escape`] / [`escape_strict`]: LaTeX-safe form of a string
//! - [`partial_ratio`]: approximate substring similarity

mod escape;
mod fuzzy;
mod normalize;

pub use escape::{escape, escape_strict, EscapeMode, EscapeTable, Escaper};
pub use fuzzy::partial_ratio;
pub use normalize::{normalize, NormalizeTables, Normalizer};
