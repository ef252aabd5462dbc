//! Rendering of profiles and extracted documents into LaTeX.

mod dossier;
mod json;
mod latex;
mod options;
mod template;

pub use dossier::{validate_dossier, LABELED_LIST_KEYS, REQUIRED_KEYS};
pub use json::{to_json, JsonFormat};
pub use latex::{points, LatexWriter, LINE_SPREAD, TAB_MARKER};
pub use options::{RenderOptions, DOSSIER_MARKERS};
pub use template::{render, TemplateRenderer, ESCAPE_FILTER, MIRROR_TEMPLATE_NAME};
