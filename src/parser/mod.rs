//! Source extraction: DOCX structure and PDF geometry.

mod backend;
mod docx;
mod fonts;
mod geometry;
mod options;
mod probe;

pub use backend::{
    decode_text_simple, parse_pdf_date, BackendFontInfo, ContentOp, FontWidths, LopdfBackend, PageId,
    PdfBackend, PdfValue, DEFAULT_MEDIA_BOX,
};
pub use docx::DocxExtractor;
pub use fonts::{FontMap, FALLBACK_FONT};
pub use geometry::{group_lines, GeometryExtractor, ASCENT_RATIO, CHAR_WIDTH_RATIO};
pub use options::{ErrorMode, ExtractOptions, GeometryOptions, PageSelection, DEFAULT_TOLERANCE};
pub use probe::{probe_docx, probe_xml, ProbeFinding, ProbeReport};
