//! Geometric text extraction from rendered PDFs.
//!
//! Content streams are interpreted just far enough to place every shown
//! string on the page: the current transformation matrix (`cm`, `q`, `Q`),
//! the text and line matrices (`BT`, `Td`, `TD`, `Tm`, `T*`, `TL`), the
//! font (`Tf`) and spacing (`Tc`, `Tw`, `Tz`). Glyphs advance by the widths
//! the font declares. Shown strings become fragments, fragments become
//! words, and words sharing a `top` become lines.

use std::path::Path;

use crate::detect::{detect_format_from_path, InputFormat};
use crate::error::{Error, Result};
use crate::model::{GeoLine, GeoPage, GeoToken, GeometryDocument};

use super::backend::{ContentOp, FontWidths, LopdfBackend, PageId, PdfBackend, PdfValue};
use super::options::{ErrorMode, GeometryOptions};

/// Estimated glyph advance as a fraction of the font size, for fonts that
/// declare no widths.
pub const CHAR_WIDTH_RATIO: f32 = 0.5;

/// Estimated ascent as a fraction of the font size.
pub const ASCENT_RATIO: f32 = 0.8;

/// Extracts positioned words and lines from a PDF.
pub struct GeometryExtractor<B = LopdfBackend> {
    backend: B,
    options: GeometryOptions,
}

impl GeometryExtractor<LopdfBackend> {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, GeometryOptions::default())
    }

    /// Open a PDF file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: GeometryOptions) -> Result<Self> {
        let path = path.as_ref();
        match detect_format_from_path(path)? {
            InputFormat::Pdf { .. } => {}
            other => {
                return Err(Error::UnknownFormat(format!(
                    "expected a PDF, found {}",
                    other
                )))
            }
        }
        Ok(Self::with_backend(LopdfBackend::load_file(path)?, options))
    }

    /// Read a PDF from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, GeometryOptions::default())
    }

    /// Read a PDF from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: GeometryOptions) -> Result<Self> {
        Ok(Self::with_backend(LopdfBackend::load_bytes(data)?, options))
    }
}

impl<B: PdfBackend> GeometryExtractor<B> {
    /// Extract through a custom backend.
    pub fn with_backend(backend: B, options: GeometryOptions) -> Self {
        Self { backend, options }
    }

    /// Extract every selected page.
    pub fn extract(&self) -> Result<GeometryDocument> {
        let mut document = GeometryDocument::new();
        document.metadata = self.backend.metadata();

        let pages = self.backend.pages();
        let count = pages.len() as u32;
        if let Some(last) = self.options.pages.last().filter(|&last| last > count) {
            if self.options.error_mode == ErrorMode::Strict {
                return Err(Error::PageOutOfRange(last, count));
            }
            log::warn!("Page {} is out of range (document has {} pages)", last, count);
        }

        for (number, page_id) in pages {
            if !self.options.pages.includes(number) {
                continue;
            }
            let page = match self.extract_page(number, page_id) {
                Ok(page) => page,
                Err(e) if self.options.error_mode == ErrorMode::Lenient => {
                    log::warn!("Skipping text of page {}: {}", number, e);
                    let [x0, y0, x1, y1] = self.backend.media_box(page_id);
                    GeoPage::new(number, x1 - x0, y1 - y0)
                }
                Err(e) => return Err(e),
            };
            document.pages.push(page);
        }

        log::info!(
            "Extracted {} words on {} pages",
            document.word_count(),
            document.page_count()
        );
        Ok(document)
    }

    fn extract_page(&self, number: u32, page_id: PageId) -> Result<GeoPage> {
        let [x0, y0, x1, y1] = self.backend.media_box(page_id);
        let mut page = GeoPage::new(number, x1 - x0, y1 - y0);

        let fonts = self.backend.page_fonts(page_id)?;
        let content = self.backend.page_content(page_id)?;
        let ops = self.backend.decode_content(&content)?;

        let fragments = interpret(&ops, |key, bytes| {
            let info = fonts.iter().find(|f| f.name == key);
            let text = self.backend.decode_text(page_id, key, bytes);
            Shown {
                glyphs: glyphs(info.map(|f| &f.widths), bytes, &text),
                font: info
                    .map(|f| f.base_font.clone())
                    .unwrap_or_else(|| String::from_utf8_lossy(key).to_string()),
                text,
            }
        });

        let words = assemble_words(&fragments, self.options.x_tolerance, self.options.y_tolerance);
        page.tokens = words
            .into_iter()
            .map(|w| GeoToken {
                top: y1 - (w.baseline + ASCENT_RATIO * w.size),
                x0: w.x0 - x0,
                text: w.text,
                size: w.size,
                font: w.font,
                page: number,
            })
            .collect();
        page.tokens
            .sort_by(|a, b| a.top.total_cmp(&b.top).then(a.x0.total_cmp(&b.x0)));
        page.lines = group_lines(&page.tokens, self.options.y_tolerance);

        log::debug!(
            "Page {}: {} fragments, {} words, {} lines",
            number,
            fragments.len(),
            page.tokens.len(),
            page.lines.len()
        );
        Ok(page)
    }
}

/// Group tokens sorted by `(top, x0)` into lines.
///
/// A line's reference is its first token; a token more than `y_tolerance`
/// away from that reference starts a new line.
pub fn group_lines(tokens: &[GeoToken], y_tolerance: f32) -> Vec<GeoLine> {
    let mut lines = Vec::new();
    let mut start = 0;

    for i in 1..=tokens.len() {
        let breaks = i == tokens.len() || (tokens[i].top - tokens[start].top).abs() > y_tolerance;
        if breaks {
            if let Some(line) = GeoLine::from_tokens(&tokens[start..i]) {
                lines.push(line);
            }
            start = i;
        }
    }

    lines
}

/// A decoded string operand of a show operator.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Shown {
    pub font: String,
    pub text: String,
    pub glyphs: Vec<Glyph>,
}

/// One shown character code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Glyph {
    /// Advance in thousandths of an em
    pub width: f32,
    /// Single-byte space, subject to word spacing
    pub word_space: bool,
}

/// Glyphs of shown bytes. Without declared widths every decoded character
/// gets the estimated advance.
pub(crate) fn glyphs(widths: Option<&FontWidths>, bytes: &[u8], text: &str) -> Vec<Glyph> {
    let estimate = CHAR_WIDTH_RATIO * 1000.0;
    match widths.filter(|w| !w.is_empty()) {
        Some(widths) => widths
            .codes(bytes)
            .into_iter()
            .map(|code| Glyph {
                width: widths.width(code).unwrap_or(estimate),
                word_space: widths.code_length == 1 && code == 32,
            })
            .collect(),
        None => text
            .chars()
            .map(|c| Glyph {
                width: estimate,
                word_space: c == ' ',
            })
            .collect(),
    }
}

/// A shown string placed in user space.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Fragment {
    pub text: String,
    pub x: f32,
    pub baseline: f32,
    pub size: f32,
    /// User space advance of each character of `text`
    pub advances: Vec<f32>,
    pub font: String,
}

/// A word before conversion to top-down coordinates.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawWord {
    pub text: String,
    pub x0: f32,
    pub x1: f32,
    pub baseline: f32,
    pub size: f32,
    pub font: String,
    // Whether the word reached the end of its fragment without whitespace.
    open_right: bool,
}

/// Affine matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    fn from_operands(op: &ContentOp) -> Option<Self> {
        let mut m = [0.0; 6];
        for (i, slot) in m.iter_mut().enumerate() {
            *slot = op.number(i)?;
        }
        Some(Matrix(m))
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(self, other: Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn origin(self) -> (f32, f32) {
        (self.0[4], self.0[5])
    }

    fn horizontal_scale(self) -> f32 {
        (self.0[0] * self.0[0] + self.0[1] * self.0[1]).sqrt()
    }

    fn vertical_scale(self) -> f32 {
        (self.0[2] * self.0[2] + self.0[3] * self.0[3]).sqrt()
    }
}

#[derive(Debug, Clone)]
struct TextState {
    tm: Matrix,
    tlm: Matrix,
    leading: f32,
    font_key: Vec<u8>,
    font_size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scaling: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            leading: 0.0,
            font_key: Vec::new(),
            font_size: 12.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scaling: 1.0,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).then(self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn advance(&mut self, tx: f32) {
        self.tm = Matrix::translation(tx, 0.0).then(self.tm);
    }

    /// Horizontal displacement of one glyph in text space.
    fn glyph_advance(&self, glyph: &Glyph) -> f32 {
        let word = if glyph.word_space { self.word_spacing } else { 0.0 };
        (glyph.width / 1000.0 * self.font_size + self.char_spacing + word) * self.horizontal_scaling
    }
}

/// Walk content operations and collect shown strings.
///
/// `resolve(font_key, bytes)` returns the font's base name, the decoded
/// text and the glyph widths.
pub(crate) fn interpret<F>(ops: &[ContentOp], mut resolve: F) -> Vec<Fragment>
where
    F: FnMut(&[u8], &[u8]) -> Shown,
{
    let mut fragments = Vec::new();
    let mut ctm = Matrix::IDENTITY;
    let mut ctm_stack: Vec<Matrix> = Vec::new();
    let mut text = TextState::default();
    let mut in_text = false;

    for op in ops {
        match op.operator.as_str() {
            "q" => ctm_stack.push(ctm),
            "Q" => ctm = ctm_stack.pop().unwrap_or(Matrix::IDENTITY),
            "cm" => {
                if let Some(m) = Matrix::from_operands(op) {
                    ctm = m.then(ctm);
                }
            }
            "BT" => {
                in_text = true;
                text.tm = Matrix::IDENTITY;
                text.tlm = Matrix::IDENTITY;
            }
            "ET" => in_text = false,
            "Tf" => {
                if let Some(PdfValue::Name(key)) = op.operands.first() {
                    text.font_key = key.clone();
                }
                if let Some(size) = op.number(1) {
                    text.font_size = size;
                }
            }
            "TL" => text.leading = op.number(0).unwrap_or(0.0),
            "Tc" => text.char_spacing = op.number(0).unwrap_or(0.0),
            "Tw" => text.word_spacing = op.number(0).unwrap_or(0.0),
            "Tz" => text.horizontal_scaling = op.number(0).unwrap_or(100.0) / 100.0,
            "Td" => text.move_line(op.number(0).unwrap_or(0.0), op.number(1).unwrap_or(0.0)),
            "TD" => {
                let ty = op.number(1).unwrap_or(0.0);
                text.leading = -ty;
                text.move_line(op.number(0).unwrap_or(0.0), ty);
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(op) {
                    text.tlm = m;
                    text.tm = m;
                }
            }
            "T*" => text.next_line(),
            "Tj" | "'" | "\"" | "TJ" if in_text => {
                if op.operator == "\"" {
                    if let (Some(aw), Some(ac)) = (op.number(0), op.number(1)) {
                        text.word_spacing = aw;
                        text.char_spacing = ac;
                    }
                }
                if op.operator == "'" || op.operator == "\"" {
                    text.next_line();
                }
                let items: Vec<&PdfValue> = match (op.operator.as_str(), op.operands.as_slice()) {
                    ("TJ", [PdfValue::Array(items)]) => items.iter().collect(),
                    ("\"", [_, _, s]) => vec![s],
                    (_, [s, ..]) => vec![s],
                    _ => Vec::new(),
                };
                for item in items {
                    match item {
                        PdfValue::Str(bytes) => {
                            let shown = resolve(&text.font_key, bytes);
                            show(&mut fragments, &mut text, ctm, shown);
                        }
                        // Positive adjustments move left, in thousandths of an em.
                        other => {
                            if let Some(adjust) = other.as_f32() {
                                text.advance(-adjust / 1000.0 * text.font_size * text.horizontal_scaling);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fragments
}

fn show(fragments: &mut Vec<Fragment>, text: &mut TextState, ctm: Matrix, shown: Shown) {
    let Shown { font, text: decoded, glyphs } = shown;
    let advances: Vec<f32> = glyphs.iter().map(|g| text.glyph_advance(g)).collect();
    let total: f32 = advances.iter().sum();

    let rendering = text.tm.then(ctm);
    let (x, baseline) = rendering.origin();
    let size = text.font_size * rendering.vertical_scale();
    let scale = rendering.horizontal_scale();

    if !decoded.trim().is_empty() {
        let chars = decoded.chars().count();
        // Ligatures and multi-code characters share the string's advance evenly.
        let advances = if advances.len() == chars {
            advances.iter().map(|a| a * scale).collect()
        } else {
            vec![total * scale / chars as f32; chars]
        };
        fragments.push(Fragment {
            text: decoded,
            x,
            baseline,
            size,
            advances,
            font,
        });
    }
    text.advance(total);
}

/// Split fragments on whitespace and join pieces across fragments when they
/// sit on the same baseline with a gap of at most `x_tolerance`.
pub(crate) fn assemble_words(fragments: &[Fragment], x_tolerance: f32, y_tolerance: f32) -> Vec<RawWord> {
    let mut words: Vec<RawWord> = Vec::new();

    for frag in fragments {
        let mut current: Option<RawWord> = None;
        let mut at_fragment_start = true;
        let mut pen = frag.x;

        for (c, advance) in frag.text.chars().zip(frag.advances.iter().copied()) {
            let x = pen;
            pen += advance;
            if c.is_whitespace() {
                if let Some(mut word) = current.take() {
                    word.open_right = false;
                    words.push(word);
                }
                at_fragment_start = false;
                continue;
            }

            match current.as_mut() {
                Some(word) => {
                    word.text.push(c);
                    word.x1 = pen;
                }
                None => {
                    let joined = at_fragment_start
                        && words.last_mut().is_some_and(|prev| {
                            if !joins(prev, x, frag.baseline, x_tolerance, y_tolerance) {
                                return false;
                            }
                            prev.text.push(c);
                            prev.x1 = pen;
                            true
                        });
                    current = if joined {
                        words.pop()
                    } else {
                        Some(RawWord {
                            text: c.to_string(),
                            x0: x,
                            x1: pen,
                            baseline: frag.baseline,
                            size: frag.size,
                            font: frag.font.clone(),
                            open_right: true,
                        })
                    };
                }
            }
            at_fragment_start = false;
        }

        if let Some(mut word) = current.take() {
            word.open_right = true;
            words.push(word);
        }
    }

    words
}

fn joins(prev: &RawWord, x: f32, baseline: f32, x_tolerance: f32, y_tolerance: f32) -> bool {
    prev.open_right
        && (prev.baseline - baseline).abs() <= y_tolerance
        && x >= prev.x0
        && x - prev.x1 <= x_tolerance
}
