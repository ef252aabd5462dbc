//! PDF backend abstraction layer.
//!
//! Geometric extraction only needs page enumeration, page boxes, font names,
//! decoded content operations and text decoding. The [`PdfBackend`] trait
//! exposes exactly that, so the extractor never touches lopdf types.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::error::{Error, Result};
use crate::model::Metadata;

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// US Letter, used when a page declares no usable MediaBox.
pub const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Font resource declared on a page.
#[derive(Debug, Clone)]
pub struct BackendFontInfo {
    /// Resource name (key in the page's font dictionary)
    pub name: Vec<u8>,
    /// Base font name (e.g., "EBGaramond-Bold")
    pub base_font: String,
    /// Declared glyph widths
    pub widths: FontWidths,
}

/// Glyph widths declared by a font, in thousandths of text space.
#[derive(Debug, Clone, PartialEq)]
pub struct FontWidths {
    /// Bytes per character code: 1 for simple fonts, 2 for composite fonts
    pub code_length: usize,
    /// Explicit widths by character code
    pub widths: BTreeMap<u32, f32>,
    /// Width of codes without an explicit entry
    pub default_width: Option<f32>,
}

impl Default for FontWidths {
    fn default() -> Self {
        Self {
            code_length: 1,
            widths: BTreeMap::new(),
            default_width: None,
        }
    }
}

impl FontWidths {
    /// Widths of a simple font: `/FirstChar`, `/Widths` and `/MissingWidth`.
    pub fn simple(first_char: u32, widths: &[f32], missing_width: Option<f32>) -> Self {
        Self {
            code_length: 1,
            widths: (first_char..).zip(widths.iter().copied()).collect(),
            default_width: Some(missing_width.unwrap_or(0.0)),
        }
    }

    /// True when the font declares nothing, as the standard 14 fonts may.
    pub fn is_empty(&self) -> bool {
        self.widths.is_empty() && self.default_width.is_none()
    }

    /// Split shown bytes into character codes.
    pub fn codes(&self, bytes: &[u8]) -> Vec<u32> {
        match self.code_length {
            2 => bytes
                .chunks(2)
                .map(|c| c.iter().fold(0u32, |code, &b| (code << 8) | b as u32))
                .collect(),
            _ => bytes.iter().map(|&b| b as u32).collect(),
        }
    }

    /// Width of a character code.
    pub fn width(&self, code: u32) -> Option<f32> {
        self.widths.get(&code).copied().or(self.default_width)
    }
}

/// A content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    /// Numeric value, if the operand is a number.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            PdfValue::Integer(i) => Some(*i as f32),
            PdfValue::Real(r) => Some(*r),
            _ => None,
        }
    }
}

/// A single content stream operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// Build an operation from an operator and operands.
    pub fn new(operator: impl Into<String>, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }

    /// The `i`th operand as a number.
    pub fn number(&self, i: usize) -> Option<f32> {
        self.operands.get(i).and_then(PdfValue::as_f32)
    }
}

/// Read access to a PDF document, as needed for geometric extraction.
pub trait PdfBackend {
    /// All pages as page number → id.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// The page's MediaBox `[x0, y0, x1, y1]`, following inheritance.
    fn media_box(&self, page: PageId) -> [f32; 4];

    /// Font resources of a page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>>;

    /// Decompressed content stream bytes of a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse content bytes into operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Decode shown bytes with the font's encoding, falling back to
    /// [`decode_text_simple`].
    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String;

    /// Document information dictionary and version.
    fn metadata(&self) -> Metadata;
}

/// Decode bytes without a font encoding: UTF-16BE with BOM, UTF-8, then Latin-1.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self::from_document(doc))
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self::from_document(doc))
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        if doc.is_encrypted() {
            log::warn!("PDF is encrypted; text may not decode");
        }
        Self { doc }
    }

    fn inherited<'a>(&'a self, mut dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        // Parent chains are short; bound the walk against cycles.
        for _ in 0..32 {
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn number(&self, obj: &Object) -> Option<f32> {
        match self.resolve(obj) {
            Object::Integer(i) => Some(*i as f32),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    fn entry<'a>(&'a self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
        dict.get(key).ok().map(|obj| self.resolve(obj))
    }

    fn font_widths(&self, font: &Dictionary) -> FontWidths {
        let subtype = font.get(b"Subtype").and_then(Object::as_name).unwrap_or(b"");
        match subtype {
            b"Type0" => self.composite_widths(font),
            // Type 3 widths live in glyph space, scaled by the font matrix.
            b"Type3" => FontWidths::default(),
            _ => {
                let Some(Object::Array(widths)) = self.entry(font, b"Widths") else {
                    return FontWidths::default();
                };
                let first_char = self
                    .entry(font, b"FirstChar")
                    .and_then(|o| self.number(o))
                    .unwrap_or(0.0) as u32;
                let missing_width = self
                    .entry(font, b"FontDescriptor")
                    .and_then(|o| o.as_dict().ok())
                    .and_then(|d| self.entry(d, b"MissingWidth"))
                    .and_then(|o| self.number(o));
                let widths: Vec<f32> = widths
                    .iter()
                    .map(|o| self.number(o).unwrap_or(0.0))
                    .collect();
                FontWidths::simple(first_char, &widths, missing_width)
            }
        }
    }

    /// Widths of a Type 0 font from its descendant's `/W` and `/DW`.
    fn composite_widths(&self, font: &Dictionary) -> FontWidths {
        let mut result = FontWidths {
            code_length: 2,
            widths: BTreeMap::new(),
            default_width: Some(1000.0),
        };
        let Some(descendant) = self
            .entry(font, b"DescendantFonts")
            .and_then(|o| o.as_array().ok())
            .and_then(|a| a.first())
            .and_then(|o| self.resolve(o).as_dict().ok())
        else {
            return result;
        };

        if let Some(dw) = self.entry(descendant, b"DW").and_then(|o| self.number(o)) {
            result.default_width = Some(dw);
        }
        let Some(Object::Array(w)) = self.entry(descendant, b"W") else {
            return result;
        };

        // Entries are either `c [w1 w2 ...]` or `c_first c_last w`.
        let mut i = 0;
        while let Some(first) = w.get(i).and_then(|o| self.number(o)) {
            let first = first as u32;
            match w.get(i + 1).map(|o| self.resolve(o)) {
                Some(Object::Array(list)) => {
                    for (code, width) in (first..).zip(list.iter()) {
                        if let Some(width) = self.number(width) {
                            result.widths.insert(code, width);
                        }
                    }
                    i += 2;
                }
                Some(last) => {
                    let (Some(last), Some(width)) =
                        (self.number(last), w.get(i + 2).and_then(|o| self.number(o)))
                    else {
                        break;
                    };
                    let last = (last as u32).min(first.saturating_add(0xFFFF));
                    for code in first..=last {
                        result.widths.insert(code, width);
                    }
                    i += 3;
                }
                None => break,
            }
        }
        result
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(r) => self.doc.get_object(*r).unwrap_or(obj),
            other => other,
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn media_box(&self, page: PageId) -> [f32; 4] {
        let Ok(page_dict) = self.doc.get_dictionary(page) else {
            return DEFAULT_MEDIA_BOX;
        };
        let Some(Ok(array)) = self
            .inherited(page_dict, b"MediaBox")
            .map(|obj| self.resolve(obj).as_array())
        else {
            return DEFAULT_MEDIA_BOX;
        };

        let numbers: Vec<f32> = array.iter().filter_map(|o| self.number(o)).collect();
        match numbers.as_slice() {
            [x0, y0, x1, y1] => [x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)],
            _ => DEFAULT_MEDIA_BOX,
        }
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<BackendFontInfo>> {
        let fonts = self.doc.get_page_fonts(page)?;
        Ok(fonts
            .iter()
            .map(|(name, dict)| BackendFontInfo {
                name: name.clone(),
                base_font: dict
                    .get(b"BaseFont")
                    .and_then(Object::as_name)
                    .map(|n| strip_subset_tag(&String::from_utf8_lossy(n)).to_string())
                    .unwrap_or_else(|_| "Unknown".to_string()),
                widths: self.font_widths(dict),
            })
            .collect())
    }

    fn page_content(&self, page: PageId) -> Result<Vec<u8>> {
        Ok(self.doc.get_page_content(page)?)
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content = lopdf::content::Content::decode(data)?;
        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operands: op.operands.iter().map(convert_object).collect(),
                operator: op.operator,
            })
            .collect())
    }

    fn decode_text(&self, page: PageId, font_name: &[u8], bytes: &[u8]) -> String {
        let decoded = self.doc.get_page_fonts(page).ok().and_then(|fonts| {
            let encoding = fonts.get(font_name)?.get_font_encoding(&self.doc).ok()?;
            LopdfDocument::decode_text(&encoding, bytes).ok()
        });
        decoded.unwrap_or_else(|| decode_text_simple(bytes))
    }

    fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::with_version(self.doc.version.clone());
        metadata.page_count = self.doc.get_pages().len() as u32;

        let info = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .map(|obj| self.resolve(obj))
            .and_then(|obj| obj.as_dict().ok());
        if let Some(info) = info {
            metadata.title = info_string(info, b"Title");
            metadata.author = info_string(info, b"Author");
            metadata.subject = info_string(info, b"Subject");
            metadata.creator = info_string(info, b"Creator");
            metadata.producer = info_string(info, b"Producer");
            metadata.created = info_string(info, b"CreationDate").and_then(|s| parse_pdf_date(&s));
            metadata.modified = info_string(info, b"ModDate").and_then(|s| parse_pdf_date(&s));
        }

        metadata
    }
}

fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Embedded fonts carry a six-letter subset prefix (`ABCDEF+EBGaramond`).
fn strip_subset_tag(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.chars().all(|c| c.is_ascii_uppercase()) => rest,
        _ => name,
    }
}

fn info_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
        _ => None,
    }
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSS...`). Offsets are ignored.
pub fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);
    let field = |range: std::ops::Range<usize>, default: u32| {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };

    let year: i32 = s.get(0..4)?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1))?
        .and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0))
        .map(|dt| DateTime::from_naive_utc_and_offset(dt, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use lopdf::dictionary;

    #[test]
    fn test_decode_text_simple() {
        assert_eq!(decode_text_simple(b"Hello"), "Hello");
        assert_eq!(decode_text_simple(&[0x48, 0xE9]), "H\u{e9}");
        assert_eq!(decode_text_simple(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]), "Hi");
    }

    #[test]
    fn test_pdf_value_numbers() {
        assert_eq!(PdfValue::Integer(42).as_f32(), Some(42.0));
        assert_eq!(PdfValue::Real(1.5).as_f32(), Some(1.5));
        assert_eq!(PdfValue::Other.as_f32(), None);

        let op = ContentOp::new("Td", vec![PdfValue::Integer(72), PdfValue::Real(700.5)]);
        assert_eq!(op.number(1), Some(700.5));
        assert_eq!(op.number(2), None);
    }

    #[test]
    fn test_parse_pdf_date() {
        let date = parse_pdf_date("D:20240115103045+01'00'").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 1, 15));
        assert_eq!((date.hour(), date.minute(), date.second()), (10, 30, 45));

        let minimal = parse_pdf_date("D:2024").unwrap();
        assert_eq!((minimal.month(), minimal.day()), (1, 1));
        assert!(parse_pdf_date("D:20").is_none());
    }

    #[test]
    fn test_strip_subset_tag() {
        assert_eq!(strip_subset_tag("ABCDEF+EBGaramond-Bold"), "EBGaramond-Bold");
        assert_eq!(strip_subset_tag("Helvetica"), "Helvetica");
        assert_eq!(strip_subset_tag("abc+Font"), "abc+Font");
    }

    #[test]
    fn test_simple_font_widths() {
        let backend = LopdfBackend::from_document(LopdfDocument::with_version("1.5"));
        let font = lopdf::dictionary! {
            "Subtype" => "TrueType",
            "FirstChar" => Object::Integer(65),
            "Widths" => vec![Object::Integer(667), Object::Real(722.5)],
            "FontDescriptor" => lopdf::dictionary! { "MissingWidth" => Object::Integer(250) },
        };
        let widths = backend.font_widths(&font);
        assert_eq!(widths.codes(b"AB"), vec![65, 66]);
        assert_eq!(widths.width(65), Some(667.0));
        assert_eq!(widths.width(66), Some(722.5));
        assert_eq!(widths.width(67), Some(250.0));

        let standard = lopdf::dictionary! { "Subtype" => "Type1", "BaseFont" => "Helvetica" };
        assert!(backend.font_widths(&standard).is_empty());
    }

    #[test]
    fn test_composite_font_widths() {
        let backend = LopdfBackend::from_document(LopdfDocument::with_version("1.5"));
        let font = lopdf::dictionary! {
            "Subtype" => "Type0",
            "DescendantFonts" => vec![Object::Dictionary(lopdf::dictionary! {
                "DW" => Object::Integer(600),
                "W" => vec![
                    Object::Integer(3),
                    Object::Array(vec![Object::Integer(250), Object::Integer(333)]),
                    Object::Integer(10),
                    Object::Integer(12),
                    Object::Integer(500),
                ],
            })],
        };
        let widths = backend.font_widths(&font);
        assert_eq!(widths.codes(&[0x00, 0x03, 0x00, 0x0B]), vec![3, 11]);
        assert_eq!(widths.width(4), Some(333.0));
        assert_eq!(widths.width(11), Some(500.0));
        assert_eq!(widths.width(13), Some(600.0));
    }

    #[test]
    fn test_load_garbage() {
        assert!(LopdfBackend::load_bytes(b"not a pdf").is_err());
    }
}
