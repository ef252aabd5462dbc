//! Geometric types recovered from a rendered PDF.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Geometry extracted from every selected page of a PDF.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryDocument {
    /// Document metadata
    pub metadata: Metadata,

    /// Pages in document order
    pub pages: Vec<GeoPage>,
}

impl GeometryDocument {
    /// Create a new empty geometry document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of extracted pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Iterate over all tokens across pages.
    pub fn tokens(&self) -> impl Iterator<Item = &GeoToken> {
        self.pages.iter().flat_map(|p| p.tokens.iter())
    }

    /// Iterate over all lines across pages.
    pub fn lines(&self) -> impl Iterator<Item = &GeoLine> {
        self.pages.iter().flat_map(|p| p.lines.iter())
    }

    /// Concatenate all token texts with no separator.
    pub fn concatenated_text(&self) -> String {
        self.tokens().map(|t| t.text.as_str()).collect()
    }

    /// Total number of word tokens.
    pub fn word_count(&self) -> usize {
        self.pages.iter().map(|p| p.tokens.len()).sum()
    }
}

/// A single page of geometric text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoPage {
    /// Page number (1-indexed)
    pub number: u32,

    /// Page width in points
    pub width: f32,

    /// Page height in points
    pub height: f32,

    /// Word tokens in reading order
    pub tokens: Vec<GeoToken>,

    /// Tokens grouped into lines
    pub lines: Vec<GeoLine>,
}

impl GeoPage {
    /// Create a page with no content.
    pub fn new(number: u32, width: f32, height: f32) -> Self {
        Self {
            number,
            width,
            height,
            tokens: Vec::new(),
            lines: Vec::new(),
        }
    }
}

/// One extracted word with position and font.
///
/// `top` is measured downward from the top edge of the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoToken {
    /// Word text
    pub text: String,

    /// Left edge in points
    pub x0: f32,

    /// Distance from the top of the page in points
    pub top: f32,

    /// Font size in points
    pub size: f32,

    /// Font name as declared in the PDF
    pub font: String,

    /// Page number (1-indexed)
    pub page: u32,
}

impl GeoToken {
    /// Whether the font name indicates a bold face.
    pub fn is_bold(&self) -> bool {
        self.font.to_lowercase().contains("bold")
    }
}

/// Tokens sharing approximately the same `top`, merged into one line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLine {
    /// Token texts joined by single spaces
    pub text: String,

    /// Minimum left edge
    pub x0: f32,

    /// Minimum top
    pub top: f32,

    /// Mean font size
    pub size: f32,

    /// Whether any token uses a bold face
    pub bold: bool,

    /// Distinct font names
    pub fonts: BTreeSet<String>,
}

impl GeoLine {
    /// Aggregate a non-empty group of tokens. Returns `None` for an empty group.
    pub fn from_tokens(tokens: &[GeoToken]) -> Option<Self> {
        if tokens.is_empty() {
            return None;
        }

        let text = tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let text: String = text.chars().filter(|c| !c.is_control()).collect();
        let x0 = tokens.iter().map(|t| t.x0).fold(f32::INFINITY, f32::min);
        let top = tokens.iter().map(|t| t.top).fold(f32::INFINITY, f32::min);
        let size = tokens.iter().map(|t| t.size).sum::<f32>() / tokens.len() as f32;
        let fonts: BTreeSet<String> = tokens.iter().map(|t| t.font.clone()).collect();
        let bold = tokens.iter().any(GeoToken::is_bold);

        Some(Self {
            text,
            x0,
            top,
            size,
            bold,
            fonts,
        })
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Total number of pages in the file
    pub page_count: u32,
}

impl Metadata {
    /// Create new metadata with PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: version.into(),
            ..Default::default()
        }
    }
}
