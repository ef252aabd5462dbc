//! Extraction options and configuration.

use std::ops::RangeInclusive;

use super::fonts::FontMap;
use crate::model::{DEFAULT_SPACE_AFTER, EMPTY_PARAGRAPH_SPACE};

/// Options for extracting a semantic document from DOCX.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Source font to renderer font mapping
    pub font_map: FontMap,

    /// Source font assumed for runs that declare none
    pub default_font: String,

    /// Height of the space block emitted for empty paragraphs
    pub space_height: f32,

    /// Space after a paragraph when the source is silent
    pub default_space_after: f32,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the font map.
    pub fn with_font_map(mut self, font_map: FontMap) -> Self {
        self.font_map = font_map;
        self
    }

    /// Set the source font assumed for undeclared runs.
    pub fn with_default_font(mut self, font: impl Into<String>) -> Self {
        self.default_font = font.into();
        self
    }

    /// Set the empty-paragraph space height.
    pub fn with_space_height(mut self, height: f32) -> Self {
        self.space_height = height.max(0.0);
        self
    }

    /// Set the default space after paragraphs.
    pub fn with_default_space_after(mut self, points: f32) -> Self {
        self.default_space_after = points.max(0.0);
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            font_map: FontMap::default(),
            default_font: "Garamond".to_string(),
            space_height: EMPTY_PARAGRAPH_SPACE,
            default_space_after: DEFAULT_SPACE_AFTER,
        }
    }
}

/// Default horizontal and vertical tolerance in points.
pub const DEFAULT_TOLERANCE: f32 = 3.0;

/// Options for geometric extraction from PDF.
#[derive(Debug, Clone)]
pub struct GeometryOptions {
    /// Maximum horizontal gap between fragments of one word
    pub x_tolerance: f32,

    /// Maximum vertical offset from a line's first token
    pub y_tolerance: f32,

    /// Which pages to extract
    pub pages: PageSelection,

    /// Error handling mode
    pub error_mode: ErrorMode,
}

impl GeometryOptions {
    /// Create new geometry options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the horizontal tolerance.
    pub fn with_x_tolerance(mut self, tolerance: f32) -> Self {
        self.x_tolerance = tolerance.max(0.0);
        self
    }

    /// Set the vertical tolerance.
    pub fn with_y_tolerance(mut self, tolerance: f32) -> Self {
        self.y_tolerance = tolerance.max(0.0);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip unreadable pages).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }
}

impl Default for GeometryOptions {
    fn default() -> Self {
        Self {
            x_tolerance: DEFAULT_TOLERANCE,
            y_tolerance: DEFAULT_TOLERANCE,
            pages: PageSelection::All,
            error_mode: ErrorMode::Strict,
        }
    }
}

/// Error handling mode during extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on any error
    #[default]
    Strict,
    /// Skip invalid content and continue
    Lenient,
}

/// Page selection for extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Highest page number the selection names, if it is bounded.
    pub fn last(&self) -> Option<u32> {
        match self {
            PageSelection::All => None,
            PageSelection::Range(range) => Some(*range.end()),
            PageSelection::Pages(pages) => pages.iter().copied().max(),
        }
    }

    /// Parse a page selection string (e.g., "1-3", "1,3,5-7").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start = parse_page_number(start)?;
                let end = parse_page_number(end)?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (parse_page_number(start)?, parse_page_number(end)?);
                    pages.extend(start..=end);
                }
                None => pages.push(parse_page_number(part)?),
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

fn parse_page_number(s: &str) -> Result<u32, String> {
    match s.trim().parse::<u32>() {
        Ok(0) | Err(_) => Err(format!("Invalid page number '{}'", s.trim())),
        Ok(n) => Ok(n),
    }
}
