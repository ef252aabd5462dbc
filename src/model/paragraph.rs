//! Paragraph and run-level types.

use serde::{Deserialize, Serialize};

/// A paragraph of formatted runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Runs in document order
    pub runs: Vec<Run>,

    /// Paragraph style
    pub style: ParagraphStyle,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self {
            runs: Vec::new(),
            style: ParagraphStyle::default(),
        }
    }

    /// Create a paragraph with one plain text run.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_run(Run::new(text));
        p
    }

    /// Add a run.
    pub fn add_run(&mut self, run: Run) {
        self.runs.push(run);
    }

    /// Get plain text content of the paragraph (tab markers become `\t`).
    pub fn plain_text(&self) -> String {
        self.runs
            .iter()
            .map(|run| match run {
                Run::Text { text, .. } => text.as_str(),
                Run::Tab => "\t",
            })
            .collect()
    }

    /// Check if the paragraph carries no visible text.
    pub fn is_blank(&self) -> bool {
        self.plain_text().trim().is_empty()
    }

    /// Check if this is a list item.
    pub fn is_list_item(&self) -> bool {
        self.style.is_list
    }

    /// Text alignment.
    pub fn alignment(&self) -> Alignment {
        self.style.alignment
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

/// A contiguous span sharing one formatting attribute set, or a tab marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Run {
    /// Formatted text
    Text {
        /// Text content, never empty
        text: String,
        /// Formatting attributes
        #[serde(flatten)]
        style: RunStyle,
    },

    /// A raw tab marker; adjacent markers render as one horizontal fill
    Tab,
}

impl Run {
    /// Create a text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Run::Text {
            text: text.into(),
            style: RunStyle::default(),
        }
    }

    /// Create a text run with the given style.
    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Run::Text {
            text: text.into(),
            style,
        }
    }

    /// Text of the run, if it is not a tab marker.
    pub fn text(&self) -> Option<&str> {
        match self {
            Run::Text { text, .. } => Some(text),
            Run::Tab => None,
        }
    }

    /// Whether this run is a tab marker.
    pub fn is_tab(&self) -> bool {
        matches!(self, Run::Tab)
    }
}

/// Run formatting attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStyle {
    /// Font size in points
    pub size: f32,

    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Underlined text
    pub underline: bool,

    /// Explicit text color
    pub color: Option<Rgb>,

    /// Source font name, before mapping to a renderer font
    pub font: Option<String>,
}

/// Default run size when the source does not specify one.
pub const DEFAULT_RUN_SIZE: f32 = 10.0;

impl Default for RunStyle {
    fn default() -> Self {
        Self {
            size: DEFAULT_RUN_SIZE,
            bold: false,
            italic: false,
            underline: false,
            color: None,
            font: None,
        }
    }
}

impl RunStyle {
    /// Check if any emphasis is applied.
    pub fn has_emphasis(&self) -> bool {
        self.bold || self.italic || self.underline
    }
}

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse a six-digit hex color (`1F3864`), with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Uppercase hex form without `#`, as the HTML color model expects.
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Rgb::from_hex(&value).ok_or_else(|| format!("invalid RGB hex '{}'", value))
    }
}

impl From<Rgb> for String {
    fn from(rgb: Rgb) -> Self {
        rgb.to_hex()
    }
}

/// Paragraph layout properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// Text alignment
    pub alignment: Alignment,

    /// Whether the paragraph carries list numbering
    pub is_list: bool,

    /// Bottom border weight in points (0 = no border)
    pub border_height: f32,

    /// Space before paragraph in points
    pub space_before: f32,

    /// Space after paragraph in points
    pub space_after: f32,

    /// Left indent in points
    pub left_indent: f32,

    /// First line indent in points (negative for hanging)
    pub first_line_indent: f32,
}

/// Spacing after a paragraph when the source is silent.
pub const DEFAULT_SPACE_AFTER: f32 = 2.0;

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            alignment: Alignment::Left,
            is_list: false,
            border_height: 0.0,
            space_before: 0.0,
            space_after: DEFAULT_SPACE_AFTER,
            left_indent: 0.0,
            first_line_indent: 0.0,
        }
    }
}

/// Text alignment. Only centering is recognized; anything else is left.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
}

impl Alignment {
    /// Map a `w:jc` value to an alignment.
    pub fn from_jc(value: &str) -> Self {
        match value {
            "center" => Alignment::Center,
            _ => Alignment::Left,
        }
    }

    /// LaTeX environment name for this alignment.
    pub fn environment(self) -> &'static str {
        match self {
            Alignment::Left => "flushleft",
            Alignment::Center => "center",
        }
    }
}
