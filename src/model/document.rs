//! Document-level types.

use super::{Block, Paragraph, Table};
use serde::{Deserialize, Serialize};

/// A format-agnostic representation of a source document's content and styling.
///
/// Built once per extraction call and owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticDocument {
    /// Page geometry and primary font
    pub page_setup: PageSetup,

    /// Content blocks in document order
    pub blocks: Vec<Block>,
}

impl SemanticDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            page_setup: PageSetup::default(),
            blocks: Vec::new(),
        }
    }

    /// Add a block to the document.
    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Add a paragraph to the document.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.blocks.push(Block::Paragraph(paragraph));
    }

    /// Add a table to the document.
    pub fn add_table(&mut self, table: Table) {
        self.blocks.push(Block::Table(table));
    }

    /// Check if the document has no blocks.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over paragraphs only.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Paragraph(p) => Some(p),
            _ => None,
        })
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|block| block.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for SemanticDocument {
    fn default() -> Self {
        Self::new()
    }
}

/// Font the renderer uses when the source declares none.
pub const PRIMARY_FONT: &str = "EB Garamond";

/// Page margins (points) and primary font.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    /// Top margin in points
    pub margin_top: f32,

    /// Bottom margin in points
    pub margin_bottom: f32,

    /// Left margin in points
    pub margin_left: f32,

    /// Right margin in points
    pub margin_right: f32,

    /// Primary font family
    pub primary_font: String,
}

impl Default for PageSetup {
    // One inch on every side, the word-processor default.
    fn default() -> Self {
        Self {
            margin_top: 72.0,
            margin_bottom: 72.0,
            margin_left: 72.0,
            margin_right: 72.0,
            primary_font: PRIMARY_FONT.to_string(),
        }
    }
}

/// Convert twentieths of a point to points.
pub fn twips_to_points(twips: f32) -> f32 {
    twips / 20.0
}
