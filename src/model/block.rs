//! Block-level content types.

use super::{Paragraph, Table};
use serde::{Deserialize, Serialize};

/// Height of the vertical space emitted for an empty source paragraph.
pub const EMPTY_PARAGRAPH_SPACE: f32 = 8.0;

/// A content block in a semantic document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    /// Text paragraph
    Paragraph(Paragraph),

    /// Table of styled cells
    Table(Table),

    /// Vertical space in points
    Space {
        /// Height in points
        height: f32,
    },
}

impl Block {
    /// Get plain text of the block. Space blocks have none.
    pub fn plain_text(&self) -> Option<String> {
        match self {
            Block::Paragraph(p) => Some(p.plain_text()),
            Block::Table(t) => Some(t.plain_text()),
            Block::Space { .. } => None,
        }
    }

    /// Check if this is a paragraph block.
    pub fn is_paragraph(&self) -> bool {
        matches!(self, Block::Paragraph(_))
    }

    /// Check if this is a table block.
    pub fn is_table(&self) -> bool {
        matches!(self, Block::Table(_))
    }

    /// Check if this is a space block.
    pub fn is_space(&self) -> bool {
        matches!(self, Block::Space { .. })
    }
}
