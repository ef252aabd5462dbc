//! Input format detection from magic bytes.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Formats the pipeline knows how to consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFormat {
    /// A word-processing container (zip archive)
    Docx,
    /// A PDF page-description file with its header version
    Pdf {
        /// PDF version (e.g., "1.7", "2.0")
        version: String,
    },
    /// A JSON profile document
    Json,
}

impl std::fmt::Display for InputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputFormat::Docx => write!(f, "DOCX"),
            InputFormat::Pdf { version } => write!(f, "PDF {}", version),
            InputFormat::Json => write!(f, "JSON"),
        }
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Detect the input format of a file from its first bytes.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<InputFormat> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = Vec::with_capacity(16);
    reader.by_ref().take(16).read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the input format from a byte prefix.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<InputFormat> {
    if data.starts_with(ZIP_MAGIC) {
        return Ok(InputFormat::Docx);
    }

    if data.starts_with(PDF_MAGIC) {
        if data.len() < PDF_MAGIC_LEN + VERSION_LEN {
            return Err(Error::UnknownFormat("truncated PDF header".to_string()));
        }
        let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
        let version = String::from_utf8_lossy(version_bytes).to_string();
        if !is_valid_version(&version) {
            return Err(Error::UnknownFormat(format!("PDF version '{}'", version)));
        }
        return Ok(InputFormat::Pdf { version });
    }

    let first = data.iter().find(|b| !b.is_ascii_whitespace());
    if matches!(first, Some(b'{') | Some(b'[')) {
        return Ok(InputFormat::Json);
    }

    Err(Error::UnknownFormat(
        "expected a DOCX, PDF or JSON input".to_string(),
    ))
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    if version.len() != 3 {
        return false;
    }

    let chars: Vec<char> = version.chars().collect();
    chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}

/// Check if bytes start with a valid PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(InputFormat::Pdf { .. }))
}

/// Check if bytes start with a zip container header.
pub fn is_docx_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(InputFormat::Docx))
}
