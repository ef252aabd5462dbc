//! Error types for the vitae library.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for vitae operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur anywhere in the fidelity pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized (neither DOCX nor PDF).
    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    /// The word-processing container could not be opened or has no body.
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Missing template file or malformed template syntax.
    #[error("Template error: {0}")]
    Template(String),

    /// The external rendering toolchain failed.
    #[error("Toolchain failed ({status}): {message}")]
    Toolchain {
        /// Exit status description
        status: String,
        /// Human-readable summary
        message: String,
        /// Captured standard output
        stdout: String,
        /// Captured standard error
        stderr: String,
    },

    /// The external rendering toolchain exceeded its wall-clock budget.
    #[error("Toolchain timed out after {0} seconds")]
    ToolchainTimeout(u64),

    /// A resolved path escapes the sandbox root.
    #[error("Path security violation: '{}' resolves outside '{}'", .path.display(), .root.display())]
    PathSecurity {
        /// The offending path as given
        path: PathBuf,
        /// The sandbox root it escaped
        root: PathBuf,
    },

    /// Source data does not match the expected schema.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// A selected page does not exist.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error during rendering.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Whether the error must abort the whole run rather than a single input.
    ///
    /// Template and path security violations are fatal; extraction,
    /// geometry and toolchain failures only affect the input at hand.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Template(_) | Error::PathSecurity { .. } | Error::Schema(_)
        )
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::MalformedDocument(err.to_string())
    }
}

impl From<roxmltree::Error> for Error {
    fn from(err: roxmltree::Error) -> Self {
        Error::MalformedDocument(format!("invalid XML: {}", err))
    }
}

impl From<minijinja::Error> for Error {
    fn from(err: minijinja::Error) -> Self {
        Error::Template(err.to_string())
    }
}

/// The `{"error": message}` shape used when a stage degrades gracefully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Human-readable failure message
    pub error: String,
}

impl From<&Error> for ErrorPayload {
    fn from(err: &Error) -> Self {
        Self {
            error: err.to_string(),
        }
    }
}

/// Serialize a stage result, replacing failures with an [`ErrorPayload`].
pub fn to_payload<T: Serialize>(result: &Result<T>) -> serde_json::Value {
    match result {
        Ok(value) => serde_json::to_value(value).unwrap_or_else(|e| {
            serde_json::json!({ "error": format!("serialization failed: {}", e) })
        }),
        Err(err) => serde_json::json!(ErrorPayload::from(err)),
    }
}
