//! Rendering options and configuration.

use crate::model::DEFAULT_ROOT_NAME;
use crate::text::EscapeMode;

/// Path fragments that mark a data file as a strategy dossier.
pub const DOSSIER_MARKERS: &[&str] = &["Strategy_Dossier", "Strategy_Report", "Company_Research"];

/// Options for binding data to a template.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Context variable the data is bound to, and the wrapper key unwrapped
    pub root_name: String,

    /// Escaping applied to interpolated strings and by `latex_escape`
    pub escape_mode: EscapeMode,

    /// Validate dossier data files before rendering
    pub validate_dossiers: bool,

    /// Path fragments that identify a dossier data file
    pub dossier_markers: Vec<String>,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root variable name.
    pub fn with_root_name(mut self, name: impl Into<String>) -> Self {
        self.root_name = name.into();
        self
    }

    /// Set the escaping strength.
    pub fn with_escape_mode(mut self, mode: EscapeMode) -> Self {
        self.escape_mode = mode;
        self
    }

    /// Enable or disable dossier validation.
    pub fn with_dossier_validation(mut self, validate: bool) -> Self {
        self.validate_dossiers = validate;
        self
    }

    /// Replace the dossier path markers.
    pub fn with_dossier_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dossier_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a data path names a dossier under these options.
    pub fn is_dossier_path(&self, path: &str) -> bool {
        self.validate_dossiers && self.dossier_markers.iter().any(|m| path.contains(m.as_str()))
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            root_name: DEFAULT_ROOT_NAME.to_string(),
            escape_mode: EscapeMode::Strict,
            validate_dossiers: true,
            dossier_markers: DOSSIER_MARKERS.iter().map(|m| m.to_string()).collect(),
        }
    }
}
