//! Mapping of source fonts to fonts available to the typesetter.

/// Fallback for fonts with no mapping.
pub const FALLBACK_FONT: &str = "DejaVu Sans";

/// Fixed lookup from word-processor font names to open substitutes.
#[derive(Debug, Clone)]
pub struct FontMap {
    entries: Vec<(String, String)>,
    fallback: String,
}

impl Default for FontMap {
    fn default() -> Self {
        Self::from_pairs(
            [
                ("Garamond", "EB Garamond"),
                ("Calibri", "Carlito"),
                ("Arial", "Liberation Sans"),
                ("Times New Roman", "Liberation Serif"),
                ("DejaVu Sans", "DejaVu Sans"),
            ],
            FALLBACK_FONT,
        )
    }
}

impl FontMap {
    /// Build a map from `(source, target)` pairs.
    pub fn from_pairs<I, S, T>(pairs: I, fallback: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (S, T)>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(s, t)| (s.into(), t.into()))
                .collect(),
            fallback: fallback.into(),
        }
    }

    /// Add or replace a mapping.
    pub fn with_mapping(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        match self.entries.iter_mut().find(|(s, _)| *s == source) {
            Some(entry) => entry.1 = target,
            None => self.entries.push((source, target)),
        }
        self
    }

    /// Resolve a font name. Unknown or missing names map to the fallback.
    pub fn resolve(&self, font: Option<&str>) -> &str {
        font.and_then(|name| {
            self.entries
                .iter()
                .find(|(s, _)| s == name.trim())
                .map(|(_, t)| t.as_str())
        })
        .unwrap_or(&self.fallback)
    }

    /// Fallback font name.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}
