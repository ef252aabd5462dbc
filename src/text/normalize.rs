//! Text canonicalization for fidelity comparison.

use unicode_normalization::UnicodeNormalization;

/// Replacement tables used by the [`Normalizer`].
///
/// Applied in field order: artifacts, punctuation, ligatures.
#[derive(Debug, Clone)]
pub struct NormalizeTables {
    /// Markup and encoding artifacts (bullets, pipes), longest patterns first
    pub artifacts: Vec<(&'static str, &'static str)>,

    /// Typographic quotes and dashes
    pub punctuation: Vec<(&'static str, &'static str)>,

    /// Latin presentation-form ligatures
    pub ligatures: Vec<(&'static str, &'static str)>,

    /// Compose Unicode to NFC before any replacement
    pub compose_unicode: bool,
}

impl Default for NormalizeTables {
    fn default() -> Self {
        Self {
            artifacts: vec![
                ("\\textbullet{}", ""),
                ("\\textbullet", ""),
                ("\textbullet", ""), // tab-mangled \textbullet
                ("\u{00E2}\u{20AC}\u{00A2}", ""), // mojibake bullet
                ("\u{2022}", ""),
                ("\\textbar{}", "|"),
                ("\\textbar", "|"),
                ("\textbar", "|"), // tab-mangled \textbar
            ],
            punctuation: vec![
                ("\u{2019}", "'"),
                ("\u{2018}", "'"),
                ("\u{201C}", "\""),
                ("\u{201D}", "\""),
                ("\u{2014}", "--"),
                ("\u{2013}", "-"),
            ],
            ligatures: vec![
                ("\u{FB00}", "ff"),  // ﬀ
                ("\u{FB01}", "fi"),  // ﬁ
                ("\u{FB02}", "fl"),  // ﬂ
                ("\u{FB03}", "ffi"), // ﬃ
                ("\u{FB04}", "ffl"), // ﬄ
            ],
            compose_unicode: true,
        }
    }
}

/// Canonicalizes text so rendered output and source data compare equal.
///
/// The result has no whitespace, no markup artifacts, folded punctuation
/// and ligatures, and is lowercase. Normalizing twice yields the same string.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    tables: NormalizeTables,
}

impl Normalizer {
    /// Create a normalizer over the given tables.
    pub fn new(tables: NormalizeTables) -> Self {
        Self { tables }
    }

    /// Borrow the replacement tables.
    pub fn tables(&self) -> &NormalizeTables {
        &self.tables
    }

    /// Normalize text to its comparison form.
    pub fn normalize(&self, text: &str) -> String {
        if text.is_empty() {
            return String::new();
        }

        // Lowercasing or artifact removal can expose a new artifact
        // (`\TEXTBAR`, `\text•bar`), so run to a fixpoint.
        let mut current = self.pass(text);
        loop {
            let next = self.pass(&current);
            if next == current {
                return current;
            }
            current = next;
        }
    }

    fn pass(&self, text: &str) -> String {
        let mut result = if self.tables.compose_unicode {
            text.nfc().collect::<String>()
        } else {
            text.to_string()
        };

        for table in [
            &self.tables.artifacts,
            &self.tables.punctuation,
            &self.tables.ligatures,
        ] {
            for (from, to) in table {
                if result.contains(from) {
                    result = result.replace(from, to);
                }
            }
        }

        result
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase()
    }
}

/// Normalize text with the default tables.
pub fn normalize(text: &str) -> String {
    Normalizer::default().normalize(text)
}
