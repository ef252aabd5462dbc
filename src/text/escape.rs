//! LaTeX escaping of user-provided text.

use serde_json::Value;

/// Escaping strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscapeMode {
    /// Reserved characters only
    Plain,
    /// Reserved characters, then ligature suppression so the typeset
    /// text extracts back letter by letter
    #[default]
    Strict,
}

/// Character substitutions and ligature breaks for LaTeX output.
#[derive(Debug, Clone)]
pub struct EscapeTable {
    /// Single-character substitutions
    pub reserved: Vec<(char, &'static str)>,

    /// Ligature breaks, tried longest first at each position
    pub ligatures: Vec<(&'static str, &'static str)>,
}

impl Default for EscapeTable {
    fn default() -> Self {
        Self {
            reserved: vec![
                ('&', "\\&"),
                ('%', "\\%"),
                ('$', "\\$"),
                ('#', "\\#"),
                ('_', "\\_"),
                ('{', "\\{"),
                ('}', "\\}"),
                ('~', "\\textasciitilde{}"),
                ('^', "\\textasciicircum{}"),
                ('\\', "\\textbackslash{}"),
                ('|', "\\textbar{}"),
            ],
            ligatures: vec![
                ("ffi", "f{f}{i}"),
                ("ffl", "f{f}{l}"),
                ("ff", "f{f}"),
                ("fi", "f{i}"),
                ("fl", "f{l}"),
            ],
        }
    }
}

/// Escapes text for LaTeX.
#[derive(Debug, Clone, Default)]
pub struct Escaper {
    table: EscapeTable,
    mode: EscapeMode,
}

impl Escaper {
    /// Create an escaper with a custom table.
    pub fn new(table: EscapeTable, mode: EscapeMode) -> Self {
        Self { table, mode }
    }

    /// Create an escaper with the default table.
    pub fn with_mode(mode: EscapeMode) -> Self {
        Self {
            table: EscapeTable::default(),
            mode,
        }
    }

    /// Escaping strength in effect.
    pub fn mode(&self) -> EscapeMode {
        self.mode
    }

    /// Escape a string.
    pub fn escape(&self, text: &str) -> String {
        let escaped = self.escape_reserved(text);
        match self.mode {
            EscapeMode::Plain => escaped,
            // Must run after reserved escaping: it emits braces.
            EscapeMode::Strict => self.suppress_ligatures(&escaped),
        }
    }

    /// Escape a JSON value. Non-string values are returned unchanged.
    pub fn escape_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.escape(s)),
            other => other.clone(),
        }
    }

    fn escape_reserved(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + text.len() / 8);
        for c in text.chars() {
            match self.table.reserved.iter().find(|(from, _)| *from == c) {
                Some((_, to)) => out.push_str(to),
                None => out.push(c),
            }
        }
        out
    }

    fn suppress_ligatures(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + text.len() / 4);
        let mut rest = text;
        'scan: while let Some(c) = rest.chars().next() {
            for (from, to) in &self.table.ligatures {
                if let Some(tail) = rest.strip_prefix(from) {
                    out.push_str(to);
                    rest = tail;
                    continue 'scan;
                }
            }
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
        out
    }
}

/// Escape reserved LaTeX characters.
pub fn escape(text: &str) -> String {
    Escaper::with_mode(EscapeMode::Plain).escape(text)
}

/// Escape reserved characters and break the f-ligatures.
pub fn escape_strict(text: &str) -> String {
    Escaper::with_mode(EscapeMode::Strict).escape(text)
}
