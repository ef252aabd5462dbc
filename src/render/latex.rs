//! LaTeX fragments for semantic runs and table cells.

use regex::Regex;

use crate::model::{Cell, Paragraph, Run, RunStyle, PRIMARY_FONT};
use crate::text::Escaper;

/// Placeholder emitted for each tab run before collapsing.
pub const TAB_MARKER: &str = " TAB_MARKER ";

/// Line height as a multiple of the font size.
pub const LINE_SPREAD: f32 = 1.2;

/// Renders runs as self-contained LaTeX groups.
#[derive(Debug, Clone)]
pub struct LatexWriter {
    escaper: Escaper,
    default_font: String,
    tab_run: Regex,
}

impl LatexWriter {
    /// Create a writer using the given escaper.
    pub fn new(escaper: Escaper) -> Self {
        Self {
            escaper,
            default_font: PRIMARY_FONT.to_string(),
            tab_run: Regex::new(r"( TAB_MARKER )+").expect("tab marker pattern"),
        }
    }

    /// Set the font used for runs without one.
    pub fn with_default_font(mut self, font: impl Into<String>) -> Self {
        self.default_font = font.into();
        self
    }

    /// Render one run. Empty text renders as an empty string.
    pub fn run(&self, run: &Run) -> String {
        match run {
            Run::Tab => TAB_MARKER.to_string(),
            Run::Text { text, style } => self.styled(text, style),
        }
    }

    /// Render a sequence of runs, collapsing adjacent tab markers into one `\hfill`.
    pub fn rich_content(&self, runs: &[Run]) -> String {
        let raw: String = runs.iter().map(|r| self.run(r)).collect();
        self.tab_run.replace_all(&raw, r"\hfill ").into_owned()
    }

    /// Render a paragraph's runs.
    pub fn paragraph(&self, paragraph: &Paragraph) -> String {
        self.rich_content(&paragraph.runs)
    }

    /// Render a table cell's runs.
    pub fn cell(&self, cell: &Cell) -> String {
        self.rich_content(&cell.runs)
    }

    fn styled(&self, text: &str, style: &RunStyle) -> String {
        let mut content = self.escaper.escape(text);
        if content.is_empty() {
            return String::new();
        }

        if style.bold {
            content = format!("\\textbf{{{}}}", content);
        }
        if style.italic {
            content = format!("\\textit{{{}}}", content);
        }
        if style.underline {
            content = format!("\\underline{{{}}}", content);
        }

        let font = style.font.as_deref().unwrap_or(&self.default_font);
        let color = style
            .color
            .map(|c| format!("\\color[HTML]{{{}}}", c.to_hex()))
            .unwrap_or_default();

        format!(
            "{{\\fontspec{{{}}}\\fontsize{{{}}}{{{}}}\\selectfont {}{}}}",
            font,
            points(style.size),
            points(style.size * LINE_SPREAD),
            color,
            content
        )
    }
}

impl Default for LatexWriter {
    fn default() -> Self {
        Self::new(Escaper::default())
    }
}

/// Format a point size without trailing zeros (`10`, `10.5`, `12.6`).
pub fn points(value: f32) -> String {
    let formatted = format!("{:.2}", value);
    formatted
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rgb;
    use crate::text::EscapeMode;

    fn writer() -> LatexWriter {
        LatexWriter::new(Escaper::with_mode(EscapeMode::Plain))
    }

    #[test]
    fn test_plain_run() {
        let run = Run::new("R&D");
        assert_eq!(
            writer().run(&run),
            "{\\fontspec{EB Garamond}\\fontsize{10}{12}\\selectfont R\\&D}"
        );
    }

    #[test]
    fn test_styled_run_wrapper_order() {
        let run = Run::styled(
            "Jane",
            RunStyle {
                size: 14.0,
                bold: true,
                italic: true,
                underline: true,
                color: Some(Rgb(0x1F, 0x38, 0x64)),
                font: Some("Carlito".into()),
            },
        );
        assert_eq!(
            writer().run(&run),
            "{\\fontspec{Carlito}\\fontsize{14}{16.8}\\selectfont \\color[HTML]{1F3864}\\underline{\\textit{\\textbf{Jane}}}}"
        );
    }

    #[test]
    fn test_tab_runs_collapse() {
        let runs = vec![Run::new("Acme"), Run::Tab, Run::Tab, Run::new("2020")];
        let out = writer().rich_content(&runs);
        assert_eq!(out.matches("\\hfill ").count(), 1);
        assert!(!out.contains("TAB_MARKER"));
    }

    #[test]
    fn test_empty_run_renders_nothing() {
        assert_eq!(writer().run(&Run::new("")), "");
    }

    #[test]
    fn test_points() {
        assert_eq!(points(10.0), "10");
        assert_eq!(points(10.5), "10.5");
        assert_eq!(points(10.5 * LINE_SPREAD), "12.6");
    }

    #[test]
    fn test_strict_cell() {
        let w = LatexWriter::default();
        assert!(w.cell(&Cell::from("Office")).contains("Of{f}{i}ce"));
    }

    #[test]
    fn test_cell_keeps_run_formatting() {
        let heading = Cell::new(vec![Run::styled(
            "Skills",
            RunStyle {
                size: 14.0,
                bold: true,
                ..RunStyle::default()
            },
        )]);
        let out = writer().cell(&heading);
        assert!(out.contains(r"\fontsize{14}{16.8}"));
        assert!(out.contains(r"\textbf{Skills}"));
    }
}
