//! DOCX structural extraction using zip and roxmltree.

use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use roxmltree::Node;
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::model::{
    twips_to_points, Alignment, Block, Cell, PageSetup, Paragraph, ParagraphStyle, Rgb, Run,
    RunStyle, SemanticDocument, Table, DEFAULT_RUN_SIZE,
};

use super::options::ExtractOptions;

/// WordprocessingML main namespace.
pub(crate) const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Path of the main document part inside the container.
pub(crate) const DOCUMENT_PART: &str = "word/document.xml";

/// DOCX semantic extractor.
pub struct DocxExtractor {
    xml: String,
    options: ExtractOptions,
}

impl DocxExtractor {
    /// Open a DOCX file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ExtractOptions::default())
    }

    /// Open a DOCX file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ExtractOptions) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::MalformedDocument(format!("cannot open '{}': {}", path.display(), e))
        })?;
        Self::from_reader_with_options(file, options)
    }

    /// Read a DOCX from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ExtractOptions::default())
    }

    /// Read a DOCX from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ExtractOptions) -> Result<Self> {
        Self::from_reader_with_options(Cursor::new(data), options)
    }

    /// Read a DOCX from a seekable reader with custom options.
    pub fn from_reader_with_options<R: Read + Seek>(
        reader: R,
        options: ExtractOptions,
    ) -> Result<Self> {
        let xml = read_document_part(reader)?;
        Ok(Self { xml, options })
    }

    /// Use an already unpacked `word/document.xml`.
    pub fn from_xml(xml: impl Into<String>, options: ExtractOptions) -> Self {
        Self {
            xml: xml.into(),
            options,
        }
    }

    /// Raw main document XML.
    pub fn document_xml(&self) -> &str {
        &self.xml
    }

    /// Walk the document body and build the semantic tree.
    pub fn extract(&self) -> Result<SemanticDocument> {
        let doc = roxmltree::Document::parse(&self.xml)?;
        let body = w_child(doc.root_element(), "body")
            .ok_or_else(|| Error::MalformedDocument("document has no body".to_string()))?;

        let mut document = SemanticDocument::new();

        for child in body.children().filter(Node::is_element) {
            if child.tag_name().namespace() != Some(W_NS) {
                continue;
            }
            match child.tag_name().name() {
                "p" => document.add_block(self.paragraph_block(child)),
                "tbl" => document.add_table(self.table(child)),
                "sectPr" => document.page_setup = page_setup(child),
                other => log::debug!("Skipping body element <w:{}>", other),
            }
        }

        log::info!("Extracted {} blocks from DOCX", document.blocks.len());
        Ok(document)
    }

    fn paragraph_block(&self, p: Node) -> Block {
        let mut style = ParagraphStyle {
            space_after: self.options.default_space_after,
            ..Default::default()
        };
        if let Some(ppr) = w_child(p, "pPr") {
            self.apply_paragraph_properties(ppr, &mut style);
        }

        let mut runs = Vec::new();
        self.collect_runs(p, &mut runs);

        if runs.is_empty() {
            return Block::Space {
                height: self.options.space_height,
            };
        }

        Block::Paragraph(Paragraph { runs, style })
    }

    fn apply_paragraph_properties(&self, ppr: Node, style: &mut ParagraphStyle) {
        if let Some(jc) = w_child(ppr, "jc").and_then(|n| w_attr(n, "val")) {
            style.alignment = Alignment::from_jc(jc);
        }

        style.is_list = w_child(ppr, "numPr").is_some();

        style.border_height = w_child(ppr, "pBdr")
            .and_then(|bdr| w_child(bdr, "bottom"))
            .and_then(|bottom| w_attr_f32(bottom, "sz"))
            .map(|eighths| (eighths / 8.0).max(0.0))
            .unwrap_or(0.0);

        if let Some(spacing) = w_child(ppr, "spacing") {
            if let Some(before) = w_attr_f32(spacing, "before") {
                style.space_before = twips_to_points(before);
            }
            if let Some(after) = w_attr_f32(spacing, "after") {
                style.space_after = twips_to_points(after);
            }
        }

        if let Some(ind) = w_child(ppr, "ind") {
            if let Some(left) = w_attr_f32(ind, "left").or_else(|| w_attr_f32(ind, "start")) {
                style.left_indent = twips_to_points(left);
            }
            if let Some(first) = w_attr_f32(ind, "firstLine") {
                style.first_line_indent = twips_to_points(first);
            } else if let Some(hanging) = w_attr_f32(ind, "hanging") {
                style.first_line_indent = -twips_to_points(hanging);
            }
        }
    }

    fn collect_runs(&self, parent: Node, runs: &mut Vec<Run>) {
        for child in parent.children().filter(|n| is_w(*n)) {
            match child.tag_name().name() {
                "r" => self.push_run(child, runs),
                // Runs wrapped in links or revision marks still render.
                "hyperlink" | "ins" | "smartTag" | "fldSimple" => self.collect_runs(child, runs),
                _ => {}
            }
        }
    }

    fn push_run(&self, r: Node, runs: &mut Vec<Run>) {
        let style = self.run_style(w_child(r, "rPr"));
        let mut text = String::new();

        for child in r.children().filter(|n| is_w(*n)) {
            match child.tag_name().name() {
                "t" => text.push_str(child.text().unwrap_or("")),
                "tab" => {
                    flush_text(&mut text, &style, runs);
                    runs.push(Run::Tab);
                }
                "br" | "cr" => text.push(' '),
                "noBreakHyphen" => text.push('-'),
                _ => {}
            }
        }

        flush_text(&mut text, &style, runs);
    }

    fn table(&self, tbl: Node) -> Table {
        let mut table = Table::new();
        for tr in tbl.children().filter(|n| is_w_named(*n, "tr")) {
            let row = tr
                .children()
                .filter(|n| is_w_named(*n, "tc"))
                .map(|tc| self.cell(tc))
                .collect();
            table.add_row(row);
        }
        table
    }

    fn cell(&self, tc: Node) -> Cell {
        let mut runs = Vec::new();
        for p in tc.children().filter(|n| is_w_named(*n, "p")) {
            self.collect_runs(p, &mut runs);
        }
        Cell::new(runs)
    }

    fn run_style(&self, rpr: Option<Node>) -> RunStyle {
        let mut style = RunStyle::default();
        let declared_font = rpr
            .and_then(|rpr| w_child(rpr, "rFonts"))
            .and_then(|fonts| w_attr(fonts, "ascii").or_else(|| w_attr(fonts, "hAnsi")));
        let source_font = declared_font.unwrap_or(self.options.default_font.as_str());
        style.font = Some(self.options.font_map.resolve(Some(source_font)).to_string());

        let Some(rpr) = rpr else {
            return style;
        };

        style.size = w_child(rpr, "sz")
            .and_then(|sz| w_attr_f32(sz, "val"))
            .map(|half_points| half_points / 2.0)
            .unwrap_or(DEFAULT_RUN_SIZE);
        style.bold = toggle(w_child(rpr, "b"));
        style.italic = toggle(w_child(rpr, "i"));
        style.underline = w_child(rpr, "u")
            .map(|u| w_attr(u, "val").map_or(true, |v| v != "none"))
            .unwrap_or(false);
        style.color = w_child(rpr, "color")
            .and_then(|c| w_attr(c, "val"))
            .and_then(Rgb::from_hex);

        style
    }
}

/// Whitespace-only text joins the preceding text run, or is dropped when
/// there is none.
fn flush_text(text: &mut String, style: &RunStyle, runs: &mut Vec<Run>) {
    if !text.trim().is_empty() {
        runs.push(Run::styled(std::mem::take(text), style.clone()));
    } else if let Some(Run::Text { text: previous, .. }) = runs.last_mut() {
        previous.push_str(text);
        text.clear();
    } else {
        text.clear();
    }
}

fn page_setup(sect_pr: Node) -> PageSetup {
    let mut setup = PageSetup::default();
    if let Some(margins) = w_child(sect_pr, "pgMar") {
        let read = |name: &str, current: f32| {
            w_attr_f32(margins, name).map_or(current, twips_to_points)
        };
        setup.margin_top = read("top", setup.margin_top);
        setup.margin_bottom = read("bottom", setup.margin_bottom);
        setup.margin_left = read("left", setup.margin_left);
        setup.margin_right = read("right", setup.margin_right);
    }
    setup
}

/// On/off properties are on unless `w:val` says otherwise.
fn toggle(node: Option<Node>) -> bool {
    match node {
        None => false,
        Some(n) => !matches!(w_attr(n, "val"), Some("0" | "false" | "off")),
    }
}

fn read_document_part<R: Read + Seek>(reader: R) -> Result<String> {
    let mut archive = ZipArchive::new(reader)?;
    let mut entry = archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| Error::MalformedDocument(format!("missing {}", DOCUMENT_PART)))?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml).map_err(|e| {
        Error::MalformedDocument(format!("cannot read {}: {}", DOCUMENT_PART, e))
    })?;
    Ok(xml)
}

pub(crate) fn is_w(node: Node) -> bool {
    node.is_element() && node.tag_name().namespace() == Some(W_NS)
}

pub(crate) fn is_w_named(node: Node, name: &str) -> bool {
    is_w(node) && node.tag_name().name() == name
}

fn w_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_w_named(*n, name))
}

pub(crate) fn w_attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute((W_NS, name))
}

fn w_attr_f32(node: Node, name: &str) -> Option<f32> {
    w_attr(node, name).and_then(|v| v.trim().parse::<f32>().ok())
}
