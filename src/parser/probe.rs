//! Survey of layout-defining tags in a DOCX body.

use std::path::Path;

use serde::Serialize;

use crate::error::Result;

use super::docx::{is_w_named, w_attr, DocxExtractor};
use super::options::ExtractOptions;

/// Maximum length of the example snippet kept per finding.
const SNIPPET_LIMIT: usize = 300;

/// One probed tag kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFinding {
    /// Human-readable category
    pub label: &'static str,

    /// Local tag name in the WordprocessingML namespace
    pub tag: &'static str,

    /// Number of instances
    pub count: usize,

    /// Raw XML of the first instance, truncated
    pub example: Option<String>,
}

/// Counts of every probed tag kind, in a fixed order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    /// Findings in probe order
    pub findings: Vec<ProbeFinding>,
}

impl ProbeReport {
    /// Count for a tag, 0 if it was not probed.
    pub fn count(&self, tag: &str) -> usize {
        self.findings
            .iter()
            .find(|f| f.tag == tag)
            .map_or(0, |f| f.count)
    }
}

impl std::fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for finding in &self.findings {
            writeln!(f, "{}: {} instances found.", finding.label, finding.count)?;
            if let Some(example) = &finding.example {
                writeln!(f, "  Example XML: {}...", example)?;
            }
        }
        Ok(())
    }
}

const PROBES: &[(&str, &str)] = &[
    ("Borders (Lines)", "pBdr"),
    ("Drawings (Shapes)", "drawing"),
    ("Legacy Picts", "pict"),
    ("Section Columns", "cols"),
    ("Tab Stops", "tabs"),
    ("Table Layouts", "tbl"),
    ("Page Breaks", "br"),
];

/// Probe a DOCX file.
pub fn probe_docx<P: AsRef<Path>>(path: P) -> Result<ProbeReport> {
    let extractor = DocxExtractor::open_with_options(path, ExtractOptions::default())?;
    probe_xml(extractor.document_xml())
}

/// Probe raw `word/document.xml` content.
pub fn probe_xml(xml: &str) -> Result<ProbeReport> {
    let doc = roxmltree::Document::parse(xml)?;
    let mut report = ProbeReport::default();

    for &(label, tag) in PROBES {
        let mut matches = doc.descendants().filter(|n| {
            is_w_named(*n, tag) && (tag != "br" || w_attr(*n, "type") == Some("page"))
        });

        let first = matches.next();
        let count = first.map_or(0, |_| 1 + matches.count());
        let example = first.map(|node| snippet(&xml[node.range()]));

        report.findings.push(ProbeFinding {
            label,
            tag,
            count,
            example,
        });
    }

    Ok(report)
}

fn snippet(raw: &str) -> String {
    raw.chars().take(SNIPPET_LIMIT).collect()
}
