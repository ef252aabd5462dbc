//! Integration tests for DOCX extraction, probing and mirror rendering.

use std::io::{Cursor, Write};

use vitae::model::Block;
use vitae::parser::DocxExtractor;
use vitae::render::{RenderOptions, TemplateRenderer};
use vitae::{Alignment, Error, Run};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Pack a `word/document.xml` body into a minimal DOCX container.
fn docx(body: &str) -> Vec<u8> {
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{}"><w:body>{}</w:body></w:document>"#,
        W_NS, body
    );

    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0"?><Types/>"#).unwrap();
    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

fn resume_body() -> &'static str {
    r#"
    <w:p>
      <w:pPr><w:jc w:val="center"/><w:pBdr><w:bottom w:val="single" w:sz="12"/></w:pBdr></w:pPr>
      <w:r><w:rPr><w:rFonts w:ascii="Garamond"/><w:b/><w:sz w:val="36"/><w:color w:val="1F3864"/></w:rPr><w:t>Jane Doe</w:t></w:r>
    </w:p>
    <w:p/>
    <w:p>
      <w:pPr><w:spacing w:before="120" w:after="60"/></w:pPr>
      <w:r><w:rPr><w:i/></w:rPr><w:t>Acme Corp</w:t></w:r>
      <w:r><w:tab/></w:r>
      <w:r><w:t>2020 - 2024</w:t></w:r>
    </w:p>
    <w:p>
      <w:pPr><w:numPr><w:ilvl w:val="0"/><w:numId w:val="1"/></w:numPr></w:pPr>
      <w:r><w:t xml:space="preserve">Cut costs by 15% &amp; shipped R&amp;D</w:t></w:r>
    </w:p>
    <w:tbl>
      <w:tr><w:tc><w:p><w:r><w:t>Rust</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>Expert</w:t></w:r></w:p></w:tc></w:tr>
      <w:tr><w:tc><w:p><w:r><w:t>La</w:t></w:r><w:r><w:t>TeX</w:t></w:r></w:p></w:tc><w:tc/></w:tr>
    </w:tbl>
    <w:sectPr><w:pgMar w:top="720" w:bottom="720" w:left="1080" w:right="1080"/></w:sectPr>
    "#
}

#[test]
fn test_extract_structure() {
    let doc = DocxExtractor::from_bytes(&docx(resume_body()))
        .unwrap()
        .extract()
        .unwrap();

    assert_eq!(doc.blocks.len(), 5);
    assert!(matches!(doc.blocks[1], Block::Space { height } if height == 8.0));

    let Block::Paragraph(name) = &doc.blocks[0] else {
        panic!("expected the name paragraph first");
    };
    assert_eq!(name.style.alignment, Alignment::Center);
    assert_eq!(name.style.border_height, 1.5);
    match &name.runs[0] {
        Run::Text { text, style } => {
            assert_eq!(text, "Jane Doe");
            assert!(style.bold);
            assert_eq!(style.size, 18.0);
            assert_eq!(style.font.as_deref(), Some("EB Garamond"));
            assert_eq!(style.color.map(|c| c.to_hex()), Some("1F3864".to_string()));
        }
        Run::Tab => panic!("expected a text run"),
    }

    let Block::Paragraph(role) = &doc.blocks[2] else {
        panic!("expected the role paragraph");
    };
    assert_eq!(role.style.space_before, 6.0);
    assert_eq!(role.style.space_after, 3.0);
    assert!(role.runs.iter().any(Run::is_tab));
    assert_eq!(role.plain_text(), "Acme Corp\t2020 - 2024");

    let Block::Paragraph(bullet) = &doc.blocks[3] else {
        panic!("expected the bullet paragraph");
    };
    assert!(bullet.style.is_list);

    let Block::Table(table) = &doc.blocks[4] else {
        panic!("expected a table");
    };
    let rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.plain_text()).collect())
        .collect();
    assert_eq!(rows, vec![vec!["Rust", "Expert"], vec!["LaTeX", ""]]);
    assert!(table.rows[1][1].is_empty());

    assert_eq!(doc.page_setup.margin_top, 36.0);
    assert_eq!(doc.page_setup.margin_left, 54.0);
}

#[test]
fn test_extract_semantic_json() {
    let doc = DocxExtractor::from_bytes(&docx(resume_body()))
        .unwrap()
        .extract()
        .unwrap();
    let json = vitae::render::to_json(&doc, vitae::JsonFormat::Compact).unwrap();

    assert!(json.contains(r#""type":"paragraph""#));
    assert!(json.contains(r#""type":"space""#));
    assert!(json.contains(r#""type":"table""#));
    assert!(json.contains(r#""color":"1F3864""#));
}

#[test]
fn test_mirror_render_of_extracted_docx() {
    let doc = DocxExtractor::from_bytes(&docx(resume_body()))
        .unwrap()
        .extract()
        .unwrap();
    let latex = TemplateRenderer::mirror(RenderOptions::default())
        .unwrap()
        .render_document(&doc)
        .unwrap();

    assert!(latex.contains(r"\begin{center}"));
    assert!(latex.contains(r"\color[HTML]{1F3864}\textbf{Jane Doe}"));
    assert!(latex.contains(r"\hfill "));
    assert!(!latex.contains("TAB_MARKER"));
    assert!(latex.contains(r"15\% \&"));
    assert!(latex.contains(r"\textbullet\ "));
    assert!(latex.contains(r"\rule{\linewidth}{1.5pt}"));
    assert!(latex.contains("top=36"));
}

#[test]
fn test_table_cells_keep_run_formatting() {
    let body = r#"<w:tbl><w:tr>
      <w:tc><w:p><w:r><w:rPr><w:b/><w:sz w:val="28"/></w:rPr><w:t>Skills</w:t></w:r></w:p></w:tc>
      <w:tc><w:p><w:r><w:t>Rust</w:t></w:r></w:p></w:tc>
    </w:tr></w:tbl>"#;
    let doc = DocxExtractor::from_bytes(&docx(body))
        .unwrap()
        .extract()
        .unwrap();
    let latex = TemplateRenderer::mirror(RenderOptions::default())
        .unwrap()
        .render_document(&doc)
        .unwrap();

    assert!(latex.contains(r"\begin{tabular}{ll}"));
    assert!(latex.contains(r"\fontsize{14}{16.8}\selectfont \textbf{Skills}"));
}

#[test]
fn test_probe_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resume.docx");
    std::fs::write(&path, docx(resume_body())).unwrap();

    let report = vitae::probe_docx(&path).unwrap();
    assert_eq!(report.count("pBdr"), 1);
    assert_eq!(report.count("tbl"), 1);
    assert_eq!(report.count("br"), 0);
}

#[test]
fn test_missing_body_is_malformed() {
    let bytes = {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(format!(r#"<w:document xmlns:w="{}"/>"#, W_NS).as_bytes())
            .unwrap();
        zip.finish().unwrap().into_inner()
    };

    let err = DocxExtractor::from_bytes(&bytes).unwrap().extract().unwrap_err();
    assert!(matches!(err, Error::MalformedDocument(_)));
}

#[test]
fn test_container_without_document_part() {
    let bytes = {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/styles.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"<styles/>").unwrap();
        zip.finish().unwrap().into_inner()
    };

    assert!(matches!(
        DocxExtractor::from_bytes(&bytes),
        Err(Error::MalformedDocument(_))
    ));
}

#[test]
fn test_payload_for_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.docx");
    std::fs::write(&path, b"PK\x03\x04 not really a zip").unwrap();

    let payload = vitae::extract_docx_payload(&path);
    assert!(payload["error"]
        .as_str()
        .unwrap()
        .starts_with("Malformed document"));
}
