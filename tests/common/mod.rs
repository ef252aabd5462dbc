//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Letter height in points.
pub const PAGE_HEIGHT: i64 = 792;

/// One line of text placed with an absolute text matrix.
pub struct Line<'a> {
    pub text: &'a str,
    pub x: i64,
    pub baseline: i64,
    pub size: i64,
    pub bold: bool,
}

pub fn line(text: &str, x: i64, baseline: i64, size: i64) -> Line<'_> {
    Line {
        text,
        x,
        baseline,
        size,
        bold: false,
    }
}

pub fn bold(text: &str, x: i64, baseline: i64, size: i64) -> Line<'_> {
    Line {
        bold: true,
        ..line(text, x, baseline, size)
    }
}

/// Expected `top` of a line: distance from the page top to the glyph ascent.
pub fn top_of(baseline: i64, size: i64) -> f32 {
    PAGE_HEIGHT as f32 - (baseline as f32 + 0.8 * size as f32)
}

/// Helvetica advances for codes 32 to 126, in thousandths of an em.
pub const HELVETICA_WIDTHS: [i64; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space to /
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0 to ?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @ to O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P to _
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // ` to o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p to ~
];

/// Build a PDF with one page per slice of lines. Fonts declare no widths,
/// as the standard 14 fonts may.
pub fn pdf(pages: &[&[Line]]) -> Vec<u8> {
    build(pages, false)
}

/// Like [`pdf`], with `/FirstChar` and `/Widths` on the regular font.
pub fn pdf_with_widths(pages: &[&[Line]]) -> Vec<u8> {
    build(pages, true)
}

fn build(pages: &[&[Line]], widths: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut regular_font = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    };
    if widths {
        regular_font.set("FirstChar", Object::Integer(32));
        regular_font.set("LastChar", Object::Integer(126));
        regular_font.set(
            "Widths",
            HELVETICA_WIDTHS
                .iter()
                .map(|&w| Object::Integer(w))
                .collect::<Vec<_>>(),
        );
    }
    let regular = doc.add_object(regular_font);
    let heavy = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => heavy,
        },
    });

    let mut kids = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for l in lines.iter() {
            let font = if l.bold { "F2" } else { "F1" };
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(l.size)],
            ));
            operations.push(Operation::new(
                "Tm",
                vec![
                    Object::Integer(1),
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(1),
                    Object::Integer(l.x),
                    Object::Integer(l.baseline),
                ],
            ));
            operations.push(Operation::new("Tj", vec![Object::string_literal(l.text)]));
            operations.push(Operation::new("ET", vec![]));
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// A one-page resume with the name at the top.
pub fn resume_pdf() -> Vec<u8> {
    pdf(&[&[
        bold("Jane Doe", 72, 750, 20),
        line("Acme Corp", 72, 700, 11),
        line("Staff Engineer", 300, 700, 11),
        line("Cut latency by 40%", 90, 684, 10),
    ]])
}

pub const RESUME_JSON: &str = r#"{
  "resume": {
    "name": "Jane Doe",
    "experience": [
      {
        "company": "Acme Corp",
        "role": "Staff Engineer",
        "bullets": ["Cut latency by 40%"]
      }
    ]
  }
}"#;
