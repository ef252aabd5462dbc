//! Template binding with a LaTeX-safe delimiter grammar.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::syntax::SyntaxConfig;
use minijinja::value::Value;
use minijinja::{AutoEscape, Environment, ErrorKind, Output, State};

use super::dossier::validate_dossier;
use super::latex::LatexWriter;
use super::options::RenderOptions;
use crate::error::{Error, Result};
use crate::model::{unwrap_root, Block, SemanticDocument};
use crate::text::Escaper;

/// Name the built-in mirror layout is registered under.
pub const MIRROR_TEMPLATE_NAME: &str = "mirror.tex";

const MIRROR_TEMPLATE: &str = include_str!("mirror.tex");

/// Name of the escaping filter available to templates.
pub const ESCAPE_FILTER: &str = "latex_escape";

/// Renders data through one template.
///
/// Blocks use `((% %))`, interpolation `((( )))` and comments `((# #))`,
/// so LaTeX braces and percent signs never clash with template syntax.
/// Every interpolated string that is not already marked safe is escaped.
pub struct TemplateRenderer {
    env: Environment<'static>,
    template: String,
    options: RenderOptions,
    writer: LatexWriter,
}

impl TemplateRenderer {
    /// Load a template file. Its directory becomes the search path for
    /// `include`, `import` and `extends`.
    pub fn from_file<P: AsRef<Path>>(path: P, options: RenderOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::Template(format!(
                "template not found: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::Template(format!("invalid template name: {}", path.display())))?
            .to_string();
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let mut env = environment(&options)?;
        env.set_loader(minijinja::path_loader(dir));
        Self::finish(env, name, options)
    }

    /// Use template source held in memory.
    pub fn from_source(name: &str, source: &str, options: RenderOptions) -> Result<Self> {
        let mut env = environment(&options)?;
        env.add_template_owned(name.to_string(), source.to_string())?;
        Self::finish(env, name.to_string(), options)
    }

    /// The built-in layout that mirrors an extracted document.
    pub fn mirror(options: RenderOptions) -> Result<Self> {
        Self::from_source(MIRROR_TEMPLATE_NAME, MIRROR_TEMPLATE, options)
    }

    fn finish(env: Environment<'static>, template: String, options: RenderOptions) -> Result<Self> {
        // Compile now so syntax errors surface before any data is bound.
        env.get_template(&template)?;
        let writer = LatexWriter::new(Escaper::with_mode(options.escape_mode));
        Ok(Self {
            env,
            template,
            options,
            writer,
        })
    }

    /// Options in effect.
    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render structured data bound to the root variable.
    pub fn render(&self, data: &serde_json::Value) -> Result<String> {
        let data = unwrap_root(data.clone(), &self.options.root_name);
        let mut ctx = BTreeMap::new();
        ctx.insert(self.options.root_name.clone(), Value::from_serialize(&data));
        self.render_context(Value::from(ctx))
    }

    /// Load a JSON data file and render it.
    ///
    /// Dossier files are validated first.
    pub fn render_file<P: AsRef<Path>>(&self, data_path: P) -> Result<String> {
        let data_path = data_path.as_ref();
        let data: serde_json::Value = serde_json::from_str(&fs::read_to_string(data_path)?)?;

        if self.options.is_dossier_path(&data_path.to_string_lossy()) {
            log::info!("Validating dossier schema for {}", data_path.display());
            validate_dossier(&unwrap_root(data.clone(), &self.options.root_name))?;
        }

        self.render(&data)
    }

    /// Render an extracted document.
    ///
    /// The context holds `page_setup` and `blocks`. Paragraph blocks carry
    /// `rich_content`, table rows carry rendered cells; both are safe markup.
    pub fn render_document(&self, doc: &SemanticDocument) -> Result<String> {
        let blocks: Vec<Value> = doc.blocks.iter().map(|b| self.block_value(b)).collect();

        let setup = &doc.page_setup;
        let mut page_setup = BTreeMap::new();
        page_setup.insert("margin_top", Value::from(setup.margin_top));
        page_setup.insert("margin_bottom", Value::from(setup.margin_bottom));
        page_setup.insert("margin_left", Value::from(setup.margin_left));
        page_setup.insert("margin_right", Value::from(setup.margin_right));
        page_setup.insert(
            "primary_font",
            Value::from_safe_string(setup.primary_font.clone()),
        );

        let mut ctx = BTreeMap::new();
        ctx.insert("page_setup", Value::from(page_setup));
        ctx.insert("blocks", Value::from(blocks));
        self.render_context(Value::from(ctx))
    }

    fn render_context(&self, ctx: Value) -> Result<String> {
        let template = self.env.get_template(&self.template)?;
        let rendered = template.render(ctx)?;
        log::debug!(
            "Rendered template {} ({} bytes)",
            self.template,
            rendered.len()
        );
        Ok(rendered)
    }

    fn block_value(&self, block: &Block) -> Value {
        let mut map: BTreeMap<&'static str, Value> = BTreeMap::new();
        match block {
            Block::Paragraph(p) => {
                let style = &p.style;
                map.insert("type", Value::from("paragraph"));
                map.insert(
                    "alignment",
                    Value::from_safe_string(style.alignment.environment().to_string()),
                );
                map.insert("is_list", Value::from(style.is_list));
                map.insert("border_height", Value::from(style.border_height));
                map.insert("space_before", Value::from(style.space_before));
                map.insert("space_after", Value::from(style.space_after));
                map.insert("left_indent", Value::from(style.left_indent));
                map.insert("first_line_indent", Value::from(style.first_line_indent));
                map.insert("text", Value::from(p.plain_text()));
                map.insert(
                    "rich_content",
                    Value::from_safe_string(self.writer.paragraph(p)),
                );
            }
            Block::Table(table) => {
                let rows: Vec<Value> = table
                    .rows
                    .iter()
                    .map(|row| {
                        let cells: Vec<Value> = row
                            .iter()
                            .map(|cell| Value::from_safe_string(self.writer.cell(cell)))
                            .collect();
                        Value::from(cells)
                    })
                    .collect();
                let columns = table.column_count().max(1);
                map.insert("type", Value::from("table"));
                map.insert("columns", Value::from(columns));
                map.insert("colspec", Value::from_safe_string("l".repeat(columns)));
                map.insert("rows", Value::from(rows));
            }
            Block::Space { height } => {
                map.insert("type", Value::from("space"));
                map.insert("height", Value::from(*height));
            }
        }
        Value::from(map)
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("template", &self.template)
            .field("options", &self.options)
            .finish()
    }
}

fn environment(options: &RenderOptions) -> Result<Environment<'static>> {
    let mut env = Environment::new();

    let syntax = SyntaxConfig::builder()
        .block_delimiters("((%", "%))")
        .variable_delimiters("(((", ")))")
        .comment_delimiters("((#", "#))")
        .build()?;
    env.set_syntax(syntax);

    // Escaping is done by the formatter below, never by file extension.
    env.set_auto_escape_callback(|_| AutoEscape::None);

    let escaper = Escaper::with_mode(options.escape_mode);
    let filter_escaper = escaper.clone();
    env.add_filter(ESCAPE_FILTER, move |value: Value| -> Value {
        if value.is_safe() {
            return value;
        }
        match value.as_str() {
            Some(s) => Value::from_safe_string(filter_escaper.escape(s)),
            None => value,
        }
    });

    env.set_formatter(
        move |out: &mut Output<'_>, _state: &State<'_, '_>, value: &Value| {
            let rendered = match value.as_str() {
                Some(s) if !value.is_safe() => escaper.escape(s),
                _ => value.to_string(),
            };
            out.write_str(&rendered)
                .map_err(|_| minijinja::Error::from(ErrorKind::WriteFailure))
        },
    );

    Ok(env)
}

/// Render data through a template file with default options.
pub fn render<P: AsRef<Path>>(data: &serde_json::Value, template: P) -> Result<String> {
    TemplateRenderer::from_file(template, RenderOptions::default())?.render(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Paragraph, Run, RunStyle, Table};
    use crate::text::EscapeMode;
    use serde_json::json;

    fn renderer(source: &str) -> TemplateRenderer {
        TemplateRenderer::from_source("t.tex", source, RenderOptions::default()).unwrap()
    }

    #[test]
    fn test_interpolation_is_escaped() {
        let r = renderer(r"\section{((( resume.name )))}");
        let out = r.render(&json!({"name": "100% Cotton & Co"})).unwrap();
        assert_eq!(out, r"\section{100\% Cotton \& Co}");
    }

    #[test]
    fn test_filter_does_not_double_escape() {
        let r = renderer("((( resume.name | latex_escape )))");
        let out = r.render(&json!({"name": "R&D"})).unwrap();
        assert_eq!(out, r"R\&D");
    }

    #[test]
    fn test_filter_passes_non_strings() {
        let r = renderer("((( resume.years | latex_escape )))");
        assert_eq!(r.render(&json!({"years": 7})).unwrap(), "7");
    }

    #[test]
    fn test_root_unwrap_equivalence() {
        let r = renderer("((% for e in resume.experience %))((( e.company ))),((% endfor %))");
        let inner = json!({"experience": [{"company": "Acme"}, {"company": "Globex"}]});
        let wrapped = json!({"resume": inner.clone()});
        assert_eq!(r.render(&inner).unwrap(), r.render(&wrapped).unwrap());
        assert_eq!(r.render(&inner).unwrap(), "Acme,Globex,");
    }

    #[test]
    fn test_comments_and_strict_ligatures() {
        let r = renderer("((# header #))((( resume.role )))");
        assert_eq!(r.render(&json!({"role": "Staff"})).unwrap(), "Staf{f}");

        let plain = TemplateRenderer::from_source(
            "t.tex",
            "((( resume.role )))",
            RenderOptions::default().with_escape_mode(EscapeMode::Plain),
        )
        .unwrap();
        assert_eq!(plain.render(&json!({"role": "Staff"})).unwrap(), "Staff");
    }

    #[test]
    fn test_malformed_template() {
        let err = TemplateRenderer::from_source("bad.tex", "((% for x in %))", RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Template(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_template_file() {
        let err = TemplateRenderer::from_file("/nonexistent/cv.tex", RenderOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }

    #[test]
    fn test_file_template_with_include() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("header.tex"), r"\name{((( resume.name )))}").unwrap();
        fs::write(
            dir.path().join("cv.tex"),
            "((% include \"header.tex\" %))\n\\begin{document}",
        )
        .unwrap();

        let out = render(&json!({"name": "Jane_Doe"}), dir.path().join("cv.tex")).unwrap();
        assert!(out.starts_with(r"\name{Jane\_Doe}"));
    }

    #[test]
    fn test_dossier_file_validation() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("Acme_Strategy_Dossier.json");
        fs::write(&data, r#"{"company": "Acme"}"#).unwrap();

        let r = renderer("((( resume.company )))");
        let err = r.render_file(&data).unwrap_err();
        assert!(matches!(err, Error::Schema(_)));

        let plain = dir.path().join("profile.json");
        fs::write(&plain, r#"{"company": "Acme"}"#).unwrap();
        assert_eq!(r.render_file(&plain).unwrap(), "Acme");
    }

    #[test]
    fn test_mirror_document() {
        let mut doc = SemanticDocument::new();
        let mut name = Paragraph::new();
        name.style.alignment = crate::model::Alignment::Center;
        name.add_run(Run::styled(
            "Jane Doe",
            RunStyle {
                size: 18.0,
                bold: true,
                ..RunStyle::default()
            },
        ));
        doc.add_paragraph(name);
        doc.add_block(Block::Space { height: 8.0 });
        doc.add_paragraph(Paragraph::with_text("Office & Staff"));
        doc.add_table(Table::from_rows(vec![vec!["A".into(), "B".into()]]));

        let out = TemplateRenderer::mirror(RenderOptions::default())
            .unwrap()
            .render_document(&doc)
            .unwrap();

        assert!(out.contains(r"\begin{center}"));
        assert!(out.contains(r"\begin{flushleft}"));
        assert!(out.contains(r"\textbf{Jane Doe}"));
        assert!(out.contains(r"Of{f}{i}ce \& Staf{f}"));
        assert!(out.contains(r"\begin{tabular}{ll}"));
        assert!(out.contains(r"\setmainfont{EB Garamond}"));
        assert!(out.contains(r"\vspace{8"));
    }
}
