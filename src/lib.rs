//! # vitae
//!
//! Document fidelity pipeline for structured profiles.
//!
//! A profile (JSON data, or a DOCX document reduced to a semantic model) is
//! rendered to LaTeX through a template, typeset to PDF, and the PDF is read
//! back geometrically so the audit can confirm that every source entity made
//! it to the page, and that the name sits where it belongs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vitae::Pipeline;
//!
//! fn main() -> vitae::Result<()> {
//!     let result = Pipeline::new().run("data/masters/jane.json", "templates/cv.tex")?;
//!
//!     println!("{}", result.report.to_json()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Stages
//!
//! - **Extraction**: [`DocxExtractor`] walks `word/document.xml` into a [`SemanticDocument`]
//! - **Rendering**: [`TemplateRenderer`] binds data with `((% %))`/`((( )))` delimiters
//! - **Compilation**: [`LatexCompiler`] runs `xelatex` in a scratch directory
//! - **Geometry**: [`GeometryExtractor`] recovers positioned words and lines
//! - **Audit**: [`FidelityAuditor`] scores the geometry against the source

pub mod audit;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod text;
pub mod toolchain;

// Re-export commonly used types
pub use audit::{validate_master_path, AuditOptions, FidelityAuditor, SourceGuard};
pub use detect::{detect_format_from_bytes, detect_format_from_path, InputFormat};
pub use error::{Error, ErrorPayload, Result};
pub use model::{
    Alignment, AuditMetrics, AuditReport, AuditStatus, Block, Cell, GeoLine, GeoPage, GeoToken,
    GeometryDocument, Metadata, PageSetup, Paragraph, ParagraphStyle, Profile, Rgb, Run,
    RunStyle, SemanticDocument, Table,
};
pub use parser::{
    probe_docx, DocxExtractor, ErrorMode, ExtractOptions, FontMap, GeometryExtractor,
    GeometryOptions, PageSelection, ProbeReport,
};
pub use render::{JsonFormat, RenderOptions, TemplateRenderer};
pub use text::{escape, normalize, partial_ratio, EscapeMode};
pub use toolchain::{CompileOptions, CompiledPdf, LatexCompiler};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Extract a DOCX file into a semantic document.
///
/// # Example
///
/// ```no_run
/// use vitae::extract_docx;
///
/// let doc = extract_docx("resume.docx").unwrap();
/// println!("{} blocks", doc.blocks.len());
/// ```
pub fn extract_docx<P: AsRef<Path>>(path: P) -> Result<SemanticDocument> {
    DocxExtractor::open(path)?.extract()
}

/// Extract a DOCX file with custom options.
pub fn extract_docx_with_options<P: AsRef<Path>>(
    path: P,
    options: ExtractOptions,
) -> Result<SemanticDocument> {
    DocxExtractor::open_with_options(path, options)?.extract()
}

/// Extract a DOCX file, converting failure into an `{"error": ...}` payload.
pub fn extract_docx_payload<P: AsRef<Path>>(path: P) -> serde_json::Value {
    error::to_payload(&extract_docx(path))
}

/// Render JSON profile data from a file through a template file.
///
/// # Example
///
/// ```no_run
/// use vitae::render_profile;
///
/// let latex = render_profile("data/masters/jane.json", "templates/cv.tex").unwrap();
/// std::fs::write("jane.tex", latex).unwrap();
/// ```
pub fn render_profile<D: AsRef<Path>, T: AsRef<Path>>(data: D, template: T) -> Result<String> {
    TemplateRenderer::from_file(template, RenderOptions::default())?.render_file(data)
}

/// Extract a DOCX file and render it through a template, or through the
/// built-in mirror layout when `template` is `None`.
pub fn render_docx<P: AsRef<Path>>(path: P, template: Option<&Path>) -> Result<String> {
    let doc = extract_docx(path)?;
    let renderer = match template {
        Some(template) => TemplateRenderer::from_file(template, RenderOptions::default())?,
        None => TemplateRenderer::mirror(RenderOptions::default())?,
    };
    renderer.render_document(&doc)
}

/// Extract geometry from a PDF file.
///
/// # Example
///
/// ```no_run
/// use vitae::extract_geometry;
///
/// let geometry = extract_geometry("jane.pdf").unwrap();
/// for line in geometry.lines() {
///     println!("{:>7.1} {}", line.top, line.text);
/// }
/// ```
pub fn extract_geometry<P: AsRef<Path>>(path: P) -> Result<GeometryDocument> {
    GeometryExtractor::open(path)?.extract()
}

/// Extract geometry from PDF bytes.
pub fn extract_geometry_bytes(data: &[u8]) -> Result<GeometryDocument> {
    GeometryExtractor::from_bytes(data)?.extract()
}

/// Extract geometry, converting failure into an `{"error": ...}` payload.
pub fn extract_geometry_payload<P: AsRef<Path>>(path: P) -> serde_json::Value {
    error::to_payload(&extract_geometry(path))
}

/// Audit a source JSON file against a rendered PDF with default thresholds.
///
/// # Example
///
/// ```no_run
/// use vitae::audit_files;
///
/// let report = audit_files("data/masters/jane.json", "jane.pdf").unwrap();
/// assert!(report.integrity_score() <= 100);
/// ```
pub fn audit_files<S: AsRef<Path>, P: AsRef<Path>>(source: S, pdf: P) -> Result<AuditReport> {
    FidelityAuditor::default().audit_files(source, pdf)
}

/// Builder for the full profile → LaTeX → PDF → audit round trip.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use vitae::Pipeline;
///
/// let result = Pipeline::new()
///     .with_timeout(Duration::from_secs(60))
///     .with_fuzzy_threshold(90.0)
///     .run("data/masters/jane.json", "templates/cv.tex")?;
/// std::fs::write("jane.pdf", &result.pdf)?;
/// # Ok::<(), vitae::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    render_options: RenderOptions,
    compile_options: CompileOptions,
    audit_options: AuditOptions,
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set render options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Set compile options.
    pub fn with_compile_options(mut self, options: CompileOptions) -> Self {
        self.compile_options = options;
        self
    }

    /// Set audit options.
    pub fn with_audit_options(mut self, options: AuditOptions) -> Self {
        self.audit_options = options;
        self
    }

    /// Set the TeX engine.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.compile_options = self.compile_options.with_binary(binary);
        self
    }

    /// Set the compilation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.compile_options = self.compile_options.with_timeout(timeout);
        self
    }

    /// Add a TEXINPUTS root.
    pub fn with_texinput(mut self, root: impl Into<PathBuf>) -> Self {
        self.compile_options = self.compile_options.with_texinput(root);
        self
    }

    /// Set the fuzzy match threshold.
    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.audit_options = self.audit_options.with_fuzzy_threshold(threshold);
        self
    }

    /// Set the name drift threshold.
    pub fn with_drift_threshold(mut self, threshold: f32) -> Self {
        self.audit_options = self.audit_options.with_drift_threshold(threshold);
        self
    }

    /// Set the sandbox root for source paths.
    pub fn with_sandbox_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.audit_options = self.audit_options.with_sandbox_root(root);
        self
    }

    /// Check a source path and load its JSON. Nothing is read if the path
    /// escapes the sandbox.
    pub fn load_source<P: AsRef<Path>>(&self, source: P) -> Result<(PathBuf, serde_json::Value)> {
        let root = match &self.audit_options.sandbox_root {
            Some(root) => root.clone(),
            None => std::env::current_dir()?,
        };
        let checked = SourceGuard::new(root, &self.audit_options.canonical_dir)?.check(source)?;
        let data = serde_json::from_str(&fs::read_to_string(&checked.path)?)?;
        Ok((checked.path, data))
    }

    /// Render a checked source file through a template.
    pub fn render<T: AsRef<Path>>(&self, source: &Path, template: T) -> Result<String> {
        TemplateRenderer::from_file(template, self.render_options.clone())?.render_file(source)
    }

    /// Compile LaTeX, adding the template's directory to TEXINPUTS.
    pub fn compile(&self, latex: &str, template: &Path) -> Result<CompiledPdf> {
        let options = self
            .compile_options
            .clone()
            .with_texinput(template.parent().unwrap_or(Path::new("")));
        LatexCompiler::new(options).compile(latex)
    }

    /// Extract geometry from PDF bytes and audit it against source data.
    pub fn audit(
        &self,
        data: &serde_json::Value,
        pdf: &[u8],
    ) -> Result<(GeometryDocument, AuditReport)> {
        let geometry =
            GeometryExtractor::from_bytes_with_options(pdf, self.audit_options.geometry.clone())?
                .extract()?;
        let report = FidelityAuditor::new(self.audit_options.clone()).audit_value(data, &geometry)?;
        Ok((geometry, report))
    }

    /// Run every stage.
    pub fn run<S: AsRef<Path>, T: AsRef<Path>>(&self, source: S, template: T) -> Result<PipelineResult> {
        let template = template.as_ref();
        let (source, data) = self.load_source(source)?;

        log::info!("Rendering {} with {}", source.display(), template.display());
        let latex = self.render(&source, template)?;

        let compiled = self.compile(&latex, template)?;

        log::info!("Auditing {} bytes of PDF", compiled.pdf.len());
        let (geometry, report) = self.audit(&data, &compiled.pdf)?;

        Ok(PipelineResult {
            latex,
            pdf: compiled.pdf,
            log: compiled.log,
            geometry,
            report,
        })
    }
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Rendered LaTeX source
    pub latex: String,
    /// Typeset PDF
    pub pdf: Vec<u8>,
    /// Engine log, when kept
    pub log: Option<String>,
    /// Geometry read back from the PDF
    pub geometry: GeometryDocument,
    /// Audit verdict
    pub report: AuditReport,
}

impl PipelineResult {
    /// Write the PDF to a file.
    pub fn write_pdf<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, &self.pdf)?;
        Ok(())
    }

    /// Whether the audit passed.
    pub fn passed(&self) -> bool {
        self.report.passed()
    }
}
