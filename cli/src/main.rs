//! vitae CLI - profile rendering and fidelity audit tool

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use vitae::{
    detect_format_from_path, AuditOptions, CompileOptions, ErrorPayload, EscapeMode, FidelityAuditor,
    GeometryExtractor, GeometryOptions, InputFormat, JsonFormat, LatexCompiler, PageSelection,
    Pipeline, RenderOptions, TemplateRenderer,
};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "vitae")]
#[command(version)]
#[command(about = "Render profiles to PDF and audit the typeset output", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a DOCX document into its semantic model (JSON)
    Extract {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Count layout-defining tags in a DOCX document
    Probe {
        /// Input DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Render JSON data or a DOCX document to LaTeX
    Render {
        /// Input JSON profile or DOCX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Template file (required for JSON; DOCX defaults to the mirror layout)
        #[arg(short, long, value_name = "FILE")]
        template: Option<PathBuf>,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Compile a LaTeX file to PDF
    Compile {
        /// Input LaTeX file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output PDF (input name with .pdf if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        compile: CompileArgs,
    },

    /// Extract positioned words and lines from a PDF (JSON)
    Geometry {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        geometry: GeometryArgs,
    },

    /// Audit a rendered PDF against its source profile
    Audit {
        /// Source profile JSON
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Rendered PDF
        #[arg(value_name = "PDF")]
        pdf: PathBuf,

        #[command(flatten)]
        audit: AuditArgs,

        #[command(flatten)]
        geometry: GeometryArgs,
    },

    /// Render, compile and audit a profile in one run
    Build {
        /// Source profile JSON
        #[arg(value_name = "SOURCE")]
        source: PathBuf,

        /// Template file
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        /// Output PDF (source name with .pdf if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Also write the audit report to this file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,

        #[command(flatten)]
        render: RenderArgs,

        #[command(flatten)]
        compile: CompileArgs,

        #[command(flatten)]
        audit: AuditArgs,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct RenderArgs {
    /// Context variable the data is bound to
    #[arg(long, env = "VITAE_ROOT_NAME", default_value = "resume")]
    root_name: String,

    /// Escape reserved characters only, without ligature suppression
    #[arg(long)]
    plain_escape: bool,
}

impl RenderArgs {
    fn options(&self) -> RenderOptions {
        let mode = if self.plain_escape {
            EscapeMode::Plain
        } else {
            EscapeMode::Strict
        };
        RenderOptions::new()
            .with_root_name(self.root_name.clone())
            .with_escape_mode(mode)
    }
}

#[derive(Args)]
struct CompileArgs {
    /// TeX engine
    #[arg(long, env = "VITAE_TEX_ENGINE", default_value = "xelatex")]
    engine: String,

    /// Compilation timeout in seconds
    #[arg(long, env = "VITAE_TEX_TIMEOUT", default_value = "120")]
    timeout: u64,

    /// Extra TEXINPUTS roots (searched recursively)
    #[arg(long, value_name = "DIR")]
    texinputs: Vec<PathBuf>,

    /// Keep the engine log next to the output
    #[arg(long)]
    keep_log: bool,
}

impl CompileArgs {
    fn options(&self) -> CompileOptions {
        let mut options = CompileOptions::new()
            .with_binary(self.engine.clone())
            .with_timeout(Duration::from_secs(self.timeout))
            .with_keep_log(self.keep_log);
        for root in &self.texinputs {
            options = options.with_texinput(root.clone());
        }
        options
    }
}

#[derive(Args)]
struct AuditArgs {
    /// Fuzzy score below which content counts as missing
    #[arg(long, env = "VITAE_FUZZY_THRESHOLD", default_value = "85")]
    fuzzy_threshold: f64,

    /// Largest mean Y position allowed for the name
    #[arg(long, env = "VITAE_DRIFT_THRESHOLD", default_value = "150")]
    drift_threshold: f32,

    /// Root that source paths may not escape (working directory by default)
    #[arg(long, env = "VITAE_SANDBOX_ROOT", value_name = "DIR")]
    sandbox_root: Option<PathBuf>,
}

impl AuditArgs {
    fn options(&self) -> AuditOptions {
        let mut options = AuditOptions::new()
            .with_fuzzy_threshold(self.fuzzy_threshold)
            .with_drift_threshold(self.drift_threshold);
        if let Some(root) = &self.sandbox_root {
            options = options.with_sandbox_root(root.clone());
        }
        options
    }
}

#[derive(Args)]
struct GeometryArgs {
    /// Horizontal gap that still joins fragments into one word
    #[arg(long, default_value = "3.0")]
    x_tolerance: f32,

    /// Vertical distance that still places words on one line
    #[arg(long, default_value = "3.0")]
    y_tolerance: f32,

    /// Page range (e.g., "1-2", "1,3")
    #[arg(long)]
    pages: Option<String>,

    /// Keep going when a page cannot be read
    #[arg(long)]
    lenient: bool,
}

impl GeometryArgs {
    fn options(&self) -> Result<GeometryOptions, Box<dyn std::error::Error>> {
        let selection = match self.pages.as_deref() {
            Some(p) => PageSelection::parse(p).map_err(|e| format!("Invalid page range: {}", e))?,
            None => PageSelection::All,
        };
        let mut options = GeometryOptions::new()
            .with_x_tolerance(self.x_tolerance)
            .with_y_tolerance(self.y_tolerance)
            .with_pages(selection);
        if self.lenient {
            options = options.lenient();
        }
        Ok(options)
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            input,
            output,
            compact,
        } => cmd_extract(&input, output.as_deref(), compact),
        Commands::Probe { input } => cmd_probe(&input),
        Commands::Render {
            input,
            template,
            output,
            render,
        } => cmd_render(&input, template.as_deref(), output.as_deref(), &render),
        Commands::Compile {
            input,
            output,
            compile,
        } => cmd_compile(&input, output.as_deref(), &compile),
        Commands::Geometry {
            input,
            output,
            compact,
            geometry,
        } => cmd_geometry(&input, output.as_deref(), compact, &geometry),
        Commands::Audit {
            source,
            pdf,
            audit,
            geometry,
        } => cmd_audit(&source, &pdf, &audit, &geometry),
        Commands::Build {
            source,
            template,
            output,
            report,
            render,
            compile,
            audit,
        } => cmd_build(
            &source,
            &template,
            output.as_deref(),
            report.as_deref(),
            &render,
            &compile,
            &audit,
        ),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn write_output(output: Option<&Path>, content: &str) -> CliResult {
    if let Some(path) = output {
        fs::write(path, content)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_extract(input: &Path, output: Option<&Path>, compact: bool) -> CliResult {
    match vitae::extract_docx(input) {
        Ok(doc) => write_output(output, &vitae::render::to_json(&doc, json_format(compact))?),
        Err(e) => {
            // Callers downstream expect a JSON document even on failure.
            println!("{}", serde_json::to_string(&ErrorPayload::from(&e))?);
            Err(e.into())
        }
    }
}

fn cmd_probe(input: &Path) -> CliResult {
    let report = vitae::probe_docx(input)?;

    println!("{} {}", "Probing".cyan().bold(), input.display());
    println!("{}", "─".repeat(40).dimmed());
    for finding in &report.findings {
        let count = if finding.count > 0 {
            finding.count.to_string().yellow()
        } else {
            finding.count.to_string().dimmed()
        };
        println!("{}: {} instances found.", finding.label.bold(), count);
        if let Some(example) = &finding.example {
            println!("  {} {}...", "Example XML:".dimmed(), example);
        }
    }

    Ok(())
}

fn cmd_render(
    input: &Path,
    template: Option<&Path>,
    output: Option<&Path>,
    args: &RenderArgs,
) -> CliResult {
    let options = args.options();

    let latex = match detect_format_from_path(input)? {
        InputFormat::Docx => {
            let doc = vitae::extract_docx(input)?;
            let renderer = match template {
                Some(t) => TemplateRenderer::from_file(t, options)?,
                None => TemplateRenderer::mirror(options)?,
            };
            renderer.render_document(&doc)?
        }
        InputFormat::Json => {
            let template = template.ok_or("a --template is required for JSON input")?;
            TemplateRenderer::from_file(template, options)?.render_file(input)?
        }
        other => return Err(format!("cannot render {} input", other).into()),
    };

    write_output(output, &latex)
}

fn cmd_compile(input: &Path, output: Option<&Path>, args: &CompileArgs) -> CliResult {
    let latex = fs::read_to_string(input)?;
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.with_extension("pdf"));

    let options = args
        .options()
        .with_texinput(input.parent().unwrap_or(Path::new("")));

    let compiled = LatexCompiler::new(options).compile_to_file(&latex, &output)?;
    if let Some(log) = &compiled.log {
        fs::write(output.with_extension("log"), log)?;
    }

    println!(
        "{} {} ({} bytes)",
        "Compiled".green(),
        output.display(),
        compiled.pdf.len()
    );
    Ok(())
}

fn cmd_geometry(
    input: &Path,
    output: Option<&Path>,
    compact: bool,
    args: &GeometryArgs,
) -> CliResult {
    let options = args.options()?;
    let result = GeometryExtractor::open_with_options(input, options).and_then(|g| g.extract());

    match result {
        Ok(geometry) => {
            write_output(output, &vitae::render::to_json(&geometry, json_format(compact))?)
        }
        Err(e) => {
            println!("{}", serde_json::to_string(&ErrorPayload::from(&e))?);
            Err(e.into())
        }
    }
}

fn cmd_audit(source: &Path, pdf: &Path, audit: &AuditArgs, geometry: &GeometryArgs) -> CliResult {
    let options = audit.options().with_geometry(geometry.options()?);
    let report = FidelityAuditor::new(options).audit_files(source, pdf)?;

    // The verdict is data, not a failure: exit 0 for PASS and FAIL alike.
    println!("{}", report.to_json()?);
    Ok(())
}

fn cmd_build(
    source: &Path,
    template: &Path,
    output: Option<&Path>,
    report_path: Option<&Path>,
    render: &RenderArgs,
    compile: &CompileArgs,
    audit: &AuditArgs,
) -> CliResult {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| source.with_extension("pdf"));

    let pipeline = Pipeline::new()
        .with_render_options(render.options())
        .with_compile_options(compile.options())
        .with_audit_options(audit.options());

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Checking source...");
    let (source, data) = pipeline.load_source(source)?;
    pb.inc(1);

    pb.set_message("Rendering template...");
    let latex = pipeline.render(&source, template)?;
    pb.inc(1);

    pb.set_message("Compiling PDF...");
    let compiled = pipeline.compile(&latex, template)?;
    fs::write(&output, &compiled.pdf)?;
    if let Some(log) = &compiled.log {
        fs::write(output.with_extension("log"), log)?;
    }
    pb.inc(1);

    pb.set_message("Auditing output...");
    let (_, report) = pipeline.audit(&data, &compiled.pdf)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    let json = report.to_json()?;
    if let Some(path) = report_path {
        fs::write(path, &json)?;
    }

    let verdict = if report.passed() {
        report.status().to_string().green().bold()
    } else {
        report.status().to_string().red().bold()
    };

    println!("\n{}", "Build results:".green().bold());
    println!("  {} {}", "├─".dimmed(), output.display());
    if let Some(path) = report_path {
        println!("  {} {}", "├─".dimmed(), path.display());
    }
    println!(
        "  {} {} (integrity {}/100)",
        "└─".dimmed(),
        verdict,
        report.integrity_score()
    );
    for issue in report.issues() {
        println!("     {}", issue.yellow());
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "vitae".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Profile rendering and fidelity audit tool");
    println!();
    println!("License: MIT");
}
