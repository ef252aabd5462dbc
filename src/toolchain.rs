//! LaTeX to PDF compilation through an external TeX engine.
//!
//! The engine runs inside a scoped temporary directory that is removed on
//! every exit path, so auxiliary files never leak into the caller's tree.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use tempfile::tempdir;
use wait_timeout::ChildExt;
use which::which;

use crate::error::{Error, Result};

/// Engine used when none is configured.
pub const DEFAULT_BINARY: &str = "xelatex";

/// Environment variable that overrides the engine path.
pub const BINARY_ENV: &str = "VITAE_LATEX_BIN";

/// Default wall-clock budget for one compilation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Options for the TeX compiler.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Engine name or path
    pub binary: String,

    /// Wall-clock budget; the engine is killed when it is exceeded
    pub timeout: Duration,

    /// Directories searched recursively for classes, styles and fonts.
    /// Relative roots are taken from the working directory.
    pub texinputs: Vec<PathBuf>,

    /// Keep the engine's `.log` output in the result
    pub keep_log: bool,

    /// Job name, which names the intermediate files
    pub job_name: String,
}

impl CompileOptions {
    /// Create new compile options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine name or path.
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the wall-clock budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a TEXINPUTS search root.
    pub fn with_texinput(mut self, root: impl Into<PathBuf>) -> Self {
        self.texinputs.push(root.into());
        self
    }

    /// Keep or discard the engine log.
    pub fn with_keep_log(mut self, keep: bool) -> Self {
        self.keep_log = keep;
        self
    }

    /// Set the job name.
    pub fn with_job_name(mut self, name: impl Into<String>) -> Self {
        self.job_name = name.into();
        self
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            binary: DEFAULT_BINARY.to_string(),
            timeout: DEFAULT_TIMEOUT,
            texinputs: Vec::new(),
            keep_log: false,
            job_name: "vitae".to_string(),
        }
    }
}

/// Output of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompiledPdf {
    /// The typeset PDF
    pub pdf: Vec<u8>,

    /// Engine log, when requested
    pub log: Option<String>,
}

/// Runs a TeX engine on LaTeX source.
#[derive(Debug, Clone, Default)]
pub struct LatexCompiler {
    options: CompileOptions,
}

impl LatexCompiler {
    /// Create a compiler.
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Options in effect.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Locate the engine: the override variable, then a path, then `PATH`.
    ///
    /// Relative paths are made absolute, since the engine runs elsewhere.
    pub fn resolve_binary(&self) -> Result<PathBuf> {
        if let Some(path) = env::var_os(BINARY_ENV).filter(|p| !p.is_empty()) {
            let path = PathBuf::from(path);
            if path.components().count() > 1 {
                return Ok(env::current_dir()?.join(path));
            }
            return Ok(path);
        }

        let configured = Path::new(&self.options.binary);
        if configured.components().count() > 1 {
            return Ok(env::current_dir()?.join(configured));
        }

        which(&self.options.binary).map_err(|e| Error::Toolchain {
            status: "not found".to_string(),
            message: format!("could not locate '{}': {}", self.options.binary, e),
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    /// Compile LaTeX source and return the PDF bytes.
    pub fn compile(&self, source: &str) -> Result<CompiledPdf> {
        let binary = self.resolve_binary()?;
        let job = &self.options.job_name;
        let cwd = env::current_dir()?;
        let roots: Vec<PathBuf> = self.options.texinputs.iter().map(|r| cwd.join(r)).collect();
        let work = tempdir()?;

        let tex_path = work.path().join(format!("{}.tex", job));
        fs::write(&tex_path, source)?;
        let stdout_path = work.path().join("engine.stdout");
        let stderr_path = work.path().join("engine.stderr");

        log::info!("Compiling {} with {}", tex_path.display(), binary.display());

        let mut child = Command::new(&binary)
            .current_dir(work.path())
            .arg("-interaction=nonstopmode")
            .arg(format!("-jobname={}", job))
            .arg(&tex_path)
            .env("TEXINPUTS", texinputs(&roots, env::var_os("TEXINPUTS")))
            .stdin(Stdio::null())
            .stdout(Stdio::from(fs::File::create(&stdout_path)?))
            .stderr(Stdio::from(fs::File::create(&stderr_path)?))
            .spawn()
            .map_err(|e| Error::Toolchain {
                status: "spawn failed".to_string(),
                message: format!("failed to launch {}: {}", binary.display(), e),
                stdout: String::new(),
                stderr: String::new(),
            })?;

        let status = match child.wait_timeout(self.options.timeout)? {
            Some(status) => status,
            None => {
                log::warn!(
                    "{} exceeded {:?}, killing it",
                    binary.display(),
                    self.options.timeout
                );
                child.kill()?;
                child.wait()?;
                return Err(Error::ToolchainTimeout(self.options.timeout.as_secs()));
            }
        };

        let stdout = read_lossy(&stdout_path);
        let stderr = read_lossy(&stderr_path);
        let pdf_path = work.path().join(format!("{}.pdf", job));

        if !status.success() {
            return Err(Error::Toolchain {
                status: status.to_string(),
                message: format!("{} exited with {}", binary.display(), status),
                stdout,
                stderr,
            });
        }

        let pdf = fs::read(&pdf_path).map_err(|_| Error::Toolchain {
            status: status.to_string(),
            message: format!("{} produced no {}.pdf", binary.display(), job),
            stdout: stdout.clone(),
            stderr: stderr.clone(),
        })?;

        let log = if self.options.keep_log {
            fs::read_to_string(work.path().join(format!("{}.log", job))).ok()
        } else {
            None
        };

        log::debug!("Compiled {} bytes of PDF", pdf.len());
        Ok(CompiledPdf { pdf, log })
    }

    /// Compile LaTeX source and write the PDF to `output`.
    pub fn compile_to_file<P: AsRef<Path>>(&self, source: &str, output: P) -> Result<CompiledPdf> {
        let compiled = self.compile(source)?;
        fs::write(output.as_ref(), &compiled.pdf)?;
        Ok(compiled)
    }
}

/// Build a TEXINPUTS value: the working directory, each root searched
/// recursively, then any existing value, ending with the system default.
pub fn texinputs(roots: &[PathBuf], existing: Option<OsString>) -> OsString {
    let mut value = OsString::from(".:");
    for root in roots {
        value.push(root.as_os_str());
        value.push("//:");
    }
    if let Some(existing) = existing.filter(|e| !e.is_empty()) {
        value.push(&existing);
        if !existing.to_string_lossy().ends_with(':') {
            value.push(":");
        }
    }
    value
}

fn read_lossy(path: &Path) -> String {
    fs::read(path)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texinputs() {
        let roots = vec![PathBuf::from("/srv/templates")];
        assert_eq!(texinputs(&roots, None), OsString::from(".:/srv/templates//:"));
        assert_eq!(
            texinputs(&[], Some(OsString::from("/opt/tex"))),
            OsString::from(".:/opt/tex:")
        );
        assert_eq!(texinputs(&[], Some(OsString::new())), OsString::from(".:"));
    }

    #[test]
    fn test_compile_options_builder() {
        let options = CompileOptions::new()
            .with_binary("lualatex")
            .with_timeout(Duration::from_secs(5))
            .with_texinput("templates")
            .with_keep_log(true);

        assert_eq!(options.binary, "lualatex");
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.texinputs, vec![PathBuf::from("templates")]);
        assert!(options.keep_log);
    }

    #[test]
    fn test_missing_binary() {
        let compiler = LatexCompiler::new(
            CompileOptions::new().with_binary("vitae-no-such-engine-on-path"),
        );
        if env::var_os(BINARY_ENV).is_none() {
            let err = compiler.compile("\\relax").unwrap_err();
            assert!(matches!(err, Error::Toolchain { .. }));
        }
    }

    #[cfg(unix)]
    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    // One test so the fake engines are never written while another test forks.
    #[cfg(unix)]
    #[test]
    fn test_fake_engines() {
        if env::var_os(BINARY_ENV).is_some() {
            return;
        }
        let bin = tempfile::tempdir().unwrap();

        let ok = script(
            bin.path(),
            "ok-engine",
            r#"for a in "$@"; do case "$a" in -jobname=*) job="${a#-jobname=}";; esac; done
printf '%%PDF-1.4 fake' > "$job.pdf"
echo "TEXINPUTS=$TEXINPUTS" > "$job.log""#,
        );
        let compiler = LatexCompiler::new(
            CompileOptions::new()
                .with_binary(ok.to_string_lossy())
                .with_texinput("/srv/tpl")
                .with_keep_log(true),
        );
        let compiled = compiler.compile("\\relax").unwrap();
        assert!(compiled.pdf.starts_with(b"%PDF-1.4"));
        assert!(compiled.log.unwrap().contains(".:/srv/tpl//:"));

        let relative = LatexCompiler::new(
            CompileOptions::new()
                .with_binary(ok.to_string_lossy())
                .with_texinput("tpl")
                .with_keep_log(true),
        );
        let log = relative.compile("\\relax").unwrap().log.unwrap();
        let expected = env::current_dir().unwrap().join("tpl");
        assert!(log.contains(&format!(".:{}//:", expected.display())));

        let failing = script(bin.path(), "bad-engine", "echo '! Undefined control sequence.'\nexit 1");
        let err = LatexCompiler::new(CompileOptions::new().with_binary(failing.to_string_lossy()))
            .compile("\\bogus")
            .unwrap_err();
        match err {
            Error::Toolchain { stdout, .. } => assert!(stdout.contains("Undefined control sequence")),
            other => panic!("unexpected error: {other}"),
        }

        let slow = script(bin.path(), "slow-engine", "sleep 5");
        let err = LatexCompiler::new(
            CompileOptions::new()
                .with_binary(slow.to_string_lossy())
                .with_timeout(Duration::from_millis(200)),
        )
        .compile("\\relax")
        .unwrap_err();
        assert!(matches!(err, Error::ToolchainTimeout(_)));
    }
}
