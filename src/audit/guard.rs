//! Source-of-truth path checks, performed before any file is read.

use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

use super::options::DEFAULT_CANONICAL_DIR;

/// A source path that passed the sandbox check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedPath {
    /// Absolute, lexically normalized path
    pub path: PathBuf,

    /// Whether the path lies in the canonical data directory
    pub canonical: bool,
}

/// Confines source paths to a sandbox root and flags non-canonical ones.
///
/// Resolution is purely lexical: `.` and `..` are folded without touching
/// the filesystem, so a rejected path is never opened or stat'ed.
#[derive(Debug, Clone)]
pub struct SourceGuard {
    sandbox_root: PathBuf,
    canonical_dir: PathBuf,
}

impl SourceGuard {
    /// Create a guard. A relative `sandbox_root` is taken from the working
    /// directory, a relative `canonical_dir` from `sandbox_root`.
    pub fn new(sandbox_root: impl Into<PathBuf>, canonical_dir: impl AsRef<Path>) -> Result<Self> {
        let sandbox_root = sandbox_root.into();
        if sandbox_root.as_os_str().is_empty() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "sandbox root is empty",
            )));
        }

        let sandbox_root = if sandbox_root.is_absolute() {
            lexical_normalize(&sandbox_root)
        } else {
            lexical_normalize(&env::current_dir()?.join(sandbox_root))
        };
        let canonical_dir = lexical_normalize(&sandbox_root.join(canonical_dir));
        Ok(Self {
            sandbox_root,
            canonical_dir,
        })
    }

    /// Guard rooted at the working directory with the default canonical dir.
    pub fn from_current_dir() -> Result<Self> {
        Self::new(env::current_dir()?, DEFAULT_CANONICAL_DIR)
    }

    /// The sandbox root.
    pub fn sandbox_root(&self) -> &Path {
        &self.sandbox_root
    }

    /// The canonical data directory.
    pub fn canonical_dir(&self) -> &Path {
        &self.canonical_dir
    }

    /// Resolve a path against the sandbox root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        lexical_normalize(&self.sandbox_root.join(path))
    }

    /// Check a source path.
    ///
    /// Paths escaping the sandbox fail with [`Error::PathSecurity`]; paths
    /// outside the canonical directory pass with a warning.
    pub fn check(&self, path: impl AsRef<Path>) -> Result<CheckedPath> {
        let given = path.as_ref();
        let resolved = self.resolve(given);

        if !resolved.starts_with(&self.sandbox_root) {
            return Err(Error::PathSecurity {
                path: given.to_path_buf(),
                root: self.sandbox_root.clone(),
            });
        }

        let canonical = resolved.starts_with(&self.canonical_dir);
        if !canonical {
            log::warn!(
                "Path '{}' is outside '{}/'. This violates the 'Source of Truth' standard.",
                given.display(),
                self.canonical_dir
                    .strip_prefix(&self.sandbox_root)
                    .unwrap_or(&self.canonical_dir)
                    .display()
            );
        }

        Ok(CheckedPath {
            path: resolved,
            canonical,
        })
    }
}

/// Check a source path against the working directory sandbox.
pub fn validate_master_path(path: impl AsRef<Path>) -> Result<CheckedPath> {
    SourceGuard::from_current_dir()?.check(path)
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
