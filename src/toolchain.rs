//! # Dependency Toolchain Seam
//!
//! The vendor phase needs two external operations, run against a directory:
//! tidying a module's dependency list and vendoring dependencies. They are
//! expressed through the [`Toolchain`] trait so the orchestration logic can be
//! exercised in tests with a recording fake instead of a real `go` binary.
//!
//! [`GoToolchain`] is the production implementation. It shells out to the
//! configured `go` binary and captures its output; a non-zero exit becomes an
//! [`Error::Toolchain`] carrying the command's stderr.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Command;

use log::debug;

use crate::defaults;
use crate::error::{Error, Result};

/// What a vendor step operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VendorScope {
    /// Vendor every module of a workspace (`go work vendor`).
    Workspace,
    /// Vendor a single module (`go mod vendor`).
    Module,
}

impl fmt::Display for VendorScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VendorScope::Workspace => write!(f, "work vendor"),
            VendorScope::Module => write!(f, "mod vendor"),
        }
    }
}

/// External dependency tooling - allows faking in tests
pub trait Toolchain: Send + Sync {
    /// Bring a module's dependency list up to date (`go mod tidy`).
    fn tidy(&self, dir: &Path) -> Result<()>;

    /// Copy dependencies into a `vendor/` directory below `dir`.
    fn vendor(&self, dir: &Path, scope: VendorScope) -> Result<()>;
}

/// Runs the real `go` command.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    binary: OsString,
}

impl Default for GoToolchain {
    fn default() -> Self {
        Self::new(defaults::GO_BINARY)
    }
}

impl GoToolchain {
    /// Use `binary` (a name looked up on `PATH`, or a path) as the `go` command.
    pub fn new(binary: impl Into<OsString>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn run(&self, dir: &Path, args: &[&str]) -> Result<()> {
        let step = format!("go {}", args.join(" "));
        debug!("Running '{}' in {}", step, dir.display());

        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| Error::Toolchain {
                step: step.clone(),
                dir: dir.display().to_string(),
                message: format!("failed to start {}: {}", self.binary.to_string_lossy(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                output.status.to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(Error::Toolchain {
                step,
                dir: dir.display().to_string(),
                message,
            });
        }

        Ok(())
    }
}

impl Toolchain for GoToolchain {
    fn tidy(&self, dir: &Path) -> Result<()> {
        self.run(dir, &["mod", "tidy"])
    }

    fn vendor(&self, dir: &Path, scope: VendorScope) -> Result<()> {
        match scope {
            VendorScope::Workspace => self.run(dir, &["work", "vendor"]),
            VendorScope::Module => self.run(dir, &["mod", "vendor"]),
        }
    }
}
