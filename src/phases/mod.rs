//! The phases of a pack run.
//!
//! ## Overview
//!
//! A pack run follows 5 phases:
//! 1. Copy - Validate the original root and copy it into a private staging directory
//! 2. Discovery - Find every `go.work` and `go.mod` in the staging copy
//! 3. Rewrite - Re-express path references so they resolve inside the staging copy,
//!    pulling external content under the external base
//! 4. Vendor - Run `tidy`/`vendor` through the toolchain, collecting failures as warnings
//! 5. Package - Zip the staging copy through the archive allow-list
//!
//! [`orchestrator::execute_pack`] chains them. All run state lives in a
//! [`Layout`] value passed explicitly to each phase.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;
use crate::path;

pub mod copy;
pub mod discovery;
pub mod orchestrator;
pub mod package;
pub mod rewrite;
pub mod vendor;

/// The three roots of a pack run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Canonical source directory. Only ever read.
    pub original_root: PathBuf,
    /// Writable copy with the same relative layout.
    pub staging_root: PathBuf,
    /// Directory under `staging_root` that receives external content.
    pub external_base: PathBuf,
}

impl Layout {
    pub fn new(original_root: PathBuf, staging_root: PathBuf, external_dir: &str) -> Self {
        let external_base = staging_root.join(external_dir);
        Self {
            original_root,
            staging_root,
            external_base,
        }
    }

    /// Map a path inside the original root to its mirror in the staging root.
    pub fn to_staging(&self, original: &Path) -> Result<PathBuf> {
        let rel = path::relative(&self.original_root, original)?;
        Ok(path::clean(&self.staging_root.join(rel)))
    }

    /// Map a path inside the staging root back to the original root.
    pub fn to_original(&self, staged: &Path) -> Result<PathBuf> {
        let rel = path::relative(&self.staging_root, staged)?;
        Ok(path::clean(&self.original_root.join(rel)))
    }
}

/// A staging copy owned by the current run.
///
/// The backing temporary directory is removed when this value is dropped,
/// unless [`StagedBundle::keep`] was called.
#[derive(Debug)]
pub struct StagedBundle {
    temp: TempDir,
    layout: Layout,
}

impl StagedBundle {
    pub fn new(temp: TempDir, layout: Layout) -> Self {
        Self { temp, layout }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Persist the staging directory past the end of the run and return the
    /// staging root.
    pub fn keep(self) -> PathBuf {
        let _ = self.temp.keep();
        self.layout.staging_root
    }
}
