//! Phase 1: Copy into Staging
//!
//! Validates the original root, creates a process-private temporary directory
//! and copies the tree into `<temp>/<original-name>`. The copy mirrors the
//! original relative layout exactly, so the last path component of the
//! staging root is also the top-level folder of the final archive.

use std::fs;
use std::path::Path;

use log::info;

use super::{Layout, StagedBundle};
use crate::copy::{copy_tree, CopyStats};
use crate::defaults;
use crate::error::{Error, Result};

/// Execute Phase 1: stage a copy of `original_root`.
pub fn execute(original_root: &Path, external_dir: &str) -> Result<(StagedBundle, CopyStats)> {
    let source_error = |message: String| Error::SourceRoot {
        path: original_root.display().to_string(),
        message,
    };

    let meta = fs::metadata(original_root).map_err(|e| source_error(e.to_string()))?;
    if !meta.is_dir() {
        return Err(source_error("not a directory".to_string()));
    }

    let original_root =
        dunce::canonicalize(original_root).map_err(|e| source_error(e.to_string()))?;
    let name = original_root
        .file_name()
        .ok_or_else(|| source_error("a filesystem root cannot be packaged".to_string()))?
        .to_os_string();

    let temp = tempfile::Builder::new()
        .prefix(defaults::STAGING_PREFIX)
        .tempdir()?;
    let temp_root = dunce::canonicalize(temp.path())?;
    let staging_root = temp_root.join(name);

    let stats = copy_tree(&original_root, &staging_root)?;
    info!(
        "[copy] {} -> {} ({} files, {} directories)",
        original_root.display(),
        staging_root.display(),
        stats.files,
        stats.dirs
    );

    let layout = Layout::new(original_root, staging_root, external_dir);
    Ok((StagedBundle::new(temp, layout), stats))
}
