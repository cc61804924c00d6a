//! Phase 5: Packaging
//!
//! Zips the staging root into `<output_dir>/<staging-root-name>.zip`.

use std::path::{Path, PathBuf};

use log::info;

use super::Layout;
use crate::archive::{archive_dir, AllowList, ArchiveSummary};
use crate::error::{Error, Result};
use crate::path;

/// Where the archive for `layout` lands inside `output_dir`.
pub fn archive_path(layout: &Layout, output_dir: &Path) -> Result<PathBuf> {
    let name = layout
        .staging_root
        .file_name()
        .ok_or_else(|| Error::path(format!("{} has no name", layout.staging_root.display())))?;
    let mut file_name = name.to_os_string();
    file_name.push(".zip");
    Ok(path::absolute(output_dir)?.join(file_name))
}

/// Execute Phase 5: write the bundle archive.
pub fn execute(layout: &Layout, output_dir: &Path, allow: &AllowList) -> Result<ArchiveSummary> {
    let dest = archive_path(layout, output_dir)?;
    info!("[zip ] creating {}", dest.display());
    archive_dir(&layout.staging_root, &dest, allow)
}
