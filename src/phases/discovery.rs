//! Phase 2: Manifest Discovery
//!
//! Scans the staging copy for workspace (`go.work`) and module (`go.mod`)
//! manifests. Only regular files count; symlinks are not followed. Results
//! are sorted so later phases run in a stable order.

use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;

use crate::error::Result;
use crate::manifest::ManifestKind;

/// Manifest files found in the staging copy, each list sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredManifests {
    pub workspaces: Vec<PathBuf>,
    pub modules: Vec<PathBuf>,
}

/// Execute Phase 2: find all manifests below `root`.
pub fn execute(root: &Path) -> Result<DiscoveredManifests> {
    let mut found = DiscoveredManifests::default();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let kind = entry
            .file_name()
            .to_str()
            .and_then(ManifestKind::from_file_name);
        match kind {
            Some(ManifestKind::Workspace) => found.workspaces.push(entry.into_path()),
            Some(ManifestKind::Module) => found.modules.push(entry.into_path()),
            None => {}
        }
    }

    found.workspaces.sort();
    found.modules.sort();
    for path in found.workspaces.iter().chain(&found.modules) {
        debug!("[scan] {}", path.display());
    }
    info!(
        "[scan] found {} go.work, {} go.mod",
        found.workspaces.len(),
        found.modules.len()
    );
    Ok(found)
}
