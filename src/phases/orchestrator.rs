//! Orchestrator for the complete pack operation
//!
//! Chains the five phases and owns the staging directory for the duration of
//! the run. The staging directory is removed on return, whether the run
//! succeeded or not, unless [`PackOptions::keep_staging`] is set.

use std::path::{Path, PathBuf};

use log::info;

use super::discovery::DiscoveredManifests;
use super::rewrite::RewriteReport;
use super::vendor::VendorReport;
use super::{copy, discovery, package, rewrite, vendor, Layout};
use crate::archive::{AllowList, ArchiveSummary};
use crate::config;
use crate::copy::CopyStats;
use crate::defaults;
use crate::error::Result;
use crate::toolchain::Toolchain;

/// Resolved settings for one pack run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOptions {
    /// Name of the staging subdirectory receiving external content.
    pub external_dir: String,
    /// Directory the archive is written to.
    pub output_dir: PathBuf,
    pub keep_staging: bool,
    pub skip_vendor: bool,
    pub allow: AllowList,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            external_dir: defaults::EXTERNAL_DIR.to_string(),
            output_dir: PathBuf::from("."),
            keep_staging: false,
            skip_vendor: false,
            allow: AllowList::default(),
        }
    }
}

/// Results of a successful pack run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackOutcome {
    pub layout: Layout,
    pub copy: CopyStats,
    pub manifests: DiscoveredManifests,
    pub rewrite: RewriteReport,
    /// `None` when vendoring was skipped.
    pub vendor: Option<VendorReport>,
    pub archive: ArchiveSummary,
    /// Staging root left on disk, when requested.
    pub kept_staging: Option<PathBuf>,
}

/// Execute the complete pack operation (Phases 1-5)
///
/// 1. Copy the original root into a private staging directory
/// 2. Discover workspace and module manifests in the copy
/// 3. Rewrite their path references, pulling in external content
/// 4. Run the toolchain's tidy/vendor steps (unless skipped)
/// 5. Zip the staging copy into the output directory
pub fn execute_pack(
    original_root: &Path,
    options: &PackOptions,
    toolchain: &dyn Toolchain,
) -> Result<PackOutcome> {
    config::validate_external_dir(&options.external_dir)?;

    // Phase 1: Copy into staging
    let (staged, copy_stats) = copy::execute(original_root, &options.external_dir)?;
    let layout = staged.layout().clone();

    let result = run_phases(&layout, options, toolchain);

    let kept_staging = if options.keep_staging {
        let kept = staged.keep();
        info!("[keep] staging directory left at {}", kept.display());
        Some(kept)
    } else {
        drop(staged);
        None
    };

    let (manifests, rewrite, vendor, archive) = result?;
    Ok(PackOutcome {
        layout,
        copy: copy_stats,
        manifests,
        rewrite,
        vendor,
        archive,
        kept_staging,
    })
}

type PhaseResults = (
    DiscoveredManifests,
    RewriteReport,
    Option<VendorReport>,
    ArchiveSummary,
);

fn run_phases(
    layout: &Layout,
    options: &PackOptions,
    toolchain: &dyn Toolchain,
) -> Result<PhaseResults> {
    // Phase 2: Discovery
    let manifests = discovery::execute(&layout.staging_root)?;

    // Phase 3: Rewrite
    let rewrite = rewrite::execute(layout, &manifests)?;

    // Phase 4: Vendor
    let vendor = if options.skip_vendor {
        info!("[vendor] skipped");
        None
    } else {
        Some(vendor::execute(
            toolchain,
            &manifests,
            &rewrite.used_module_dirs,
        ))
    };

    // Phase 5: Package
    let archive = package::execute(layout, &options.output_dir, &options.allow)?;

    Ok((manifests, rewrite, vendor, archive))
}
