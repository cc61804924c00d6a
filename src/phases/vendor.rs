//! Phase 4: Vendoring
//!
//! Runs the dependency toolchain over the rewritten staging copy:
//!
//! 1. For each workspace manifest, in discovery order: `tidy` every used module
//!    directory that contains a `go.mod`, then `vendor` the workspace once.
//! 2. For each module manifest whose directory is not covered by (equal to or
//!    nested under) a used module directory: `tidy`, then `vendor` the module.
//!
//! A failing step never aborts the run. It is logged with `warn!` and recorded
//! in the returned [`VendorReport`], and the remaining steps still run.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use log::{info, warn};

use super::discovery::DiscoveredManifests;
use crate::manifest::MODULE_FILE;
use crate::path;
use crate::toolchain::{Toolchain, VendorScope};

/// One toolchain invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorAction {
    Tidy,
    Vendor(VendorScope),
}

impl fmt::Display for VendorAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VendorAction::Tidy => write!(f, "mod tidy"),
            VendorAction::Vendor(scope) => write!(f, "{}", scope),
        }
    }
}

/// An attempted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorStep {
    pub dir: PathBuf,
    pub action: VendorAction,
}

/// A step that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorWarning {
    pub dir: PathBuf,
    pub action: VendorAction,
    pub message: String,
}

/// What the vendor phase did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorReport {
    /// Every attempted step, in execution order.
    pub steps: Vec<VendorStep>,
    pub warnings: Vec<VendorWarning>,
    /// Module directories left to their workspace.
    pub skipped: Vec<PathBuf>,
}

impl VendorReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Drives a [`Toolchain`] according to the vendoring policy.
pub struct VendorOrchestrator<'a> {
    toolchain: &'a dyn Toolchain,
    report: VendorReport,
}

impl<'a> VendorOrchestrator<'a> {
    pub fn new(toolchain: &'a dyn Toolchain) -> Self {
        Self {
            toolchain,
            report: VendorReport::default(),
        }
    }

    /// Vendor every workspace, then every module no workspace covers.
    pub fn run(
        mut self,
        manifests: &DiscoveredManifests,
        used_module_dirs: &BTreeSet<PathBuf>,
    ) -> VendorReport {
        for workspace in &manifests.workspaces {
            let Some(work_dir) = workspace.parent() else {
                continue;
            };
            for module_dir in used_module_dirs {
                if module_dir.join(MODULE_FILE).is_file() {
                    info!("[work] tidy in {} (used by {})", module_dir.display(), workspace.display());
                    self.step(module_dir, VendorAction::Tidy);
                }
            }
            info!("[work] vendor in {}", work_dir.display());
            self.step(work_dir, VendorAction::Vendor(VendorScope::Workspace));
        }

        for module in &manifests.modules {
            let Some(module_dir) = module.parent() else {
                continue;
            };
            if path::is_under_any(module_dir, used_module_dirs) {
                info!("[mod ] vendor skipped for {} (covered by go.work use)", module_dir.display());
                self.report.skipped.push(module_dir.to_path_buf());
                continue;
            }
            info!("[mod ] tidy and vendor in {}", module_dir.display());
            self.step(module_dir, VendorAction::Tidy);
            self.step(module_dir, VendorAction::Vendor(VendorScope::Module));
        }

        self.report
    }

    fn step(&mut self, dir: &Path, action: VendorAction) {
        self.report.steps.push(VendorStep {
            dir: dir.to_path_buf(),
            action,
        });
        let result = match action {
            VendorAction::Tidy => self.toolchain.tidy(dir),
            VendorAction::Vendor(scope) => self.toolchain.vendor(dir, scope),
        };
        if let Err(e) = result {
            warn!("go {} failed in {}: {}", action, dir.display(), e);
            self.report.warnings.push(VendorWarning {
                dir: dir.to_path_buf(),
                action,
                message: e.to_string(),
            });
        }
    }
}

/// Execute Phase 4.
pub fn execute(
    toolchain: &dyn Toolchain,
    manifests: &DiscoveredManifests,
    used_module_dirs: &BTreeSet<PathBuf>,
) -> VendorReport {
    let report = VendorOrchestrator::new(toolchain).run(manifests, used_module_dirs);
    info!(
        "[vendor] {} steps, {} warnings, {} skipped",
        report.steps.len(),
        report.warnings.len(),
        report.skipped.len()
    );
    report
}
