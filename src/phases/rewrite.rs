//! Phase 3: Manifest Reference Rewriting
//!
//! Every path-valued reference in a staged manifest was written relative to
//! the manifest's *original* directory. After the copy those references either
//! still point at the original tree or no longer resolve at all. This phase
//! re-expresses each one relative to the manifest's *staging* directory:
//!
//! - An internal reference (inside the original root) is pointed at the
//!   mirrored location in the staging copy.
//! - An external reference is copied under the external base, with a
//!   collision-free name, and pointed at the copy.
//!
//! Workspace manifests are handled before module manifests because their
//! `use` entries decide which module directories the vendor phase treats as
//! covered by a workspace.
//!
//! Only `use` entries and versionless `replace` targets are touched. A
//! replacement with a version on its new side names a registry module and is
//! kept as written, in its original position.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::discovery::DiscoveredManifests;
use super::Layout;
use crate::copy::copy_tree;
use crate::error::{Error, Result};
use crate::manifest::{Manifest, Replacement};
use crate::path::{self, Containment, UniqueNamer};

/// External content pulled into the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCopy {
    /// Absolute path outside the original root.
    pub source: PathBuf,
    /// Directory under the external base holding the copy.
    pub destination: PathBuf,
}

/// Everything the rewrite phase changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Staging directories named by `use` entries, after rewriting.
    pub used_module_dirs: BTreeSet<PathBuf>,
    pub external_copies: Vec<ExternalCopy>,
    /// Manifest files written back to the staging copy.
    pub rewritten: Vec<PathBuf>,
}

/// A reference re-expressed for its staged manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Relocated {
    token: String,
    /// Slash-separated relative path, without the `./` prefix.
    bare: String,
    /// Absolute staging location the token resolves to.
    target: PathBuf,
}

/// Rewrites manifests inside one staging copy.
pub struct ManifestReferenceRewriter<'a> {
    layout: &'a Layout,
    namer: UniqueNamer,
    report: RewriteReport,
}

impl<'a> ManifestReferenceRewriter<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self {
            layout,
            namer: UniqueNamer::new(),
            report: RewriteReport::default(),
        }
    }

    /// Rewrite a staged `go.work` into canonical form.
    ///
    /// `use` entries are relocated, deduplicated and sorted; path-based
    /// replacements are relocated in place. The file is always written back.
    pub fn rewrite_workspace(&mut self, manifest_path: &Path) -> Result<()> {
        let manifest = Manifest::from_file(manifest_path)?;
        let staged_dir = parent_dir(manifest_path)?;

        let mut uses = BTreeSet::new();
        for token in manifest.uses() {
            let relocated = self.relocate(&token, &staged_dir)?;
            let written = path::to_slash(Path::new(&token));
            let keep_original = !Path::new(&token).is_absolute()
                && (written == relocated.token || written == relocated.bare || token == ".");
            let final_token = if keep_original {
                written
            } else {
                debug!(
                    "[work] {}: use {:?} -> {:?}",
                    manifest_path.display(),
                    token,
                    relocated.token
                );
                relocated.token
            };
            self.report.used_module_dirs.insert(relocated.target);
            uses.insert(final_token);
        }

        let mut replacements = Vec::new();
        for replacement in manifest.replacements() {
            replacements.push(self.relocate_replacement(&replacement, &staged_dir, manifest_path)?);
        }

        let uses: Vec<String> = uses.into_iter().collect();
        let rewritten = manifest.to_canonical_workspace(&uses, &replacements);
        fs::write(manifest_path, rewritten.render())?;
        self.report.rewritten.push(manifest_path.to_path_buf());
        Ok(())
    }

    /// Rewrite path-based replacements of a staged `go.mod`.
    ///
    /// The file is written back only if a replacement changed.
    pub fn rewrite_module(&mut self, manifest_path: &Path) -> Result<()> {
        let manifest = Manifest::from_file(manifest_path)?;
        let staged_dir = parent_dir(manifest_path)?;

        let rewritten = manifest
            .map_replacements(|r| self.relocate_replacement(r, &staged_dir, manifest_path))?;

        if rewritten != manifest {
            fs::write(manifest_path, rewritten.render())?;
            self.report.rewritten.push(manifest_path.to_path_buf());
        } else {
            debug!("[mod ] {}: unchanged", manifest_path.display());
        }
        Ok(())
    }

    pub fn finish(self) -> RewriteReport {
        self.report
    }

    fn relocate_replacement(
        &mut self,
        replacement: &Replacement,
        staged_dir: &Path,
        manifest_path: &Path,
    ) -> Result<Replacement> {
        if !replacement.is_path_based() {
            return Ok(replacement.clone());
        }
        let relocated = self.relocate(&replacement.new.path, staged_dir)?;
        debug!(
            "[repl] {}: {} => {:?}",
            manifest_path.display(),
            replacement.old.path,
            relocated.token
        );
        Ok(replacement.with_new_path(relocated.token))
    }

    /// Re-express `token`, written in a manifest now staged in `staged_dir`.
    fn relocate(&mut self, token: &str, staged_dir: &Path) -> Result<Relocated> {
        let original_dir = self.layout.to_original(staged_dir)?;
        let resolved = path::resolve_token(token, &original_dir);

        let target = match self.classify(&resolved)? {
            (Containment::Internal, effective) => self.layout.to_staging(&effective)?,
            (Containment::External, effective) => self.pull_external(&effective)?,
        };

        let rel = path::relative(staged_dir, &target)?;
        Ok(Relocated {
            token: path::manifest_token(&rel),
            bare: path::to_slash(&rel),
            target,
        })
    }

    /// Classify against the original root, retrying with the canonical path
    /// when the lexical answer is external but the path exists.
    fn classify(&self, resolved: &Path) -> Result<(Containment, PathBuf)> {
        let root = &self.layout.original_root;
        let lexical = path::classify(resolved, root)?;
        if lexical == Containment::Internal {
            return Ok((lexical, resolved.to_path_buf()));
        }
        match dunce::canonicalize(resolved) {
            Ok(canonical) => Ok((path::classify(&canonical, root)?, canonical)),
            Err(_) => Ok((lexical, resolved.to_path_buf())),
        }
    }

    fn pull_external(&mut self, source: &Path) -> Result<PathBuf> {
        let name = source
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "root".into());
        let base = &self.layout.external_base;
        fs::create_dir_all(base).map_err(|e| Error::copy(source, base, e))?;

        let destination = self.namer.reserve(&base.join(name));
        info!(
            "[ext ] copying {} -> {}",
            source.display(),
            destination.display()
        );
        copy_tree(source, &destination)?;

        self.report.external_copies.push(ExternalCopy {
            source: source.to_path_buf(),
            destination: destination.clone(),
        });
        Ok(destination)
    }
}

fn parent_dir(manifest_path: &Path) -> Result<PathBuf> {
    manifest_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::path(format!("{} has no parent directory", manifest_path.display())))
}

/// Execute Phase 3: rewrite all workspace manifests, then all module manifests.
pub fn execute(layout: &Layout, manifests: &DiscoveredManifests) -> Result<RewriteReport> {
    let mut rewriter = ManifestReferenceRewriter::new(layout);
    for workspace in &manifests.workspaces {
        rewriter.rewrite_workspace(workspace)?;
    }
    for module in &manifests.modules {
        rewriter.rewrite_module(module)?;
    }

    let report = rewriter.finish();
    info!(
        "[rewrite] {} manifests rewritten, {} external copies, {} used module dirs",
        report.rewritten.len(),
        report.external_copies.len(),
        report.used_module_dirs.len()
    );
    Ok(report)
}
