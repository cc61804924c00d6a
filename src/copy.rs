//! # Tree Copier
//!
//! Copies a directory tree into a new location with normalized permissions:
//! directories are created `0o755` and files `0o644` on Unix, whatever the
//! source modes were. The source tree is only ever read.
//!
//! ## Symlink policy
//!
//! A symlink's target is resolved against the link's own directory and then
//! classified against the root being copied:
//!
//! - **Inside the root**: a new symlink is created at the mirrored location,
//!   pointing at the mirrored target through a relative path. The copy stays
//!   relocatable.
//! - **Outside the root**: the link is dereferenced. A file target is copied
//!   as a regular file; a directory target is copied recursively with this
//!   same algorithm.
//!
//! A dereferenced directory that contains a tree already being copied would
//! recurse forever, so it is rejected with [`Error::SymlinkLoop`]. The
//! destination itself is never walked, even when it lies inside a tree being
//! copied.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::path::{self, Containment};

#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Counters describing what a copy did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopyStats {
    pub files: usize,
    pub dirs: usize,
    /// Internal symlinks recreated in the destination.
    pub links_recreated: usize,
    /// External symlinks replaced by a copy of their target.
    pub links_dereferenced: usize,
}

impl CopyStats {
    fn absorb(&mut self, other: CopyStats) {
        self.files += other.files;
        self.dirs += other.dirs;
        self.links_recreated += other.links_recreated;
        self.links_dereferenced += other.links_dereferenced;
    }
}

/// Copy `src_root` into `dst_root`, creating `dst_root` if needed.
///
/// `dst_root` may lie inside `src_root` (for example a temporary directory
/// under the tree being copied); the walk never descends into it.
///
/// Any failure aborts the whole copy; a partially written destination is
/// left behind for the caller to discard.
pub fn copy_tree(src_root: &Path, dst_root: &Path) -> Result<CopyStats> {
    ensure_source_dir(src_root, dst_root)?;
    create_dir(src_root, dst_root)?;
    let output =
        dunce::canonicalize(dst_root).map_err(|e| Error::copy(src_root, dst_root, e))?;

    let mut state = CopyState {
        active: Vec::new(),
        output,
    };
    copy_nested(src_root, dst_root, &mut state)
}

/// Shared by a copy and every dereferenced directory copied under it.
struct CopyState {
    /// Canonical roots of every copy currently in progress.
    active: Vec<PathBuf>,
    /// Canonical destination of the outermost copy.
    output: PathBuf,
}

fn ensure_source_dir(src_root: &Path, dst_root: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(src_root).map_err(|e| Error::copy(src_root, dst_root, e))?;
    if !meta.is_dir() {
        return Err(Error::copy(src_root, dst_root, "source is not a directory"));
    }
    Ok(())
}

fn copy_nested(src_root: &Path, dst_root: &Path, state: &mut CopyState) -> Result<CopyStats> {
    ensure_source_dir(src_root, dst_root)?;

    let src_root = path::absolute(src_root)?;
    let dst_root = path::absolute(dst_root)?;
    let canonical =
        dunce::canonicalize(&src_root).map_err(|e| Error::copy(&src_root, &dst_root, e))?;

    state.active.push(canonical.clone());
    let result = walk(&src_root, &canonical, &dst_root, state);
    state.active.pop();
    result
}

fn walk(
    src_root: &Path,
    canonical_src: &Path,
    dst_root: &Path,
    state: &mut CopyState,
) -> Result<CopyStats> {
    let mut stats = CopyStats::default();
    create_dir(src_root, dst_root)?;

    // The output directory as the walker would spell it, if it is inside.
    let output_entry = match path::classify(&state.output, canonical_src)? {
        Containment::Internal => Some(src_root.join(path::relative(canonical_src, &state.output)?)),
        Containment::External => None,
    };

    let entries = WalkDir::new(src_root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let is_output = output_entry.as_deref() == Some(entry.path());
            if is_output {
                debug!("Skipping copy destination {}", entry.path().display());
            }
            !is_output
        });

    for entry in entries {
        let entry = entry?;
        let src = entry.path();
        let rel = src
            .strip_prefix(src_root)
            .map_err(|e| Error::copy(src, dst_root, e))?;
        let dst = dst_root.join(rel);
        let file_type = entry.file_type();

        if file_type.is_symlink() {
            copy_link(src_root, dst_root, src, &dst, state, &mut stats)?;
        } else if file_type.is_dir() {
            create_dir(src, &dst)?;
            stats.dirs += 1;
        } else if file_type.is_file() {
            debug!("[file] {} -> {}", src.display(), dst.display());
            copy_file(src, &dst)?;
            stats.files += 1;
        } else {
            debug!("Skipping special file {}", src.display());
        }
    }

    Ok(stats)
}

fn copy_link(
    src_root: &Path,
    dst_root: &Path,
    link: &Path,
    dst: &Path,
    state: &mut CopyState,
    stats: &mut CopyStats,
) -> Result<()> {
    let raw_target = fs::read_link(link).map_err(|e| Error::copy(link, dst, e))?;
    let link_dir = link.parent().unwrap_or(src_root);
    let target = path::clean(&link_dir.join(&raw_target));

    match path::classify(&target, src_root)? {
        Containment::Internal => {
            let mirrored = dst_root.join(path::relative(src_root, &target)?);
            let dst_dir = dst.parent().unwrap_or(dst_root);
            let new_target = path::relative(dst_dir, &mirrored)?;

            create_dir(link_dir, dst_dir)?;
            make_symlink(&new_target, &target, dst).map_err(|e| Error::copy(link, dst, e))?;
            debug!(
                "[link] {} -> {} (inside tree)",
                dst.display(),
                new_target.display()
            );
            stats.links_recreated += 1;
        }
        Containment::External => {
            let meta = fs::metadata(&target).map_err(|e| Error::copy(&target, dst, e))?;
            if meta.is_dir() {
                let canonical =
                    dunce::canonicalize(&target).map_err(|e| Error::copy(&target, dst, e))?;
                let loops = state
                    .active
                    .iter()
                    .any(|root| matches!(path::classify(root, &canonical), Ok(Containment::Internal)));
                if loops {
                    return Err(Error::SymlinkLoop {
                        link: link.display().to_string(),
                        target: target.display().to_string(),
                    });
                }
                debug!(
                    "[link] copying directory {} for {} (outside tree)",
                    target.display(),
                    link.display()
                );
                stats.absorb(copy_nested(&target, dst, state)?);
            } else {
                debug!(
                    "[link] copying file {} for {} (outside tree)",
                    target.display(),
                    link.display()
                );
                copy_file(&target, dst)?;
            }
            stats.links_dereferenced += 1;
        }
    }

    Ok(())
}

fn create_dir(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst).map_err(|e| Error::copy(src, dst, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dst, fs::Permissions::from_mode(DIR_MODE))
            .map_err(|e| Error::copy(src, dst, e))?;
    }
    Ok(())
}

fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::copy(src, dst, e))?;
    }

    let mut input = fs::File::open(src).map_err(|e| Error::copy(src, dst, e))?;
    let mut output = fs::File::create(dst).map_err(|e| Error::copy(src, dst, e))?;
    io::copy(&mut input, &mut output).map_err(|e| Error::copy(src, dst, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dst, fs::Permissions::from_mode(FILE_MODE))
            .map_err(|e| Error::copy(src, dst, e))?;
    }
    Ok(())
}

#[cfg(unix)]
fn make_symlink(new_target: &Path, _resolved: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(new_target, link)
}

#[cfg(windows)]
fn make_symlink(new_target: &Path, resolved: &Path, link: &Path) -> io::Result<()> {
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(new_target, link)
    } else {
        std::os::windows::fs::symlink_file(new_target, link)
    }
}
