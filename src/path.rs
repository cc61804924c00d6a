//! Path algebra for relocating references between the original root, the
//! staging root and the external base.
//!
//! Everything here except [`UniqueNamer`] is purely lexical: paths are made
//! absolute against the current directory and cleaned, but never checked for
//! existence.

use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Where a reference points relative to a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Containment {
    /// The path is the root itself or lies below it.
    Internal,
    /// The path lies outside the root (including on another drive).
    External,
}

/// Lexically normalize a path, like Go's `filepath.Clean`.
///
/// Removes `.` components, folds `name/..` pairs and drops `..` directly below
/// the filesystem root. A relative path that cleans to nothing becomes `.`.
pub fn clean(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        PathBuf::from(".")
    } else {
        out.iter().collect()
    }
}

/// Make `path` absolute against the current directory and clean it.
pub fn absolute(path: &Path) -> Result<PathBuf> {
    let abs = std::path::absolute(path)
        .map_err(|e| Error::path(format!("cannot make {} absolute: {}", path.display(), e)))?;
    Ok(clean(&abs))
}

/// Split a cleaned path into its anchor (prefix and root) and the rest.
fn split_anchor(path: &Path) -> (Vec<Component<'_>>, Vec<Component<'_>>) {
    let (anchor, rest): (Vec<_>, Vec<_>) = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .partition(|c| matches!(c, Component::Prefix(_) | Component::RootDir));
    (anchor, rest)
}

/// Compute `target` relative to `base`, like Go's `filepath.Rel`.
///
/// Both paths must be of the same kind (both absolute or both relative) and
/// share the same anchor. Returns `.` when they are equal.
pub fn relative(base: &Path, target: &Path) -> Result<PathBuf> {
    let base = clean(base);
    let target = clean(target);

    if base.is_absolute() != target.is_absolute() {
        return Err(Error::path(format!(
            "cannot make {} relative to {}: mixed absolute and relative paths",
            target.display(),
            base.display()
        )));
    }

    let (base_anchor, base_rest) = split_anchor(&base);
    let (target_anchor, target_rest) = split_anchor(&target);
    if base_anchor != target_anchor {
        return Err(Error::path(format!(
            "cannot make {} relative to {}: different filesystem roots",
            target.display(),
            base.display()
        )));
    }

    let common = base_rest
        .iter()
        .zip(target_rest.iter())
        .take_while(|(b, t)| b == t)
        .count();

    if base_rest[common..]
        .iter()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(Error::path(format!(
            "cannot make {} relative to {}",
            target.display(),
            base.display()
        )));
    }

    let mut rel = PathBuf::new();
    for _ in common..base_rest.len() {
        rel.push("..");
    }
    for component in &target_rest[common..] {
        rel.push(component.as_os_str());
    }

    if rel.as_os_str().is_empty() {
        Ok(PathBuf::from("."))
    } else {
        Ok(rel)
    }
}

fn starts_with_parent(rel: &Path) -> bool {
    matches!(rel.components().next(), Some(Component::ParentDir))
}

/// Decide whether `candidate` lies inside `root`.
///
/// Both are made absolute and cleaned first. A candidate on a different
/// filesystem root than `root` is external. Failure to absolutize either path
/// is returned to the caller.
pub fn classify(candidate: &Path, root: &Path) -> Result<Containment> {
    let candidate = absolute(candidate)?;
    let root = absolute(root)?;

    if split_anchor(&candidate).0 != split_anchor(&root).0 {
        return Ok(Containment::External);
    }

    let rel = relative(&root, &candidate)?;
    if starts_with_parent(&rel) {
        Ok(Containment::External)
    } else {
        Ok(Containment::Internal)
    }
}

/// Shorthand for `classify(path, root)? == Containment::Internal`.
pub fn is_within(path: &Path, root: &Path) -> Result<bool> {
    Ok(classify(path, root)? == Containment::Internal)
}

/// Whether `dir` equals, or is nested under, any directory in `dirs`.
pub fn is_under_any<'a, I>(dir: &Path, dirs: I) -> bool
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    let dir = clean(dir);
    dirs.into_iter().any(|used| {
        let used = clean(used);
        if dir == used {
            return true;
        }
        match relative(&used, &dir) {
            Ok(rel) => rel != Path::new(".") && !starts_with_parent(&rel),
            Err(_) => false,
        }
    })
}

/// Resolve a manifest path token against the directory it is relative to.
pub fn resolve_token(token: &str, base_dir: &Path) -> PathBuf {
    let token_path = Path::new(token);
    if token_path.is_absolute() {
        clean(token_path)
    } else {
        clean(&base_dir.join(token_path))
    }
}

/// Render a path with forward slashes.
pub fn to_slash(path: &Path) -> String {
    let text = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        text.into_owned()
    } else {
        text.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// Render a relative path as a manifest token.
///
/// The toolchain only treats a versionless replacement as a directory when it
/// is rooted or starts with `./` or `../`, so bare relative names get a `./`
/// prefix.
pub fn manifest_token(rel: &Path) -> String {
    let slashed = to_slash(rel);
    if rel.is_absolute() || slashed == "." || slashed == ".." || slashed.starts_with("../") {
        slashed
    } else if slashed.starts_with("./") {
        slashed
    } else {
        format!("./{}", slashed)
    }
}

/// Hands out collision-free destination directories.
///
/// [`UniqueNamer::reserve`] probes the filesystem and never creates anything,
/// so the check is not atomic: it is only safe while a single writer owns the
/// directory being populated. Paths issued by one namer are remembered and
/// never issued again, even if the caller has not created them yet.
#[derive(Debug, Default)]
pub struct UniqueNamer {
    issued: HashSet<PathBuf>,
}

impl UniqueNamer {
    /// Create a namer with no issued paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `base`, or the first of `base-1`, `base-2`, ... that is free.
    pub fn reserve(&mut self, base: &Path) -> PathBuf {
        let mut candidate = base.to_path_buf();
        let mut index = 1usize;
        loop {
            if !self.issued.contains(&candidate) && is_vacant(&candidate) {
                self.issued.insert(candidate.clone());
                return candidate;
            }
            candidate = with_suffix(base, index);
            index += 1;
        }
    }
}

fn with_suffix(base: &Path, index: usize) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!("-{}", index));
    PathBuf::from(name)
}

// A dangling symlink occupies the name even though `exists()` says otherwise.
fn is_vacant(path: &Path) -> bool {
    matches!(fs::symlink_metadata(path), Err(e) if e.kind() == ErrorKind::NotFound)
}
