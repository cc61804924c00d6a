//! Filtered zip packaging of a staged tree.
//!
//! The archive holds a single top-level folder named after the source
//! directory. Every directory is stored; files are stored only when their name
//! passes an [`AllowList`]. Symlinks are stored as symlink entries whose
//! content is the link target text. Entries are written in sorted order with a
//! fixed timestamp, so identical trees produce identical archives.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{Error, Result};
use crate::path;

const DEFAULT_NAMES: [&str; 4] = ["go.mod", "go.sum", "modules.txt", "go.work"];
const DEFAULT_EXTENSIONS: [&str; 2] = ["go", "gotmpl"];

/// File names and extensions admitted into the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowList {
    names: BTreeSet<String>,
    /// Lowercase, without the leading dot.
    extensions: BTreeSet<String>,
}

impl Default for AllowList {
    fn default() -> Self {
        Self {
            names: DEFAULT_NAMES.iter().map(|n| n.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl AllowList {
    /// The default list extended with extra exact names and extensions.
    ///
    /// Extensions may be given with or without a leading dot and are matched
    /// case-insensitively.
    pub fn with_extra<N, E>(names: N, extensions: E) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut list = Self::default();
        list.names.extend(names.into_iter().map(Into::into));
        list.extensions.extend(
            extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty()),
        );
        list
    }

    /// Whether a file with this base name belongs in the archive.
    pub fn allows(&self, file_name: &str) -> bool {
        if self.names.contains(file_name) {
            return true;
        }
        Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
            .unwrap_or(false)
    }
}

/// What [`archive_dir`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSummary {
    pub path: PathBuf,
    pub directories: usize,
    pub files: usize,
    pub symlinks: usize,
    /// Files left out by the allow-list.
    pub skipped: usize,
}

/// Zip `src_dir` into `dest_zip` with `src_dir`'s name as the top-level folder.
pub fn archive_dir(src_dir: &Path, dest_zip: &Path, allow: &AllowList) -> Result<ArchiveSummary> {
    let archive_error = |message: String| Error::Archive {
        path: dest_zip.display().to_string(),
        message,
    };

    let top = src_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| archive_error(format!("{} has no usable name", src_dir.display())))?
        .to_string();

    if let Some(parent) = dest_zip.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| archive_error(e.to_string()))?;
        }
    }
    let file = fs::File::create(dest_zip).map_err(|e| archive_error(e.to_string()))?;
    let mut zip = ZipWriter::new(file);

    let dir_options = SimpleFileOptions::default().unix_permissions(0o755);
    let file_options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    let link_options = SimpleFileOptions::default().unix_permissions(0o777);

    let mut summary = ArchiveSummary {
        path: dest_zip.to_path_buf(),
        directories: 0,
        files: 0,
        symlinks: 0,
        skipped: 0,
    };

    for entry in WalkDir::new(src_dir).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(|e| archive_error(e.to_string()))?;
        let name = if rel.as_os_str().is_empty() {
            top.clone()
        } else {
            format!("{}/{}", top, path::to_slash(rel))
        };
        let file_type = entry.file_type();

        if file_type.is_dir() {
            zip.add_directory(format!("{}/", name), dir_options)?;
            summary.directories += 1;
            continue;
        }

        let base = entry.file_name().to_string_lossy();
        if !allow.allows(&base) {
            summary.skipped += 1;
            continue;
        }

        if file_type.is_symlink() {
            let target = fs::read_link(entry.path())?;
            debug!("[zip ] link {} -> {}", name, target.display());
            zip.add_symlink(name, path::to_slash(&target), link_options)?;
            summary.symlinks += 1;
        } else if file_type.is_file() {
            debug!("[zip ] file {}", name);
            zip.start_file(name, file_options)?;
            let mut input = fs::File::open(entry.path())?;
            io::copy(&mut input, &mut zip)?;
            summary.files += 1;
        } else {
            summary.skipped += 1;
        }
    }

    zip.finish()?;
    info!(
        "Wrote {} ({} files, {} symlinks, {} directories)",
        dest_zip.display(),
        summary.files,
        summary.symlinks,
        summary.directories
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;
    use zip::ZipArchive;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn entry_names(zip_path: &Path) -> Vec<String> {
        let archive = ZipArchive::new(fs::File::open(zip_path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(String::from).collect();
        names.sort();
        names
    }

    #[test]
    fn test_default_allow_list() {
        let allow = AllowList::default();
        assert!(allow.allows("go.mod"));
        assert!(allow.allows("go.sum"));
        assert!(allow.allows("modules.txt"));
        assert!(allow.allows("go.work"));
        assert!(allow.allows("main.go"));
        assert!(allow.allows("MAIN.GO"));
        assert!(allow.allows("page.gotmpl"));
        assert!(!allow.allows("README.md"));
        assert!(!allow.allows("go.work.sum"));
        assert!(!allow.allows("go"));
    }

    #[test]
    fn test_extra_allow_entries() {
        let allow = AllowList::with_extra(vec!["LICENSE"], vec![".S", "proto"]);
        assert!(allow.allows("LICENSE"));
        assert!(allow.allows("asm_amd64.s"));
        assert!(allow.allows("api.proto"));
        assert!(allow.allows("main.go"));
        assert!(!allow.allows("README.md"));
    }

    #[test]
    fn test_archive_filters_files_and_keeps_directories() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("bundle");
        write(&src.join("go.work"), "go 1.22\n");
        write(&src.join("app/main.go"), "package main\n");
        write(&src.join("app/README.md"), "# app\n");
        write(&src.join("app/vendor/modules.txt"), "# example.com/x\n");
        fs::create_dir_all(src.join("docs")).unwrap();

        let dest = temp.path().join("out/bundle.zip");
        let summary = archive_dir(&src, &dest, &AllowList::default()).unwrap();

        assert_eq!(
            entry_names(&dest),
            vec![
                "bundle/",
                "bundle/app/",
                "bundle/app/main.go",
                "bundle/app/vendor/",
                "bundle/app/vendor/modules.txt",
                "bundle/docs/",
                "bundle/go.work",
            ]
        );
        assert_eq!(summary.files, 3);
        assert_eq!(summary.directories, 4);
        assert_eq!(summary.skipped, 1);

        let mut archive = ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
        let mut content = String::new();
        archive
            .by_name("bundle/app/main.go")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "package main\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_archive_stores_symlinks_as_links() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("bundle");
        write(&src.join("shared/util.go"), "package shared\n");
        std::os::unix::fs::symlink("shared/util.go", src.join("alias.go")).unwrap();

        let dest = temp.path().join("bundle.zip");
        let summary = archive_dir(&src, &dest, &AllowList::default()).unwrap();
        assert_eq!(summary.symlinks, 1);

        let mut archive = ZipArchive::new(fs::File::open(&dest).unwrap()).unwrap();
        let mut link = archive.by_name("bundle/alias.go").unwrap();
        let mode = link.unix_mode().unwrap();
        assert_eq!(mode & 0o170000, 0o120000);
        let mut target = String::new();
        link.read_to_string(&mut target).unwrap();
        assert_eq!(target, "shared/util.go");
    }

    #[test]
    fn test_archive_is_reproducible() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("bundle");
        write(&src.join("b.go"), "package b\n");
        write(&src.join("a/a.go"), "package a\n");

        let first = temp.path().join("first.zip");
        let second = temp.path().join("second.zip");
        archive_dir(&src, &first, &AllowList::default()).unwrap();
        archive_dir(&src, &second, &AllowList::default()).unwrap();

        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }
}
