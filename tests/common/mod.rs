//! Shared test utilities for integration and E2E tests.
//!
//! Add `mod common;` to a test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_file("ws/go.work", workspaces::SINGLE_USE);
//!     fixture.command().arg("pack").arg("ws").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use gowork_bundle::error::{Error, Result};
use gowork_bundle::toolchain::{Toolchain, VendorScope};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::{configs, workspaces, zip_entries, zip_text, RecordingToolchain, TestFixture};
}

/// Manifest snippets used across tests.
#[allow(dead_code)]
pub mod workspaces {
    /// Workspace with one internal module.
    pub const SINGLE_USE: &str = "go 1.22\n\nuse ./app\n";

    /// Module manifest for `app`.
    pub const APP_MOD: &str = "module example.com/app\n\ngo 1.22\n";

    /// Source file for `app`.
    pub const APP_MAIN: &str = "package main\n\nfunc main() {}\n";
}

/// Config file snippets.
#[allow(dead_code)]
pub mod configs {
    /// Skip vendoring and pick a custom external directory.
    pub const SKIP_VENDOR: &str = "skip_vendor: true\nexternal_dir: _deps\n";

    /// Include READMEs in the archive.
    pub const WITH_README: &str = "skip_vendor: true\narchive:\n  extra_names: [README.md]\n";

    /// Rejected: nested external directory.
    pub const NESTED_EXTERNAL: &str = "external_dir: a/b\n";

    /// Rejected: unknown key.
    pub const UNKNOWN_KEY: &str = "skip_vendr: true\n";
}

/// A temporary directory populated with test files.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Add an empty directory.
    pub fn with_dir(self, path: &str) -> Self {
        self.temp_dir
            .child(path)
            .create_dir_all()
            .expect("Failed to create directory");
        self
    }

    /// Add a symlink at `path` pointing at `target` (written verbatim).
    #[cfg(unix)]
    pub fn with_symlink(self, path: &str, target: &str) -> Self {
        let link = self.temp_dir.child(path);
        if let Some(parent) = link.path().parent() {
            fs::create_dir_all(parent).expect("Failed to create link parent");
        }
        std::os::unix::fs::symlink(target, link.path()).expect("Failed to create symlink");
        self
    }

    /// `ws/` with a workspace using `./app`, plus the `app` module.
    pub fn with_simple_workspace(self) -> Self {
        self.with_file("ws/go.work", workspaces::SINGLE_USE)
            .with_file("ws/app/go.mod", workspaces::APP_MOD)
            .with_file("ws/app/main.go", workspaces::APP_MAIN)
            .with_file("ws/app/README.md", "# app\n")
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute, canonical path of a child.
    pub fn canonical(&self, path: &str) -> PathBuf {
        dunce::canonicalize(self.path().join(path)).expect("Failed to canonicalize")
    }

    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    pub fn read(&self, path: &str) -> String {
        fs::read_to_string(self.path().join(path)).expect("Failed to read file")
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("gowork-bundle");
        cmd.current_dir(self.path())
            .env_remove("GOWORK_BUNDLE_CONFIG")
            .env_remove("GOWORK_BUNDLE_GO")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorted entry names of a zip archive.
#[allow(dead_code)]
pub fn zip_entries(path: &Path) -> Vec<String> {
    let file = fs::File::open(path).expect("Failed to open archive");
    let archive = zip::ZipArchive::new(file).expect("Failed to read archive");
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

/// Text content of one archive entry.
#[allow(dead_code)]
pub fn zip_text(path: &Path, entry: &str) -> String {
    use std::io::Read;

    let file = fs::File::open(path).expect("Failed to open archive");
    let mut archive = zip::ZipArchive::new(file).expect("Failed to read archive");
    let mut content = String::new();
    archive
        .by_name(entry)
        .expect("Missing archive entry")
        .read_to_string(&mut content)
        .expect("Failed to read entry");
    content
}

/// A [`Toolchain`] that records calls instead of running `go`.
///
/// Directories whose final component is listed in `failing` report an error.
#[derive(Default)]
pub struct RecordingToolchain {
    calls: Mutex<Vec<String>>,
    failing: Vec<String>,
}

#[allow(dead_code)]
impl RecordingToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_in(names: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    /// Calls as `"<step> <dir name>"` strings, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, dir: &Path, step: &str) -> Result<()> {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.calls.lock().unwrap().push(format!("{} {}", step, name));
        if self.failing.contains(&name) {
            return Err(Error::Toolchain {
                step: format!("go {}", step),
                dir: dir.display().to_string(),
                message: "simulated failure".to_string(),
            });
        }
        // Leave a trace the archive can pick up, like a real vendor run.
        if step.ends_with("vendor") {
            let vendor = dir.join("vendor");
            fs::create_dir_all(&vendor).expect("Failed to create vendor dir");
            fs::write(vendor.join("modules.txt"), "# vendored\n").expect("Failed to write");
        }
        Ok(())
    }
}

impl Toolchain for RecordingToolchain {
    fn tidy(&self, dir: &Path) -> Result<()> {
        self.record(dir, "mod tidy")
    }

    fn vendor(&self, dir: &Path, scope: VendorScope) -> Result<()> {
        self.record(dir, &scope.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_creates_temp_dir() {
        let fixture = TestFixture::new();
        assert!(fixture.path().exists());
    }

    #[test]
    fn test_fixture_with_simple_workspace() {
        let fixture = TestFixture::new().with_simple_workspace();
        assert!(fixture.path().join("ws/go.work").exists());
        assert!(fixture.path().join("ws/app/go.mod").exists());
    }

    #[test]
    fn test_configs_are_valid_yaml() {
        for config in [configs::SKIP_VENDOR, configs::WITH_README] {
            assert!(gowork_bundle::config::parse(config).is_ok());
        }
    }
}
