//! # Go Workspace Bundler Library
//!
//! This library packages a directory tree containing Go workspaces
//! (`go.work`) and modules (`go.mod`) into a self-contained, relocatable zip
//! bundle that builds offline. It backs the `gowork-bundle` command-line tool.
//!
//! ## Quick Example
//!
//! ```
//! use std::path::Path;
//! use gowork_bundle::manifest::{Manifest, ManifestKind};
//! use gowork_bundle::path::{classify, Containment};
//!
//! let work = Manifest::parse(
//!     ManifestKind::Workspace,
//!     "go 1.22\nuse (\n\t./app\n\t../lib\n)\n",
//!     Path::new("go.work"),
//! )
//! .unwrap();
//! assert_eq!(work.uses(), vec!["./app", "../lib"]);
//!
//! assert_eq!(
//!     classify(Path::new("/src/ws/../lib"), Path::new("/src/ws")).unwrap(),
//!     Containment::External
//! );
//! ```
//!
//! ## Core Concepts
//!
//! - **Path algebra (`path`)**: lexical containment checks, relative paths and
//!   the collision-free [`path::UniqueNamer`].
//! - **Tree copy (`copy`)**: recursive copy with normalized permissions and a
//!   symlink policy that keeps the copy relocatable.
//! - **Manifests (`manifest`)**: an immutable parsed form of `go.work` and
//!   `go.mod` with functional rewrites and canonical rendering.
//! - **Toolchain (`toolchain`)**: the `tidy`/`vendor` seam over the `go` binary.
//! - **Archive (`archive`)**: allow-list filtered, reproducible zip output.
//! - **Phases (`phases`)**: the pipeline tying it all together.
//!
//! ## Execution Flow
//!
//! [`phases::orchestrator::execute_pack`] runs:
//!
//! 1.  **Copy**: stage a copy of the original root in a private temp directory.
//! 2.  **Discovery**: find every `go.work` and `go.mod` in the copy.
//! 3.  **Rewrite**: re-express path references against the copy, pulling
//!     anything outside the original root under `_external/`.
//! 4.  **Vendor**: tidy and vendor workspaces and standalone modules. Failures
//!     are reported as warnings.
//! 5.  **Package**: zip the copy into `<name>.zip`.

pub mod archive;
pub mod config;
pub mod copy;
pub mod defaults;
pub mod error;
pub mod manifest;
pub mod output;
pub mod path;
pub mod phases;
pub mod toolchain;

#[cfg(test)]
mod path_proptest;
