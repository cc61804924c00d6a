//! # Error Handling
//!
//! This module defines the centralized error type for the `gowork-bundle`
//! library. It uses `thiserror` to derive a single `Error` enum whose variants
//! map onto the fatal failure modes of a packaging run.
//!
//! ## Two tiers
//!
//! Everything represented here is **fatal**: returning one of these values
//! from a phase aborts the whole run and the binary exits with a non-zero
//! status. This covers:
//!
//! - Source root validation.
//! - Filesystem errors while copying the tree into staging.
//! - Symlinks that would make the copy recurse forever.
//! - Path algebra that cannot be computed (e.g. unrelated roots).
//! - Manifest parse errors.
//! - Archive creation errors.
//! - Configuration errors.
//!
//! Failures of the external `tidy`/`vendor` tools are **recoverable**. They are
//! still expressed as an [`Error::Toolchain`] value by the toolchain layer, but
//! the vendor phase collects them into a report instead of propagating them.

use std::path::Path;

use thiserror::Error;

/// Main error type for gowork-bundle operations
#[derive(Error, Debug)]
pub enum Error {
    /// The directory handed to the packager cannot be used as an original root.
    #[error("Invalid source root {path}: {message}")]
    SourceRoot { path: String, message: String },

    /// A filesystem operation failed while copying a tree into staging.
    #[error("Copy failed {src} -> {dst}: {message}")]
    Copy {
        src: String,
        dst: String,
        message: String,
    },

    /// A symlink points at the directory being copied or one of its ancestors.
    #[error("Symlink {link} points at {target}, which contains the tree being copied")]
    SymlinkLoop { link: String, target: String },

    /// A path could not be resolved, made absolute, or expressed relative to another.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// A `go.work` or `go.mod` file could not be parsed.
    #[error("Manifest parse error in {path}:{line}: {message}")]
    ManifestParse {
        path: String,
        line: usize,
        message: String,
    },

    /// An external toolchain step (`tidy` or `vendor`) failed.
    #[error("Toolchain step '{step}' failed in {dir}: {message}")]
    Toolchain {
        step: String,
        dir: String,
        message: String,
    },

    /// The bundle archive could not be written.
    #[error("Archive error for {path}: {message}")]
    Archive { path: String, message: String },

    /// The packaging configuration is invalid.
    #[error("Configuration error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A directory traversal error, wrapped from `walkdir::Error`.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A zip writer error, wrapped from `zip::result::ZipError`.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl Error {
    /// Build a [`Error::Copy`] from a source, destination and underlying cause.
    pub fn copy(src: &Path, dst: &Path, cause: impl std::fmt::Display) -> Self {
        Error::Copy {
            src: src.display().to_string(),
            dst: dst.display().to_string(),
            message: cause.to_string(),
        }
    }

    /// Build a [`Error::Path`] from any displayable message.
    pub fn path(message: impl Into<String>) -> Self {
        Error::Path {
            message: message.into(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_display_source_root() {
        let error = Error::SourceRoot {
            path: "/nope".to_string(),
            message: "not a directory".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Invalid source root"));
        assert!(display.contains("/nope"));
        assert!(display.contains("not a directory"));
    }

    #[test]
    fn test_error_copy_constructor() {
        let error = Error::copy(
            &PathBuf::from("/src/a.go"),
            &PathBuf::from("/dst/a.go"),
            "permission denied",
        );
        let display = format!("{}", error);
        assert!(display.contains("Copy failed"));
        assert!(display.contains("/src/a.go -> /dst/a.go"));
        assert!(display.contains("permission denied"));
    }

    #[test]
    fn test_error_display_symlink_loop() {
        let error = Error::SymlinkLoop {
            link: "/root/tree/up".to_string(),
            target: "/root".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("/root/tree/up"));
        assert!(display.contains("contains the tree being copied"));
    }

    #[test]
    fn test_error_display_manifest_parse() {
        let error = Error::ManifestParse {
            path: "ws/go.work".to_string(),
            line: 7,
            message: "unterminated use block".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Manifest parse error in ws/go.work:7"));
        assert!(display.contains("unterminated use block"));
    }

    #[test]
    fn test_error_display_toolchain() {
        let error = Error::Toolchain {
            step: "go mod tidy".to_string(),
            dir: "/stage/mod".to_string(),
            message: "exit status 1".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Toolchain step 'go mod tidy' failed in /stage/mod"));
    }

    #[test]
    fn test_error_display_config_parse_with_hint() {
        let error = Error::ConfigParse {
            message: "external_dir must be a single directory name".to_string(),
            hint: Some("use something like '_external'".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("hint:"));
        assert!(display.contains("_external"));
    }

    #[test]
    fn test_error_path() {
        let error = Error::path("Rel: can't make b relative to a");
        let display = format!("{}", error);
        assert!(display.contains("Path operation error"));
        assert!(display.contains("can't make b relative to a"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML parsing error"));
    }
}
