//! # Pack Configuration File
//!
//! An optional YAML file carrying the same knobs as the `pack` command line,
//! plus extra archive allow-list entries:
//!
//! ```yaml
//! external_dir: _external
//! keep_staging: false
//! skip_vendor: false
//! go: /usr/local/go/bin/go
//! output_dir: dist
//! archive:
//!   extra_names: [LICENSE]
//!   extra_extensions: [s, proto]
//! ```
//!
//! Every field is optional. Command-line flags take precedence over values
//! from the file; built-in defaults apply when neither sets a value. Unknown
//! keys are rejected so typos do not silently fall back to defaults.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Extra allow-list entries for the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchiveConfig {
    /// Exact file names to include besides the defaults.
    #[serde(default)]
    pub extra_names: Vec<String>,
    /// File extensions to include besides `.go` and `.gotmpl`.
    #[serde(default)]
    pub extra_extensions: Vec<String>,
}

/// Contents of a pack configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackConfig {
    #[serde(default)]
    pub external_dir: Option<String>,
    #[serde(default)]
    pub keep_staging: Option<bool>,
    #[serde(default)]
    pub skip_vendor: Option<bool>,
    /// The `go` binary to run.
    #[serde(default)]
    pub go: Option<String>,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// Parse a YAML string. An empty document yields the default configuration.
pub fn parse(yaml_content: &str) -> Result<PackConfig> {
    if yaml_content.trim().is_empty() {
        return Ok(PackConfig::default());
    }
    let config: PackConfig = serde_yaml::from_str(yaml_content)?;
    if let Some(dir) = &config.external_dir {
        validate_external_dir(dir)?;
    }
    Ok(config)
}

/// Read and parse a configuration file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<PackConfig> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Check that `name` is usable as the external content directory.
///
/// It must be exactly one normal path component so external copies always
/// land directly below the staging root.
pub fn validate_external_dir(name: &str) -> Result<()> {
    let mut components = Path::new(name).components();
    let valid = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if valid {
        Ok(())
    } else {
        Err(Error::ConfigParse {
            message: format!(
                "external_dir must be a single directory name, got '{}'",
                name
            ),
            hint: Some("use a plain name such as '_external'".to_string()),
        })
    }
}
