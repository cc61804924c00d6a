//! Default values shared by the CLI, the config file and the library.

/// Name of the staging subdirectory that receives external content.
pub const EXTERNAL_DIR: &str = "_external";

/// Binary used for `tidy` and `vendor` when none is configured.
pub const GO_BINARY: &str = "go";

/// Prefix of the process-private staging directory.
pub const STAGING_PREFIX: &str = "gowork-bundle-";

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "GOWORK_BUNDLE_CONFIG";

/// Environment variable naming the `go` binary.
pub const GO_ENV: &str = "GOWORK_BUNDLE_GO";
