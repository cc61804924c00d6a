//! Pack command implementation
//!
//! Runs the full 5-phase pipeline against one directory:
//! 1. Copy into a private staging directory
//! 2. Discover manifests
//! 3. Rewrite path references
//! 4. Tidy and vendor (unless `--skip-vendor`)
//! 5. Zip the result
//!
//! Settings come from command-line flags first, then the optional config
//! file, then built-in defaults.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use gowork_bundle::archive::AllowList;
use gowork_bundle::config::{self, PackConfig};
use gowork_bundle::defaults;
use gowork_bundle::output::{Marker, OutputConfig};
use gowork_bundle::path;
use gowork_bundle::phases::orchestrator::{self, PackOptions, PackOutcome};
use gowork_bundle::toolchain::GoToolchain;

/// Arguments for the pack command
#[derive(Args, Debug)]
pub struct PackArgs {
    /// Directory tree to package
    #[arg(value_name = "DIR")]
    pub dir: PathBuf,

    /// Directory to write the archive to (defaults to current directory)
    #[arg(short, long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Path to a YAML config file
    #[arg(short, long, value_name = "PATH", env = defaults::CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Leave the staging directory on disk and print its location
    #[arg(long)]
    pub keep_staging: bool,

    /// Skip the tidy and vendor steps
    #[arg(long)]
    pub skip_vendor: bool,

    /// The go binary to run for tidy and vendor
    #[arg(long, value_name = "BIN", env = defaults::GO_ENV)]
    pub go: Option<String>,

    /// Name of the staging directory that receives external modules
    #[arg(long, value_name = "NAME")]
    pub external_dir: Option<String>,
}

/// Execute the pack command
pub fn execute(args: PackArgs, color_flag: &str) -> Result<()> {
    let out = OutputConfig::from_env_and_flag(color_flag);

    let file_config = match &args.config {
        Some(path) => config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PackConfig::default(),
    };

    let go = args
        .go
        .clone()
        .or_else(|| file_config.go.clone())
        .unwrap_or_else(|| defaults::GO_BINARY.to_string());
    let options = resolve_options(&args, file_config)?;
    let toolchain = GoToolchain::new(go);

    let outcome = orchestrator::execute_pack(&args.dir, &options, &toolchain)
        .with_context(|| format!("Failed to package {}", args.dir.display()))?;

    print_summary(&out, &outcome);
    Ok(())
}

/// Merge flags over the config file over defaults.
fn resolve_options(args: &PackArgs, file_config: PackConfig) -> Result<PackOptions> {
    let external_dir = args
        .external_dir
        .clone()
        .or(file_config.external_dir)
        .unwrap_or_else(|| defaults::EXTERNAL_DIR.to_string());
    config::validate_external_dir(&external_dir)?;

    let output_dir = match args.output_dir.clone().or(file_config.output_dir) {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    Ok(PackOptions {
        external_dir,
        output_dir,
        keep_staging: args.keep_staging || file_config.keep_staging.unwrap_or(false),
        skip_vendor: args.skip_vendor || file_config.skip_vendor.unwrap_or(false),
        allow: AllowList::with_extra(
            file_config.archive.extra_names,
            file_config.archive.extra_extensions,
        ),
    })
}

fn print_summary(out: &OutputConfig, outcome: &PackOutcome) {
    let staging_root = &outcome.layout.staging_root;

    for copy in &outcome.rewrite.external_copies {
        let shown = copy
            .destination
            .strip_prefix(staging_root)
            .unwrap_or(&copy.destination);
        println!(
            "{} {} -> {}",
            out.marker(Marker::Copied),
            copy.source.display(),
            path::to_slash(shown)
        );
    }

    match &outcome.vendor {
        None => println!("{} vendoring skipped", out.marker(Marker::Skipped)),
        Some(report) => {
            for warning in &report.warnings {
                println!(
                    "{} go {} failed in {}: {}",
                    out.marker(Marker::Warning),
                    warning.action,
                    warning.dir.display(),
                    warning.message
                );
            }
        }
    }

    if let Some(kept) = &outcome.kept_staging {
        println!(
            "{} staging directory kept at {}",
            out.marker(Marker::Kept),
            out.emphasis(&kept.display().to_string())
        );
    }

    println!(
        "{} Packaged {} ({} files, {} symlinks)",
        out.marker(Marker::Done),
        out.emphasis(&outcome.archive.path.display().to_string()),
        outcome.archive.files,
        outcome.archive.symlinks
    );
}
