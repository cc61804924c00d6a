//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Package a Go workspace tree into a relocatable, vendored zip bundle
#[derive(Parser, Debug)]
#[command(name = "gowork-bundle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Set log level (error, warn, info, debug, trace); defaults to RUST_LOG or info
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy, rewrite, vendor and zip a workspace tree
    Pack(commands::pack::PackArgs),

    /// Generate shell completion scripts
    Completions(commands::completions::CompletionsArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.log_level.as_deref(), &self.color)?;

        match self.command {
            Commands::Pack(args) => commands::pack::execute(args, &self.color),
            Commands::Completions(args) => commands::completions::execute(args),
        }
    }
}

fn init_logging(level: Option<&str>, color: &str) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        let filter: log::LevelFilter = level
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid log level '{}'", level))?;
        builder.filter_level(filter);
    }
    builder.write_style(match color.to_lowercase().as_str() {
        "always" => env_logger::WriteStyle::Always,
        "never" => env_logger::WriteStyle::Never,
        _ => env_logger::WriteStyle::Auto,
    });
    builder.format_timestamp(None).init();
    Ok(())
}
