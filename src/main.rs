//! # gowork-bundle CLI
//!
//! Binary entry point for the `gowork-bundle` command-line tool. It parses
//! arguments with `clap`, sets up logging and dispatches to a command. All
//! packaging logic lives in the `gowork_bundle` library crate.
//!
//! Fatal errors are returned from `main` and exit with status 1; usage errors
//! exit with status 2.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
