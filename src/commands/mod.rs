//! # CLI Command Implementations
//!
//! Each subcommand of the `gowork-bundle` tool lives in its own file with:
//! - An `Args` struct that defines the command-specific arguments and options,
//!   derived using `clap`.
//! - An `execute` function that takes the parsed `Args` and calls into the
//!   `gowork_bundle` library.

pub mod completions;
pub mod pack;
