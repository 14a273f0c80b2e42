//! Command-line interface

pub mod commands;
pub mod output;
pub mod terminal_output;

use clap::{Parser, Subcommand};
use commands::{RunCommand, ValidateCommand};
use std::ffi::OsString;

/// Provision cloud managed identities with a sequential step pipeline
#[derive(Debug, Parser, Clone)]
#[command(name = "provisioner")]
#[command(author = "Provisioner Contributors")]
#[command(version = "0.1.0")]
#[command(about = "A sequential provisioning step engine for cloud managed identities", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the provisioning pipeline
    Run(RunCommand),

    /// Validate a provisioning configuration
    Validate(ValidateCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
