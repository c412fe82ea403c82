//! Command-line interface definitions.
//!
//! This module defines the CLI structure using clap, including all commands
//! and their arguments.

use crate::tui::BANNER;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "asupsort")]
#[command(about = "Extract diagnostic body bundles and sort them by system serial number")]
#[command(before_help = BANNER)]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Use this config file instead of ~/.config/asupsort/config.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Only write the log file, do not mirror records to the terminal
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Wait for Enter before exiting
    #[arg(long, global = true)]
    pub pause: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the body files under a directory without extracting them
    Scan {
        /// Directory to search (prompted for when omitted)
        root: Option<PathBuf>,
    },
    /// Extract every body file and file it under "SN <serial> <tag>"
    Extract {
        /// Directory to search (prompted for when omitted)
        root: Option<PathBuf>,
    },
}
