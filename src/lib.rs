//! # asupsort - Diagnostic Bundle Sorter
//!
//! asupsort finds diagnostic "body" bundles in a directory tree, extracts each
//! one, reads the `System Serial Number` line from the bundle's
//! `sysconfig-a.txt`, and copies the extracted content into a folder named
//! `SN <serial> <tag>` under the root directory. Scratch extractions are always
//! removed afterwards.
//!
//! ## Features
//!
//! - **Four archive formats**: zip, tar, gzip-wrapped tar, and 7z
//! - **Failure isolation**: a corrupt or incomplete bundle is logged and skipped,
//!   the rest of the run carries on
//! - **Append-only destinations**: re-running never overwrites earlier output
//! - **Run log**: every step is written to `asup_parse_log.txt` in the root
//!   directory and mirrored to the terminal
//!
//! ## Command Line Usage
//!
//! ```bash
//! # List body files without extracting
//! asupsort scan /cases/1234
//!
//! # Extract and sort (prompts for the directory when omitted)
//! asupsort extract /cases/1234
//! asupsort extract
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use asupsort::config::Config;
//! use asupsort::log::RunLog;
//! use asupsort::pipeline::Pipeline;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> color_eyre::Result<()> {
//!     let config = Config::load()?;
//!     let root = Path::new("/cases/1234");
//!     let log = RunLog::open(&root.join(&config.output.log_file), None)?;
//!
//!     let stats = Pipeline::new(root, &config, &log).run().await?;
//!     for dest in stats.destinations() {
//!         println!("Sorted into {}", dest.display());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! asupsort uses a TOML configuration file located at `~/.config/asupsort/config.toml`,
//! created with defaults on first run. It holds the body file marker and
//! extensions, the metadata file name, the log file name, the scratch directory
//! suffix, and the color theme.
//!
//! ## Module Organization
//!
//! - [`archive`]: Format detection and extraction
//! - [`cleanup`]: Scratch directory removal
//! - [`cli`]: Command-line argument parsing
//! - [`commands`]: `scan` and `extract` handlers
//! - [`config`]: Configuration management
//! - [`error`]: Error kinds
//! - [`log`]: Run log sink
//! - [`metadata`]: Serial number lookup
//! - [`pipeline`]: Per-archive orchestration
//! - [`reorganize`]: Destination folder population
//! - [`scanner`]: Body file discovery
//! - [`tui`]: Terminal output

pub mod archive;
pub mod cleanup;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod log;
pub mod metadata;
pub mod pipeline;
pub mod reorganize;
pub mod scanner;
pub mod tui;

// Re-export commonly used types
pub use config::Config;
pub use error::PipelineError;
pub use pipeline::{Pipeline, RunStats};
pub use scanner::CandidateArchive;
