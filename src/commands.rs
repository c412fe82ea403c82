//! Command handlers.
//!
//! `scan` lists the body files under a directory; `extract` runs the full
//! pipeline with a [`RunLog`] writing into the root directory.

use color_eyre::eyre::{Result, eyre};
use dialoguer::Input;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::log::RunLog;
use crate::pipeline::Pipeline;
use crate::scanner::discover;
use crate::tui::{Mode, UI, format_size};

/// Asks for the directory to search.
///
/// Surrounding quotes are stripped, since pasted or dragged Windows paths carry them.
pub fn prompt_root(theme: &str) -> Result<PathBuf> {
    let colorful_theme = UI::get_colorful_theme(theme);
    let input: String = Input::with_theme(&colorful_theme)
        .with_prompt("Enter the directory to search")
        .interact_text()?;

    Ok(PathBuf::from(input.trim().trim_matches('"')))
}

fn validate_root(root: &Path) -> Result<PathBuf> {
    if !root.is_dir() {
        return Err(eyre!("Directory does not exist: {}", root.display()));
    }
    Ok(root.to_path_buf())
}

pub async fn handle_scan(root: &Path, config: &Config) -> Result<()> {
    let root = validate_root(root)?;
    let ui = UI::new().with_color_theme(config.ui.color.theme.clone());

    ui.print_banner_with_mode(&Mode::Scan)?;
    ui.print_info(&format!("Searching {}", root.display()))?;

    let spinner = ui.create_spinner("Walking directory tree...");
    let found = discover(&root, &config.scan).await;
    spinner.finish_and_clear();
    let found = found?;

    if found.is_empty() {
        ui.print_warning("No body files found.")?;
        return Ok(());
    }

    for candidate in &found {
        let size = std::fs::metadata(&candidate.path)
            .map(|m| format_size(m.len()))
            .unwrap_or_else(|_| "?".to_string());
        ui.print_info(&format!(
            "{} ({:?}, {})",
            candidate.path.display(),
            candidate.format,
            size
        ))?;
    }

    ui.print_success(&format!("Found {} body file(s)", found.len()))?;
    ui.cleanup()?;

    Ok(())
}

pub async fn handle_extract(root: &Path, quiet: bool, config: &Config) -> Result<()> {
    let root = validate_root(root)?;
    let ui = UI::new().with_color_theme(config.ui.color.theme.clone());

    if !quiet {
        ui.print_banner_with_mode(&Mode::Extract)?;
    }

    let console = (!quiet).then(|| UI::new().with_color_theme(config.ui.color.theme.clone()));
    let log = RunLog::open(&root.join(&config.output.log_file), console)?;

    let stats = Pipeline::new(&root, config, &log).run().await?;

    if !quiet {
        if stats.failed > 0 {
            ui.print_warning(&format!(
                "{} of {} body file(s) could not be sorted",
                stats.failed, stats.candidates
            ))?;
        }
        if stats.cleanup_failures > 0 {
            ui.print_warning(&format!(
                "{} scratch item(s) could not be removed",
                stats.cleanup_failures
            ))?;
        }
        ui.print_info(&format!("Log file: {}", log.path().display()))?;
        ui.cleanup()?;
    }

    Ok(())
}
