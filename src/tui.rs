//! Terminal output components.
//!
//! This module provides the themed console styles, banner, spinner, and status
//! line printers shared by the CLI and the run log's console mirror.

use console::Term;
use dialoguer::theme::ColorfulTheme;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;

pub const BANNER: &str = r#"
   ▄▄▄        ██████  █    ██  ██▓███    ██████  ▒█████   ██▀███  ▄▄▄█████▓
  ▒████▄    ▒██    ▒  ██  ▓██▒▓██░  ██▒▒██    ▒ ▒██▒  ██▒▓██ ▒ ██▒▓  ██▒ ▓▒
  ▒██  ▀█▄  ░ ▓██▄   ▓██  ▒██░▓██░ ██▓▒░ ▓██▄   ▒██░  ██▒▓██ ░▄█ ▒▒ ▓██░ ▒░
  ░██▄▄▄▄██   ▒   ██▒▓▓█  ░██░▒██▄█▓▒ ▒  ▒   ██▒▒██   ██░▒██▀▀█▄  ░ ▓██▓ ░
   ▓█   ▓██▒▒██████▒▒▒▒█████▓ ▒██▒ ░  ░▒██████▒▒░ ████▓▒░░██▓ ▒██▒  ▒██▒ ░
   ▒▒   ▓▒█░▒ ▒▓▒ ▒ ░░▒▓▒ ▒ ▒ ▒▓▒░ ░  ░▒ ▒▓▒ ▒ ░░ ▒░▒░▒░ ░ ▒▓ ░▒▓░  ▒ ░░   "#;

pub enum Mode {
    Scan,
    Extract,
}

impl Mode {
    pub fn as_str(&self) -> &str {
        match self {
            Mode::Scan => "SCAN",
            Mode::Extract => "EXTRACT",
        }
    }
}

pub struct UI {
    pub term: Term,
    pub color_theme: String,
}

impl UI {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            color_theme: "default".to_string(),
        }
    }

    pub fn with_color_theme(mut self, theme: String) -> Self {
        self.color_theme = theme;
        self
    }

    /// Get the console::Style for the configured theme
    fn get_style(&self) -> console::Style {
        use console::Style;

        match self.color_theme.as_str() {
            "cyan" => Style::new().cyan(),
            "magenta" => Style::new().magenta(),
            "yellow" => Style::new().yellow(),
            "green" => Style::new().green(),
            "red" => Style::new().red(),
            "blue" => Style::new().blue(),
            _ => Style::new().white(),
        }
    }

    fn get_spinner_color(&self) -> &str {
        match self.color_theme.as_str() {
            "cyan" => ".cyan",
            "magenta" => ".magenta",
            "yellow" => ".yellow",
            "green" => ".green",
            "red" => ".red",
            "blue" => ".blue",
            _ => ".white",
        }
    }

    /// Get a ColorfulTheme for dialoguer prompts based on theme string
    pub fn get_colorful_theme(theme: &str) -> ColorfulTheme {
        use console::{Style, style};

        let base = match theme {
            "cyan" => Style::new().cyan(),
            "magenta" => Style::new().magenta(),
            "yellow" => Style::new().yellow(),
            "green" => Style::new().green(),
            "red" => Style::new().red(),
            "blue" => Style::new().blue(),
            "white" => Style::new().white(),
            _ => return ColorfulTheme::default(),
        };

        ColorfulTheme {
            values_style: base.clone(),
            active_item_style: base.clone().bold(),
            active_item_prefix: style("❯".to_string()).fg(base_color(theme)).bold(),
            ..ColorfulTheme::default()
        }
    }

    /// Get status styles based on theme string
    /// Returns (info_style, warning_style, error_style, success_style)
    pub fn get_static_status_styles(
        theme: &str,
    ) -> (
        console::Style,
        console::Style,
        console::Style,
        console::Style,
    ) {
        use console::Style;

        match theme {
            "cyan" => (
                Style::new().cyan(),        // info - base
                Style::new().color256(51),  // warning - bright cyan
                Style::new().color256(87),  // error - darker cyan
                Style::new().color256(123), // success - lighter cyan
            ),
            "magenta" => (
                Style::new().magenta(),
                Style::new().color256(201),
                Style::new().color256(126),
                Style::new().color256(213),
            ),
            "yellow" => (
                Style::new().yellow(),
                Style::new().color256(226),
                Style::new().color256(178),
                Style::new().color256(227),
            ),
            "green" => (
                Style::new().green(),
                Style::new().color256(46),
                Style::new().color256(28),
                Style::new().color256(120),
            ),
            "red" => (
                Style::new().red(),
                Style::new().color256(196),
                Style::new().color256(124),
                Style::new().color256(210),
            ),
            "blue" => (
                Style::new().blue(),
                Style::new().color256(39),
                Style::new().color256(25),
                Style::new().color256(117),
            ),
            _ => (
                Style::new().white(),
                Style::new().color256(255),
                Style::new().red(),
                Style::new().green(),
            ),
        }
    }

    /// Print banner with mode
    pub fn print_banner_with_mode(&self, mode: &Mode) -> io::Result<()> {
        use console::Style;
        let style = self.get_style();
        let white_bold = Style::new().white().bold();

        self.term.write_line(&style.apply_to(BANNER).bold().to_string())?;
        self.term.write_line("")?;
        self.term
            .write_line(&white_bold.apply_to("=".repeat(70)).to_string())?;

        // "MODE:" is themed and bold, mode name is white, bold, and italic
        self.term.write_line(&format!(
            "{} {}",
            style.apply_to("MODE:").bold(),
            white_bold.apply_to(mode.as_str()).italic()
        ))?;

        self.term
            .write_line(&white_bold.apply_to("=".repeat(70)).to_string())?;

        Ok(())
    }

    /// Create a spinner for walks of unknown length
    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let spinner_color = self.get_spinner_color();
        let style = ProgressStyle::default_spinner()
            .template(&format!("{{spinner:{}}} {{msg}}", spinner_color))
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        pb.set_style(style);
        pb.set_message(message.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }

    /// Print an info message
    pub fn print_info(&self, message: &str) -> io::Result<()> {
        let (info_style, _, _, _) = Self::get_static_status_styles(&self.color_theme);
        self.print_status(info_style.apply_to("[*]").bold(), message)
    }

    /// Print an error message
    pub fn print_error(&self, message: &str) -> io::Result<()> {
        let (_, _, error_style, _) = Self::get_static_status_styles(&self.color_theme);
        self.print_status(error_style.apply_to("[!] ERROR:").bold(), message)
    }

    /// Print a success message
    pub fn print_success(&self, message: &str) -> io::Result<()> {
        let (_, _, _, success_style) = Self::get_static_status_styles(&self.color_theme);
        self.print_status(success_style.apply_to("[✓]").bold(), message)
    }

    /// Print a warning message
    pub fn print_warning(&self, message: &str) -> io::Result<()> {
        let (_, warning_style, _, _) = Self::get_static_status_styles(&self.color_theme);
        self.print_status(warning_style.apply_to("[!] WARNING:").bold(), message)
    }

    fn print_status(
        &self,
        prefix: console::StyledObject<&str>,
        message: &str,
    ) -> io::Result<()> {
        let white_bold = console::Style::new().white().bold();
        self.term
            .write_line(&format!("{} {}", prefix, white_bold.apply_to(message)))
    }

    /// Cleanup the terminal (show cursor, etc.)
    pub fn cleanup(&self) -> io::Result<()> {
        self.term.show_cursor()?;
        Ok(())
    }
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}

fn base_color(theme: &str) -> console::Color {
    match theme {
        "cyan" => console::Color::Cyan,
        "magenta" => console::Color::Magenta,
        "yellow" => console::Color::Yellow,
        "green" => console::Color::Green,
        "red" => console::Color::Red,
        "blue" => console::Color::Blue,
        _ => console::Color::White,
    }
}

// Helper function to format file sizes
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}
