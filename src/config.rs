//! Configuration management for asupsort.
//!
//! This module handles loading and saving configuration from/to TOML files.
//! Configuration covers which files count as body files, the metadata file to
//! look for, output naming, and UI preferences. On first run, a default
//! configuration is automatically created.

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure for asupsort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scan: ScanConfig,
    pub metadata: MetadataConfig,
    pub output: OutputConfig,
    pub ui: UIConfig,
}

/// Body file discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Substring a file name must contain (compared lowercase)
    pub marker: String,
    /// Accepted archive extensions, including the leading dot
    pub extensions: Vec<String>,
}

/// Metadata lookup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Name fragment of the file carrying the serial number line
    pub file_pattern: String,
}

/// Output naming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Log file name, created in the root directory
    pub log_file: String,
    /// Appended to the archive file name to form its scratch directory
    pub scratch_suffix: String,
}

/// User interface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIConfig {
    pub color: ColorConfig,
}

/// Color theme configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColorConfig {
    /// Theme name: "default", "cyan", "magenta", "yellow", "green", "red", "blue", "white"
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig {
                marker: "body".to_string(),
                extensions: [".zip", ".tar", ".gz", ".7z"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            metadata: MetadataConfig {
                file_pattern: "sysconfig-a.txt".to_string(),
            },
            output: OutputConfig {
                log_file: "asup_parse_log.txt".to_string(),
                scratch_suffix: "_extracted".to_string(),
            },
            ui: UIConfig {
                color: ColorConfig {
                    theme: "default".to_string(),
                },
            },
        }
    }
}

impl Config {
    /// Returns the configuration directory path.
    ///
    /// Typically `~/.config/asupsort` on Unix systems or `%USERPROFILE%/.config/asupsort` on Windows.
    fn get_config_dir() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| color_eyre::eyre::eyre!("Could not determine home directory"))?;

        Ok(PathBuf::from(home).join(".config").join("asupsort"))
    }

    fn get_config_path() -> Result<PathBuf> {
        Ok(Self::get_config_dir()?.join("config.toml"))
    }

    /// Loads configuration from file, creating default if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if file I/O fails or if the TOML is malformed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use asupsort::config::Config;
    ///
    /// # fn main() -> color_eyre::Result<()> {
    /// let config = Config::load()?;
    /// println!("Looking for files containing: {}", config.scan.marker);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            println!("INFO: Config file not found, creating default config...");
            let config = Self::default();
            config.save()?;
            println!("INFO: Default config created at: {}", config_path.display());
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Loads configuration from an explicit file without creating or saving anything.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        Ok(config)
    }

    /// Saves the configuration to file.
    ///
    /// Creates the configuration directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::get_config_dir()?;
        fs::create_dir_all(&config_dir)?;

        let config_path = Self::get_config_path()?;
        let contents = toml::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }
}
