//! Run log.
//!
//! Every discovery, extraction attempt, success, failure and cleanup action is
//! recorded through a [`LogSink`]. The production sink, [`RunLog`], appends
//! timestamped lines to a log file in the root directory and mirrors each
//! record to the terminal.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::tui::UI;

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => f.write_str("INFO"),
            Level::Error => f.write_str("ERROR"),
        }
    }
}

/// Destination for run log records.
///
/// Passed explicitly to the pipeline and each stage. Implementations must not
/// fail the caller: a record that cannot be written is dropped.
pub trait LogSink {
    fn record(&self, level: Level, message: &str, success: bool);

    fn info(&self, message: &str) {
        self.record(Level::Info, message, false);
    }

    /// An info record for a completed step, shown with a success marker on the console.
    fn success(&self, message: &str) {
        self.record(Level::Info, message, true);
    }

    fn error(&self, message: &str) {
        self.record(Level::Error, message, false);
    }
}

/// Log file plus console mirror.
pub struct RunLog {
    path: PathBuf,
    file: Mutex<File>,
    console: Option<UI>,
}

impl RunLog {
    /// Opens (or creates) the log file for appending.
    ///
    /// # Arguments
    ///
    /// * `path` - Log file location, normally `<root>/asup_parse_log.txt`
    /// * `console` - Terminal used to mirror records; `None` keeps the run quiet
    pub fn open(path: &Path, console: Option<UI>) -> color_eyre::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
            console,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Formats a record the way it appears in the log file.
pub fn format_record(level: Level, message: &str) -> String {
    format!(
        "{} - {} - {}\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        level,
        message
    )
}

impl LogSink for RunLog {
    fn record(&self, level: Level, message: &str, success: bool) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.write_all(format_record(level, message).as_bytes());
        }

        if let Some(ui) = &self.console {
            let _ = match (level, success) {
                (Level::Error, _) => ui.print_error(message),
                (Level::Info, true) => ui.print_success(message),
                (Level::Info, false) => ui.print_info(message),
            };
        }
    }
}

/// In-memory sink for tests.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryLog {
    records: Mutex<Vec<(Level, String)>>,
}

#[cfg(test)]
impl MemoryLog {
    pub(crate) fn records(&self) -> Vec<(Level, String)> {
        self.records.lock().unwrap().clone()
    }

    pub(crate) fn errors(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|(level, _)| *level == Level::Error)
            .map(|(_, message)| message)
            .collect()
    }

    pub(crate) fn contains(&self, needle: &str) -> bool {
        self.records().iter().any(|(_, m)| m.contains(needle))
    }
}

#[cfg(test)]
impl LogSink for MemoryLog {
    fn record(&self, level: Level, message: &str, _success: bool) {
        self.records
            .lock()
            .unwrap()
            .push((level, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_record_layout() {
        let line = format_record(Level::Error, "Failed to extract body.zip");

        assert!(line.ends_with(" - ERROR - Failed to extract body.zip\n"));
        // "YYYY-MM-DD HH:MM:SS" prefix
        assert_eq!(line.find(" - "), Some(19));
    }

    #[test]
    fn test_run_log_appends_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asup_parse_log.txt");

        {
            let log = RunLog::open(&path, None).unwrap();
            log.info("Found body file: a_body.zip");
            log.error("Failed to extract a_body.zip");
        }
        {
            let log = RunLog::open(&path, None).unwrap();
            log.success("Cleaned up unneeded directory: x");
            assert_eq!(log.path(), path.as_path());
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("INFO - Found body file: a_body.zip"));
        assert!(lines[1].ends_with("ERROR - Failed to extract a_body.zip"));
        assert!(lines[2].ends_with("INFO - Cleaned up unneeded directory: x"));
    }

    #[test]
    fn test_memory_log_filters_errors() {
        let log = MemoryLog::default();
        log.info("one");
        log.error("two");

        assert_eq!(log.records().len(), 2);
        assert_eq!(log.errors(), vec!["two".to_string()]);
        assert!(log.contains("on"));
    }
}
