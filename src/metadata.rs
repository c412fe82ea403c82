//! Serial number lookup.
//!
//! After extraction, the bundle's `sysconfig-a.txt` carries a line such as
//! `System Serial Number: 778899 (XJ4-TEST)`. This module finds that file,
//! reads the first matching line and parses it into a [`SerialRecord`].
//!
//! Lookup policy: metadata files are visited in file-name order and each file
//! contributes only its first `system serial number` line. The first file that
//! yields a valid record wins; later files are not read.

use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::task;
use walkdir::WalkDir;

use crate::config::MetadataConfig;
use crate::error::PipelineError;
use crate::log::LogSink;

const SERIAL_PHRASE: &str = "system serial number";

static SERIAL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)System Serial Number: (\d+)\s*\(([^)]+)\)").expect("valid serial regex")
});

/// Identifier parsed from the serial number line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialRecord {
    /// Digits only
    pub serial_number: String,
    /// Text between the parentheses, verbatim
    pub tag: String,
}

/// Outcome of scanning one metadata file.
#[derive(Debug, PartialEq, Eq)]
pub enum FileScan {
    Parsed(SerialRecord),
    /// The phrase was present but the line did not match the expected form
    Unparsed(String),
    Missing,
}

/// Parses a line of the form `System Serial Number: <digits> (<tag>)`.
///
/// The tag ends up in a folder name, so a tag containing a path separator or a
/// NUL byte does not parse.
pub fn parse_serial_line(line: &str) -> Option<SerialRecord> {
    let caps = SERIAL_LINE.captures(line)?;
    let tag = &caps[2];
    if tag.contains(['/', '\\', '\0']) {
        return None;
    }

    Some(SerialRecord {
        serial_number: caps[1].to_string(),
        tag: tag.to_string(),
    })
}

/// Lists files under `dir` whose name contains `pattern` (case-insensitive),
/// in file-name order.
pub fn find_metadata_files(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let pattern = pattern.to_lowercase();

    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .to_lowercase()
                .contains(&pattern)
        })
        .map(|e| e.into_path())
        .collect()
}

/// Scans `path` for the first line containing the serial number phrase.
///
/// Lines are decoded lossily so stray non-UTF-8 bytes do not end the scan.
pub fn scan_file(path: &Path) -> std::io::Result<FileScan> {
    let reader = BufReader::new(File::open(path)?);

    for line in reader.split(b'\n') {
        let line = line?;
        let line = String::from_utf8_lossy(&line);

        if line.to_lowercase().contains(SERIAL_PHRASE) {
            let line = line.trim();
            return Ok(match parse_serial_line(line) {
                Some(record) => FileScan::Parsed(record),
                None => FileScan::Unparsed(line.to_string()),
            });
        }
    }

    Ok(FileScan::Missing)
}

/// Result of reading one metadata file.
type Examined = (PathBuf, std::io::Result<FileScan>);

/// Reads metadata files in order until one parses.
fn examine_files(output_dir: &Path, pattern: &str) -> Vec<Examined> {
    let mut examined = Vec::new();

    for file in find_metadata_files(output_dir, pattern) {
        let scan = scan_file(&file);
        let parsed = matches!(scan, Ok(FileScan::Parsed(_)));
        examined.push((file, scan));
        if parsed {
            break;
        }
    }

    examined
}

/// Finds the serial record inside an extraction output directory.
///
/// The walk and the reads run on the blocking thread pool. Each metadata file
/// examined is logged; a file that fails is reported and the next one is tried.
///
/// # Errors
///
/// * [`PipelineError::MetadataNotFound`] - no file matched the name pattern
/// * [`PipelineError::SerialNumberNotFound`] / [`PipelineError::ParseFailure`] -
///   every matching file failed; the error is that of the last one examined
pub async fn locate_serial(
    output_dir: &Path,
    config: &MetadataConfig,
    log: &dyn LogSink,
) -> Result<SerialRecord, PipelineError> {
    let dir = output_dir.to_path_buf();
    let pattern = config.file_pattern.clone();
    let examined = task::spawn_blocking(move || examine_files(&dir, &pattern))
        .await
        .unwrap_or_else(|e| {
            log.error(&format!("Metadata scan task failed: {}", e));
            Vec::new()
        });

    let mut last_error = PipelineError::MetadataNotFound(output_dir.to_path_buf());

    for (file, scan) in examined {
        log.info(&format!(
            "{} found in {}",
            config.file_pattern,
            output_dir.display()
        ));
        log.info(&format!(
            "Looking for the string 'System Serial Number' in {}",
            file.display()
        ));

        let error = match scan {
            Ok(FileScan::Parsed(record)) => {
                log.info(&format!(
                    "Found in {}: System Serial Number: {} ({})",
                    config.file_pattern, record.serial_number, record.tag
                ));
                return Ok(record);
            }
            Ok(FileScan::Unparsed(line)) => PipelineError::ParseFailure { file, line },
            Ok(FileScan::Missing) => PipelineError::SerialNumberNotFound(file),
            Err(e) => {
                log.error(&format!("Failed to read {}: {}", file.display(), e));
                PipelineError::SerialNumberNotFound(file)
            }
        };

        log.error(&format!("Error: {}", error));
        last_error = error;
    }

    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::log::MemoryLog;
    use std::fs;

    fn metadata_config() -> MetadataConfig {
        Config::default().metadata
    }

    #[test]
    fn test_parse_serial_line() {
        let record = parse_serial_line("System Serial Number: 778899 (XJ4-TEST)").unwrap();

        assert_eq!(record.serial_number, "778899");
        assert_eq!(record.tag, "XJ4-TEST");
    }

    #[test]
    fn test_parse_serial_line_case_and_spacing() {
        let record = parse_serial_line("  system serial number: 42(node a)  ").unwrap();

        assert_eq!(record.serial_number, "42");
        assert_eq!(record.tag, "node a");
    }

    #[test]
    fn test_parse_serial_line_rejects_malformed() {
        assert!(parse_serial_line("System Serial Number: unknown").is_none());
        assert!(parse_serial_line("System Serial Number: 1234").is_none());
        assert!(parse_serial_line("System Serial Number: 1234 ()").is_none());
    }

    #[test]
    fn test_parse_serial_line_rejects_path_like_tag() {
        assert!(parse_serial_line("System Serial Number: 1 (x/../../escaped)").is_none());
        assert!(parse_serial_line("System Serial Number: 1 (..\\up)").is_none());
        assert!(parse_serial_line("System Serial Number: 1 (A-B.C_D 2)").is_some());
    }

    #[tokio::test]
    async fn test_locate_serial_path_like_tag_is_a_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("sysconfig-a.txt"),
            "System Serial Number: 1 (x/../../escaped)\n",
        )
        .unwrap();
        let log = MemoryLog::default();

        let err = locate_serial(dir.path(), &metadata_config(), &log)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::ParseFailure { .. }));
    }

    #[test]
    fn test_find_metadata_files_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b").join("X-SYSCONFIG-A.TXT"), "").unwrap();
        fs::write(dir.path().join("a-sysconfig-a.txt"), "").unwrap();
        fs::write(dir.path().join("sysconfig-b.txt"), "").unwrap();

        let found = find_metadata_files(dir.path(), "sysconfig-a.txt");

        assert_eq!(
            found,
            vec![
                dir.path().join("a-sysconfig-a.txt"),
                dir.path().join("b").join("X-SYSCONFIG-A.TXT"),
            ]
        );
    }

    #[test]
    fn test_scan_file_uses_first_matching_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sysconfig-a.txt");
        fs::write(
            &path,
            "Model: FAS\nSystem Serial Number: 111 (FIRST)\nSystem Serial Number: 222 (SECOND)\n",
        )
        .unwrap();

        let scan = scan_file(&path).unwrap();

        assert_eq!(
            scan,
            FileScan::Parsed(SerialRecord {
                serial_number: "111".to_string(),
                tag: "FIRST".to_string(),
            })
        );
    }

    #[test]
    fn test_scan_file_first_line_unparsed_is_final() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sysconfig-a.txt");
        fs::write(
            &path,
            "System serial number: not available\nSystem Serial Number: 222 (SECOND)\n",
        )
        .unwrap();

        let scan = scan_file(&path).unwrap();

        assert_eq!(
            scan,
            FileScan::Unparsed("System serial number: not available".to_string())
        );
    }

    #[test]
    fn test_scan_file_tolerates_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sysconfig-a.txt");
        let mut bytes = b"garbage \xff\xfe line\n".to_vec();
        bytes.extend_from_slice(b"System Serial Number: 5 (T)\r\n");
        fs::write(&path, bytes).unwrap();

        let scan = scan_file(&path).unwrap();

        assert!(matches!(scan, FileScan::Parsed(ref r) if r.serial_number == "5" && r.tag == "T"));
    }

    #[tokio::test]
    async fn test_locate_serial_missing_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let log = MemoryLog::default();

        let err = locate_serial(dir.path(), &metadata_config(), &log)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::MetadataNotFound(_)));
    }

    #[tokio::test]
    async fn test_locate_serial_missing_line() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("sysconfig-a.txt"), "Model: FAS\nUptime: 3d\n").unwrap();
        let log = MemoryLog::default();

        let err = locate_serial(dir.path(), &metadata_config(), &log)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::SerialNumberNotFound(_)));
        assert_eq!(log.errors().len(), 1);
        assert!(log.errors()[0].contains("'System Serial Number' not found"));
    }

    #[tokio::test]
    async fn test_locate_serial_parse_failure_is_logged() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("sysconfig-a.txt"),
            "System Serial Number: pending\n",
        )
        .unwrap();
        let log = MemoryLog::default();

        let err = locate_serial(dir.path(), &metadata_config(), &log)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::ParseFailure { ref line, .. } if line == "System Serial Number: pending"));
        assert!(log.contains("Could not parse serial number line"));
    }

    #[tokio::test]
    async fn test_locate_serial_first_valid_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a-sysconfig-a.txt"), "no serial here\n").unwrap();
        fs::write(
            dir.path().join("b-sysconfig-a.txt"),
            "System Serial Number: 778899 (XJ4-TEST)\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("c-sysconfig-a.txt"),
            "System Serial Number: 000000 (LATER)\n",
        )
        .unwrap();
        let log = MemoryLog::default();

        let record = locate_serial(dir.path(), &metadata_config(), &log)
            .await
            .unwrap();

        assert_eq!(record.serial_number, "778899");
        assert_eq!(record.tag, "XJ4-TEST");
        // The file before the winner was reported, the one after never read.
        assert_eq!(log.errors().len(), 1);
        assert!(!log.contains("c-sysconfig-a.txt"));
    }
}
