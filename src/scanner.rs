//! Body file discovery.
//!
//! This module walks a directory tree and picks out the diagnostic bundles
//! ("body files") worth extracting: files whose name contains the configured
//! marker and ends in one of the supported archive extensions.

use std::path::{Path, PathBuf};
use tokio::task;
use walkdir::WalkDir;

use crate::archive::ArchiveFormat;
use crate::config::ScanConfig;

/// An archive selected for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateArchive {
    pub path: PathBuf,
    pub format: ArchiveFormat,
}

impl CandidateArchive {
    /// The archive's file name, used in log messages and scratch directory names.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Decides whether a single path is a body file.
///
/// The name is compared lowercase against both the marker and the extension list.
pub fn classify(path: &Path, config: &ScanConfig) -> Option<CandidateArchive> {
    let name = path.file_name()?.to_string_lossy().to_lowercase();

    if !name.contains(&config.marker.to_lowercase()) {
        return None;
    }

    config
        .extensions
        .iter()
        .map(|ext| ext.to_lowercase())
        .find(|ext| name.ends_with(ext.as_str()))
        .and_then(|ext| ArchiveFormat::from_extension(&ext))
        .map(|format| CandidateArchive {
            path: path.to_path_buf(),
            format,
        })
}

/// Lazily yields every body file under `root`.
///
/// The full subtree is walked with no depth limit. Entries that cannot be read
/// are skipped. The iterator is one-shot; call again to re-walk.
pub fn candidates<'a>(
    root: &Path,
    config: &'a ScanConfig,
) -> impl Iterator<Item = CandidateArchive> + 'a {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e: Result<walkdir::DirEntry, walkdir::Error>| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(move |e| classify(e.path(), config))
}

/// Collects all body files under `root`, sorted by path.
///
/// The walk runs on the blocking thread pool. The whole list is gathered before
/// any extraction starts, so files the run itself writes are never picked up.
///
/// # Errors
///
/// Returns an error if `root` is not a directory or the walk task fails.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use asupsort::config::Config;
/// use asupsort::scanner::discover;
///
/// # async fn example() -> color_eyre::Result<()> {
/// let config = Config::default();
/// let found = discover(Path::new("/cases/1234"), &config.scan).await?;
/// println!("Found {} body files", found.len());
/// # Ok(())
/// # }
/// ```
pub async fn discover(
    root: &Path,
    config: &ScanConfig,
) -> color_eyre::Result<Vec<CandidateArchive>> {
    if !root.is_dir() {
        return Err(color_eyre::eyre::eyre!(
            "Not a directory: {}",
            root.display()
        ));
    }

    let root = root.to_path_buf();
    let config = config.clone();

    let mut found = task::spawn_blocking(move || {
        candidates(&root, &config).collect::<Vec<_>>()
    })
    .await?;

    found.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(found)
}
