//! Error kinds raised while processing a body file.
//!
//! Every variant of [`PipelineError`] is caught by the pipeline and written to
//! the run log; none of them stops the run.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures raised by the archive codecs.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid 7z archive: {0}")]
    SevenZip(String),

    /// The decompressed gzip stream would replace a file the run did not create.
    #[error("refusing to overwrite existing file {}", .0.display())]
    WouldOverwrite(PathBuf),

    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One failure per stage of the per-archive pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to extract {}: {source}", .archive.display())]
    Extraction {
        archive: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("sysconfig-a.txt not found in {}", .0.display())]
    MetadataNotFound(PathBuf),

    #[error("'System Serial Number' not found in {}", .0.display())]
    SerialNumberNotFound(PathBuf),

    #[error("Could not parse serial number line in {}: {line}", .file.display())]
    ParseFailure { file: PathBuf, line: String },

    #[error("Failed to copy {} to {}: {source}", .from.display(), .to.display())]
    Relocation {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to clean up {}: {source}", .path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    /// Short label used in the closing summary.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Extraction { .. } => "extraction failure",
            PipelineError::MetadataNotFound(_) => "metadata not found",
            PipelineError::SerialNumberNotFound(_) => "serial number not found",
            PipelineError::ParseFailure { .. } => "parse failure",
            PipelineError::Relocation { .. } => "relocation failure",
            PipelineError::Cleanup { .. } => "cleanup failure",
        }
    }
}
