//! Scratch removal.
//!
//! Scratch directories and decompressed gzip payloads are removed after each
//! archive is processed, whatever the outcome.

use std::io;
use std::path::Path;

use crate::archive::ExtractionOutput;
use crate::error::PipelineError;
use crate::log::LogSink;

async fn remove_dir(path: &Path) -> Result<bool, PipelineError> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(PipelineError::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn remove_file(path: &Path) -> Result<bool, PipelineError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(PipelineError::Cleanup {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Removes the scratch artifacts of each output.
///
/// Every removal is attempted independently; failures are logged and returned,
/// and never stop the remaining removals. Paths that are already gone are skipped.
pub async fn cleanup(outputs: &[ExtractionOutput], log: &dyn LogSink) -> Vec<PipelineError> {
    let mut failures = Vec::new();

    for output in outputs {
        match remove_dir(&output.output_dir).await {
            Ok(true) => log.success(&format!(
                "Cleaned up unneeded directory: {}",
                output.output_dir.display()
            )),
            Ok(false) => {}
            Err(e) => {
                log.error(&e.to_string());
                failures.push(e);
            }
        }

        if let Some(transient) = &output.transient {
            match remove_file(transient).await {
                Ok(true) => log.success(&format!(
                    "Removed decompressed file: {}",
                    transient.display()
                )),
                Ok(false) => {}
                Err(e) => {
                    log.error(&e.to_string());
                    failures.push(e);
                }
            }
        }
    }

    failures
}
