//! Per-archive processing pipeline.
//!
//! Each body file goes through extract → locate serial → relocate → cleanup,
//! one archive at a time. A failure at any step is logged and the archive skips
//! straight to cleanup; the run always moves on to the next body file.

use std::path::{Path, PathBuf};

use crate::archive::{extract, scratch_dir};
use crate::cleanup::cleanup;
use crate::config::Config;
use crate::error::PipelineError;
use crate::log::LogSink;
use crate::metadata::locate_serial;
use crate::reorganize::relocate;
use crate::scanner::{CandidateArchive, discover};

/// How processing of one archive ended.
#[derive(Debug)]
pub enum ArchiveOutcome {
    Relocated(PathBuf),
    Failed(PipelineError),
}

/// Statistics about a pipeline run.
#[derive(Debug, Default)]
pub struct RunStats {
    pub candidates: usize,
    pub relocated: usize,
    pub failed: usize,
    pub cleanup_failures: usize,
    pub outcomes: Vec<(PathBuf, ArchiveOutcome)>,
}

impl RunStats {
    fn record(&mut self, archive: &Path, outcome: ArchiveOutcome) {
        match &outcome {
            ArchiveOutcome::Relocated(_) => self.relocated += 1,
            ArchiveOutcome::Failed(_) => self.failed += 1,
        }
        self.outcomes.push((archive.to_path_buf(), outcome));
    }

    /// Destination folders produced by the run, in processing order.
    pub fn destinations(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter_map(|(_, outcome)| match outcome {
                ArchiveOutcome::Relocated(dest) => Some(dest.as_path()),
                ArchiveOutcome::Failed(_) => None,
            })
            .collect()
    }
}

/// Extraction pipeline over one root directory.
pub struct Pipeline<'a> {
    root: PathBuf,
    config: &'a Config,
    log: &'a dyn LogSink,
}

impl<'a> Pipeline<'a> {
    pub fn new(root: &Path, config: &'a Config, log: &'a dyn LogSink) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
            log,
        }
    }

    /// Discovers every body file under the root and processes them in path order.
    ///
    /// # Errors
    ///
    /// Only a failure to walk the root is returned. Per-archive failures are
    /// logged and counted in the returned [`RunStats`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::path::Path;
    /// use asupsort::config::Config;
    /// use asupsort::log::RunLog;
    /// use asupsort::pipeline::Pipeline;
    ///
    /// # async fn example() -> color_eyre::Result<()> {
    /// let root = Path::new("/cases/1234");
    /// let config = Config::default();
    /// let log = RunLog::open(&root.join("asup_parse_log.txt"), None)?;
    ///
    /// let stats = Pipeline::new(root, &config, &log).run().await?;
    /// println!("{} of {} body files relocated", stats.relocated, stats.candidates);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run(&self) -> color_eyre::Result<RunStats> {
        let mut stats = RunStats::default();

        self.log.info(&format!(
            "Starting extraction in directory: {}",
            self.root.display()
        ));

        let candidates = discover(&self.root, &self.config.scan).await?;
        for candidate in &candidates {
            self.log
                .info(&format!("Found body file: {}", candidate.path.display()));
        }

        if candidates.is_empty() {
            self.log.info("No body files found.");
            return Ok(stats);
        }

        stats.candidates = candidates.len();

        for candidate in &candidates {
            let (outcome, cleanup_failures) = self.process(candidate).await;
            stats.cleanup_failures += cleanup_failures;
            stats.record(&candidate.path, outcome);
        }

        self.log.info(&format!(
            "Processed {} body file(s): {} relocated, {} failed",
            stats.candidates, stats.relocated, stats.failed
        ));

        Ok(stats)
    }

    /// Runs one archive through every step, then cleans up its scratch output.
    ///
    /// Returns the outcome and the number of cleanup failures.
    async fn process(&self, candidate: &CandidateArchive) -> (ArchiveOutcome, usize) {
        let output_dir = scratch_dir(candidate, &self.config.output.scratch_suffix);

        self.log.info(&format!(
            "Extracting {} to {}",
            candidate.path.display(),
            output_dir.display()
        ));

        let (output, error) = extract(candidate, &output_dir).await;

        let outcome = match error {
            Some(source) => {
                let err = PipelineError::Extraction {
                    archive: candidate.path.clone(),
                    source,
                };
                self.log.error(&err.to_string());
                ArchiveOutcome::Failed(err)
            }
            None => {
                self.log.success(&format!(
                    "Successfully extracted {} to {}",
                    candidate.path.display(),
                    output_dir.display()
                ));
                self.relocate_output(&output_dir).await
            }
        };

        let failures = cleanup(std::slice::from_ref(&output), self.log).await;

        (outcome, failures.len())
    }

    async fn relocate_output(&self, output_dir: &Path) -> ArchiveOutcome {
        let record = match locate_serial(output_dir, &self.config.metadata, self.log).await {
            Ok(record) => record,
            Err(err) => {
                // Per-file failures were already logged while scanning.
                if matches!(err, PipelineError::MetadataNotFound(_)) {
                    self.log.error(&format!("Error: {}", err));
                }
                return ArchiveOutcome::Failed(err);
            }
        };

        match relocate(&self.root, &record, output_dir, self.log).await {
            Ok(destination) => {
                self.log.success(&format!(
                    "Copied contents from {} to {}",
                    output_dir.display(),
                    destination.display()
                ));
                ArchiveOutcome::Relocated(destination)
            }
            Err(err) => {
                self.log.error(&err.to_string());
                ArchiveOutcome::Failed(err)
            }
        }
    }
}
