//! Destination folder population.
//!
//! Once a serial record is known, the extracted bundle is copied into
//! `<root>/SN <serial> <tag>`. Destinations are append-only: files that already
//! exist are kept and the new copy is written beside them with a numeric suffix.

use filetime::FileTime;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::task;
use walkdir::WalkDir;

use crate::error::PipelineError;
use crate::log::LogSink;
use crate::metadata::SerialRecord;

/// Folder name for a serial record: `SN <serial> <tag>`.
pub fn destination_name(record: &SerialRecord) -> String {
    format!("SN {} {}", record.serial_number, record.tag)
}

/// Picks a free path for `filename` in `dest_dir`, adding `_1`, `_2`, ... before
/// the extension when the name is taken.
fn free_path(dest_dir: &Path, filename: &str) -> PathBuf {
    let dest_path = dest_dir.join(filename);
    if !dest_path.exists() {
        return dest_path;
    }

    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let extension = Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    let mut counter = 1;
    loop {
        let new_filename = if extension.is_empty() {
            format!("{}_{}", stem, counter)
        } else {
            format!("{}_{}.{}", stem, counter, extension)
        };

        let candidate = dest_dir.join(new_filename);
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

/// Copies one file, keeping permissions and access/modification times.
fn copy_file_with_rename(src: &Path, dest_dir: &Path) -> Result<PathBuf, PipelineError> {
    let filename = src
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let dest_path = free_path(dest_dir, &filename);

    let wrap = |source: io::Error| PipelineError::Relocation {
        from: src.to_path_buf(),
        to: dest_path.clone(),
        source,
    };

    fs::copy(src, &dest_path).map_err(wrap)?;

    let metadata = fs::metadata(src).map_err(wrap)?;
    filetime::set_file_times(
        &dest_path,
        FileTime::from_last_access_time(&metadata),
        FileTime::from_last_modification_time(&metadata),
    )
    .map_err(wrap)?;

    Ok(dest_path)
}

/// Whether a walk error can be stepped over: a symlink cycle, or a link whose
/// target is gone.
fn is_unfollowable_link(err: &walkdir::Error) -> bool {
    err.loop_ancestor().is_some()
        || err
            .path()
            .and_then(|p| p.symlink_metadata().ok())
            .is_some_and(|m| m.file_type().is_symlink())
}

/// Deep-copies `src_dir` into `dest_dir`, merging with whatever is already there.
///
/// Symlinks are followed, so a link to a directory is copied as a directory.
/// Links that loop back on an ancestor, dangle, or resolve outside `src_dir`
/// are skipped and returned.
fn copy_tree(src_dir: &Path, dest_dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let fail = |from: &Path, source: io::Error| PipelineError::Relocation {
        from: from.to_path_buf(),
        to: dest_dir.to_path_buf(),
        source,
    };

    let real_root = fs::canonicalize(src_dir).map_err(|e| fail(src_dir, e))?;
    let mut skipped = Vec::new();
    let mut walker = WalkDir::new(src_dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_unfollowable_link(&e) => {
                if let Some(path) = e.path() {
                    skipped.push(path.to_path_buf());
                }
                continue;
            }
            Err(e) => {
                let from = e.path().unwrap_or(src_dir).to_path_buf();
                return Err(fail(&from, e.into()));
            }
        };

        if entry.path_is_symlink()
            && !fs::canonicalize(entry.path()).is_ok_and(|target| target.starts_with(&real_root))
        {
            skipped.push(entry.path().to_path_buf());
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }

        let relative = entry.path().strip_prefix(src_dir).unwrap_or(entry.path());
        let target = dest_dir.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|source| PipelineError::Relocation {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source,
            })?;
        } else {
            let parent = target.parent().unwrap_or(dest_dir);
            copy_file_with_rename(entry.path(), parent)?;
        }
    }

    Ok(skipped)
}

/// Returns `<root>/SN <serial> <tag>`, refusing any name that is not a single
/// plain folder name directly under `root`.
pub fn destination_path(root: &Path, record: &SerialRecord) -> Result<PathBuf, PipelineError> {
    let name = destination_name(record);
    let mut components = Path::new(&name).components();

    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name.as_str() => Ok(root.join(name)),
        _ => Err(PipelineError::Relocation {
            from: PathBuf::from(&record.tag),
            to: root.join(&name),
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                "destination name is not a single folder under the root",
            ),
        }),
    }
}

/// Creates the destination folder for `record` under `root` and copies the
/// extraction output into it.
///
/// Creating the folder is idempotent and is logged as soon as it succeeds. The
/// copy is not atomic: a failure partway leaves the destination partially
/// populated. Symlinks that cannot be followed are logged and left out.
///
/// # Returns
///
/// The destination folder path
///
/// # Errors
///
/// Returns [`PipelineError::Relocation`] naming the entry that failed to copy,
/// or the destination when its name would leave `root`.
pub async fn relocate(
    root: &Path,
    record: &SerialRecord,
    output_dir: &Path,
    log: &dyn LogSink,
) -> Result<PathBuf, PipelineError> {
    let destination = destination_path(root, record)?;

    tokio::fs::create_dir_all(&destination)
        .await
        .map_err(|source| PipelineError::Relocation {
            from: output_dir.to_path_buf(),
            to: destination.clone(),
            source,
        })?;
    log.info(&format!("Created folder: {}", destination.display()));

    let src = output_dir.to_path_buf();
    let dest = destination.clone();

    let skipped = task::spawn_blocking(move || copy_tree(&src, &dest))
        .await
        .map_err(|e| PipelineError::Relocation {
            from: output_dir.to_path_buf(),
            to: destination.clone(),
            source: io::Error::other(e),
        })??;

    for link in skipped {
        log.info(&format!("Skipped unfollowable symlink: {}", link.display()));
    }

    Ok(destination)
}
