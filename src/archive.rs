//! Archive extraction.
//!
//! This module unpacks a body file into its scratch directory. Four formats are
//! supported, each delegated to its codec crate: zip, tar, gzip-wrapped tar, and 7z.
//! The codecs are synchronous, so extraction runs on the blocking thread pool.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tokio::task;

use crate::error::ArchiveError;
use crate::scanner::CandidateArchive;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    /// A single gzip stream wrapping a tar archive
    Gzip,
    SevenZip,
}

impl ArchiveFormat {
    /// Maps a lowercase extension (with leading dot) to its format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            ".zip" => Some(ArchiveFormat::Zip),
            ".tar" => Some(ArchiveFormat::Tar),
            ".gz" => Some(ArchiveFormat::Gzip),
            ".7z" => Some(ArchiveFormat::SevenZip),
            _ => None,
        }
    }
}

/// Result of extracting one candidate.
#[derive(Debug)]
pub struct ExtractionOutput {
    pub source: CandidateArchive,
    pub output_dir: PathBuf,
    pub succeeded: bool,
    /// Decompressed gzip payload, removed during cleanup
    pub transient: Option<PathBuf>,
}

/// Returns the scratch directory for an archive: `<parent>/<file name><suffix>`.
pub fn scratch_dir(candidate: &CandidateArchive, suffix: &str) -> PathBuf {
    let parent = candidate
        .path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    parent.join(format!("{}{}", candidate.file_name(), suffix))
}

/// Returns where the decompressed gzip payload goes: the archive path minus `.gz`.
pub fn gzip_sibling(archive: &Path) -> PathBuf {
    let name = archive.to_string_lossy();
    let lower = name.to_ascii_lowercase();
    match lower.strip_suffix(".gz") {
        Some(stem) => PathBuf::from(&name[..stem.len()]),
        None => archive.with_extension(""),
    }
}

/// Extracts `candidate` into `output_dir`.
///
/// `output_dir` is created before the codec runs, whatever the outcome. The
/// returned [`ExtractionOutput`] always carries the directory and any transient
/// file so cleanup can remove them; the error is returned alongside when the
/// extraction failed.
///
/// # Arguments
///
/// * `candidate` - The body file to unpack
/// * `output_dir` - Scratch directory to unpack into
pub async fn extract(
    candidate: &CandidateArchive,
    output_dir: &Path,
) -> (ExtractionOutput, Option<ArchiveError>) {
    let mut output = ExtractionOutput {
        source: candidate.clone(),
        output_dir: output_dir.to_path_buf(),
        succeeded: false,
        transient: None,
    };

    if let Err(e) = tokio::fs::create_dir_all(output_dir).await {
        return (output, Some(e.into()));
    }

    let archive = candidate.path.clone();
    let format = candidate.format;
    let dest = output_dir.to_path_buf();

    let result = task::spawn_blocking(move || unpack(&archive, format, &dest)).await;

    match result {
        Ok((transient, Ok(()))) => {
            output.transient = transient;
            output.succeeded = true;
            (output, None)
        }
        Ok((transient, Err(e))) => {
            output.transient = transient;
            (output, Some(e))
        }
        Err(e) => (output, Some(e.into())),
    }
}

/// Dispatches to the codec for `format`.
///
/// The first element is the gzip payload file, set as soon as it was created so
/// it is tracked even when the tar step fails.
fn unpack(
    archive: &Path,
    format: ArchiveFormat,
    dest: &Path,
) -> (Option<PathBuf>, Result<(), ArchiveError>) {
    match format {
        ArchiveFormat::Zip => (None, unpack_zip(archive, dest)),
        ArchiveFormat::Tar => (None, unpack_tar(archive, dest)),
        ArchiveFormat::SevenZip => (None, unpack_7z(archive, dest)),
        ArchiveFormat::Gzip => {
            let payload = match gzip_payload_path(archive, dest) {
                Ok(path) => path,
                Err(e) => return (None, Err(e)),
            };

            let written = decompress_gzip(archive, &payload);
            // Track the payload if anything was created, even a partial write.
            let transient = payload.exists().then(|| payload.clone());

            match written {
                Ok(()) => (transient, unpack_tar(&payload, dest)),
                Err(e) => (transient, Err(e)),
            }
        }
    }
}

/// Picks where the decompressed gzip stream is written.
///
/// The sibling path is used when free. When a file the run did not create
/// already sits there, the payload goes beside the scratch directory as
/// `<output_dir>.tar` instead.
fn gzip_payload_path(archive: &Path, dest: &Path) -> Result<PathBuf, ArchiveError> {
    let sibling = gzip_sibling(archive);
    if !sibling.exists() {
        return Ok(sibling);
    }

    let mut fallback = dest.as_os_str().to_os_string();
    fallback.push(".tar");
    let fallback = PathBuf::from(fallback);
    if fallback.exists() {
        return Err(ArchiveError::WouldOverwrite(fallback));
    }

    Ok(fallback)
}

fn unpack_zip(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(BufReader::new(file))?;
    zip.extract(dest)?;
    Ok(())
}

fn unpack_tar(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive)?;
    let mut tar = tar::Archive::new(BufReader::new(file));
    tar.unpack(dest)?;
    Ok(())
}

fn unpack_7z(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    sevenz_rust::decompress_file(archive, dest).map_err(|e| ArchiveError::SevenZip(e.to_string()))
}

fn decompress_gzip(archive: &Path, payload: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive)?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let out = File::create(payload)?;
    let mut out = BufWriter::with_capacity(256 * 1024, out);
    std::io::copy(&mut decoder, &mut out)?;
    out.into_inner().map_err(|e| e.into_error())?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn candidate(path: &Path, format: ArchiveFormat) -> CandidateArchive {
        CandidateArchive {
            path: path.to_path_buf(),
            format,
        }
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(ArchiveFormat::from_extension(".zip"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_extension(".gz"), Some(ArchiveFormat::Gzip));
        assert_eq!(ArchiveFormat::from_extension(".rar"), None);
    }

    #[test]
    fn test_scratch_dir_beside_archive() {
        let c = candidate(Path::new("/cases/42/x_body.zip"), ArchiveFormat::Zip);

        assert_eq!(
            scratch_dir(&c, "_extracted"),
            PathBuf::from("/cases/42/x_body.zip_extracted")
        );
    }

    #[test]
    fn test_gzip_sibling_strips_suffix() {
        assert_eq!(
            gzip_sibling(Path::new("/cases/x_body.tar.gz")),
            PathBuf::from("/cases/x_body.tar")
        );
        assert_eq!(
            gzip_sibling(Path::new("/cases/X_BODY.TAR.GZ")),
            PathBuf::from("/cases/X_BODY.TAR")
        );
    }

    #[tokio::test]
    async fn test_extract_zip() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a_body.zip");
        write_zip(&archive, &[("mva/sysconfig-a.txt", "hello")]);
        let out = dir.path().join("a_body.zip_extracted");

        let (output, err) = extract(&candidate(&archive, ArchiveFormat::Zip), &out).await;

        assert!(err.is_none());
        assert!(output.succeeded);
        assert!(output.transient.is_none());
        assert_eq!(
            std::fs::read_to_string(out.join("mva/sysconfig-a.txt")).unwrap(),
            "hello"
        );
    }

    #[tokio::test]
    async fn test_extract_tar() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a_body.tar");
        write_tar(&archive, &[("notes.txt", "tar contents")]);
        let out = dir.path().join("a_body.tar_extracted");

        let (output, err) = extract(&candidate(&archive, ArchiveFormat::Tar), &out).await;

        assert!(err.is_none());
        assert!(output.succeeded);
        assert_eq!(
            std::fs::read_to_string(out.join("notes.txt")).unwrap(),
            "tar contents"
        );
    }

    #[tokio::test]
    async fn test_extract_gzip_tracks_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a_body.tar.gz");
        write_tar_gz(&archive, &[("inner/file.txt", "gz contents")]);
        let out = dir.path().join("a_body.tar.gz_extracted");

        let (output, err) = extract(&candidate(&archive, ArchiveFormat::Gzip), &out).await;

        assert!(err.is_none());
        assert!(output.succeeded);
        let sibling = dir.path().join("a_body.tar");
        assert_eq!(output.transient.as_deref(), Some(sibling.as_path()));
        assert!(sibling.exists());
        assert_eq!(
            std::fs::read_to_string(out.join("inner/file.txt")).unwrap(),
            "gz contents"
        );
    }

    #[tokio::test]
    async fn test_extract_gzip_existing_sibling_uses_scratch_payload() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a_body.tar.gz");
        write_tar_gz(&archive, &[("file.txt", "x")]);
        let sibling = dir.path().join("a_body.tar");
        std::fs::write(&sibling, b"user data").unwrap();
        let out = dir.path().join("a_body.tar.gz_extracted");

        let (output, err) = extract(&candidate(&archive, ArchiveFormat::Gzip), &out).await;

        assert!(err.is_none());
        assert!(output.succeeded);
        let payload = dir.path().join("a_body.tar.gz_extracted.tar");
        assert_eq!(output.transient.as_deref(), Some(payload.as_path()));
        assert_eq!(std::fs::read_to_string(out.join("file.txt")).unwrap(), "x");
        assert_eq!(std::fs::read(&sibling).unwrap(), b"user data");
    }

    #[tokio::test]
    async fn test_extract_gzip_refuses_when_every_payload_path_is_taken() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a_body.tar.gz");
        write_tar_gz(&archive, &[("file.txt", "x")]);
        std::fs::write(dir.path().join("a_body.tar"), b"user data").unwrap();
        let taken = dir.path().join("a_body.tar.gz_extracted.tar");
        std::fs::write(&taken, b"also user data").unwrap();
        let out = dir.path().join("a_body.tar.gz_extracted");

        let (output, err) = extract(&candidate(&archive, ArchiveFormat::Gzip), &out).await;

        assert!(matches!(err, Some(ArchiveError::WouldOverwrite(ref p)) if p == &taken));
        assert!(!output.succeeded);
        assert!(output.transient.is_none());
        assert_eq!(std::fs::read(&taken).unwrap(), b"also user data");
    }

    #[tokio::test]
    async fn test_extract_7z() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("a_body.7z");
        write_7z(
            &archive,
            &[("mva/sysconfig-a.txt", "seven"), ("manifest.xml", "<m/>")],
        );
        let out = dir.path().join("a_body.7z_extracted");

        let (output, err) = extract(&candidate(&archive, ArchiveFormat::SevenZip), &out).await;

        assert!(err.is_none());
        assert!(output.succeeded);
        assert!(output.transient.is_none());
        assert_eq!(
            std::fs::read_to_string(out.join("mva/sysconfig-a.txt")).unwrap(),
            "seven"
        );
        assert_eq!(std::fs::read_to_string(out.join("manifest.xml")).unwrap(), "<m/>");
    }

    #[tokio::test]
    async fn test_extract_corrupt_zip_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("bad_body.zip");
        std::fs::write(&archive, b"this is not a zip file").unwrap();
        let out = dir.path().join("bad_body.zip_extracted");

        let (output, err) = extract(&candidate(&archive, ArchiveFormat::Zip), &out).await;

        assert!(matches!(err, Some(ArchiveError::Zip(_))));
        assert!(!output.succeeded);
        assert!(out.is_dir());
    }

    #[tokio::test]
    async fn test_extract_corrupt_7z() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("bad_body.7z");
        std::fs::write(&archive, b"not seven zip").unwrap();
        let out = dir.path().join("bad_body.7z_extracted");

        let (output, err) = extract(&candidate(&archive, ArchiveFormat::SevenZip), &out).await;

        assert!(matches!(err, Some(ArchiveError::SevenZip(_))));
        assert!(!output.succeeded);
    }

    #[tokio::test]
    async fn test_extract_gzip_with_non_tar_payload() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("plain_body.gz");
        {
            use flate2::Compression;
            use flate2::write::GzEncoder;
            use std::io::Write;
            let file = std::fs::File::create(&archive).unwrap();
            let mut gz = GzEncoder::new(file, Compression::default());
            gz.write_all(b"just some text, not a tar header").unwrap();
            gz.finish().unwrap();
        }
        let out = dir.path().join("plain_body.gz_extracted");

        let (output, err) = extract(&candidate(&archive, ArchiveFormat::Gzip), &out).await;

        assert!(err.is_some());
        assert!(!output.succeeded);
        // The payload was still written and must be handed to cleanup.
        assert_eq!(
            output.transient.as_deref(),
            Some(dir.path().join("plain_body").as_path())
        );
    }
}
