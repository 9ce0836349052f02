//! Extractor module provides the archive-reading seam of the pipeline.
//!
//! Every supported container kind implements [`Extractor`]. The conversion job only ever
//! talks to the trait object returned by [`open_extractor`], so adding a new archive kind
//! means adding an implementation here and a variant to [`ArchiveKind`].

use crate::error::{Error, Result};
use crate::types::{ArchiveKind, InputArchive};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[cfg(feature = "rar")]
pub mod cbr;
pub mod cbz;

/// Common interface for all archive extractors.
///
/// Both operations are all-or-nothing: an archive that cannot be opened, or any entry that
/// fails to stream, fails the whole call with [`Error::ExtractionError`].
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Creates an extractor for the archive at `archive`. No I/O happens until one of the
    /// async operations is called.
    fn new(archive: &Path) -> Self
    where
        Self: Sized;

    /// The container kind this extractor reads.
    fn kind(&self) -> ArchiveKind;

    /// The archive being read.
    fn archive(&self) -> &Path;

    /// Lists the names of all non-directory entries, in archive order.
    async fn list_entries(&self) -> Result<Vec<String>>;

    /// Writes every non-directory entry to `destination/<entry path>`, creating
    /// intermediate directories. Returns the number of files written.
    async fn extract_all(&self, destination: &Path) -> Result<usize>;
}

/// Picks the extractor matching the archive kind.
pub fn open_extractor(input: &InputArchive) -> Result<Box<dyn Extractor>> {
    match input.kind() {
        ArchiveKind::Zip => Ok(Box::new(cbz::ZipExtractor::new(input.path()))),
        #[cfg(feature = "rar")]
        ArchiveKind::Rar => Ok(Box::new(cbr::RarExtractor::new(input.path()))),
        #[cfg(not(feature = "rar"))]
        ArchiveKind::Rar => Err(Error::UnsupportedFormat(
            input.path().to_path_buf(),
            ".cbr (built without the `rar` feature)".to_string(),
        )),
    }
}

/// Wraps any failure raised while reading `archive` into an [`Error::ExtractionError`].
pub(crate) fn extraction_error(archive: &Path, cause: impl std::fmt::Display) -> Error {
    Error::ExtractionError {
        archive: archive.to_path_buf(),
        reason: cause.to_string(),
    }
}

/// Runs a blocking extraction routine off the async runtime and folds every failure,
/// including a panicked or cancelled task, into an extraction error for `archive`.
pub(crate) async fn run_blocking<T, F>(archive: &Path, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(PathBuf) -> Result<T> + Send + 'static,
{
    let owned = archive.to_path_buf();
    tokio::task::spawn_blocking(move || work(owned))
        .await
        .map_err(|e| extraction_error(archive, e))?
        .map_err(|e| match e {
            Error::ExtractionError { .. } => e,
            other => extraction_error(archive, other),
        })
}
