//! Core data types, enums, and reports for the cbz2pdf conversion library.
//!
//! This module defines the fundamental data structures used throughout cbz2pdf:
//! - Input classification (`ArchiveKind`, `InputArchive`)
//! - Collected pages (`ImageEntry`, `CollectedImages`)
//! - Job bookkeeping (`JobStage`, `AssemblyReport`, `ConversionReport`)
//! - Per-input outcomes (`ConversionOutcome`)

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Image extensions accepted as pages, lower-case and without the leading dot.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];

/// Container format of a comic book archive.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ArchiveKind {
    /// `.cbz`, a ZIP container
    Zip,
    /// `.cbr`, a RAR container
    Rar,
}

impl ArchiveKind {
    /// Maps a file extension (any case, without the dot) to an archive kind.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "cbz" => Some(ArchiveKind::Zip),
            "cbr" => Some(ArchiveKind::Rar),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => "cbz",
            ArchiveKind::Rar => "cbr",
        }
    }
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveKind::Zip => write!(f, "CBZ (zip)"),
            ArchiveKind::Rar => write!(f, "CBR (rar)"),
        }
    }
}

/// An input file together with the archive kind derived from its extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputArchive {
    path: PathBuf,
    kind: ArchiveKind,
}

impl InputArchive {
    /// Classifies `path` by extension. No I/O happens here, so an unsupported
    /// file is rejected before anything touches the disk.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(OsStr::to_str).unwrap_or("");
        match ArchiveKind::from_extension(extension) {
            Some(kind) => Ok(Self {
                path: path.to_path_buf(),
                kind,
            }),
            None => Err(Error::UnsupportedFormat(
                path.to_path_buf(),
                if extension.is_empty() {
                    "<none>".to_string()
                } else {
                    format!(".{}", extension.to_ascii_lowercase())
                },
            )),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }
}

/// A page candidate found in the extraction workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    pub path: PathBuf,
    /// Lower-cased extension, always one of [`SUPPORTED_IMAGE_EXTENSIONS`]
    pub extension: String,
}

impl ImageEntry {
    /// Builds an entry if `path` carries a supported image extension.
    pub fn from_path(path: PathBuf) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if SUPPORTED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Some(Self { path, extension })
        } else {
            None
        }
    }

    /// Base file name, used as the ordering key.
    pub fn file_name(&self) -> String {
        crate::path_utils::get_file_name_lossy(&self.path)
    }
}

/// Ordered page list produced by the collector. May be empty; the caller decides
/// whether that is an error.
#[derive(Debug, Clone, Default)]
pub struct CollectedImages {
    pub pages: Vec<ImageEntry>,
    /// Regular files seen during the walk that were not images
    pub ignored_files: usize,
}

impl CollectedImages {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        self.pages.iter().map(|p| p.path.clone()).collect()
    }
}

/// Stages a conversion job moves through, used to tag diagnostics.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JobStage {
    Start,
    ExtractionPending,
    Extracted,
    Collecting,
    Assembling,
    Done,
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            JobStage::Start => "start",
            JobStage::ExtractionPending => "extraction",
            JobStage::Extracted => "extracted",
            JobStage::Collecting => "collecting",
            JobStage::Assembling => "assembling",
            JobStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Result of assembling one PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AssemblyReport {
    pub pages_written: usize,
    /// Images that failed to decode or render and were left out
    pub pages_skipped: usize,
    pub bytes_written: u64,
}

/// Detailed result of a successful conversion job.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConversionReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub kind: ArchiveKind,
    pub entries_extracted: usize,
    pub assembly: AssemblyReport,
}

/// Boolean outcome of one input in a batch, with the failure message kept for display.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ConversionOutcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub success: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archive_kind_from_extension() {
        assert_eq!(ArchiveKind::from_extension("cbz"), Some(ArchiveKind::Zip));
        assert_eq!(ArchiveKind::from_extension("CBR"), Some(ArchiveKind::Rar));
        assert_eq!(ArchiveKind::from_extension("zip"), None);
        assert_eq!(ArchiveKind::from_extension(""), None);
    }

    #[test]
    fn test_input_archive_rejects_unknown_extension() {
        let result = InputArchive::from_path(Path::new("notes.TXT"));
        match result {
            Err(Error::UnsupportedFormat(path, ext)) => {
                assert_eq!(path, PathBuf::from("notes.TXT"));
                assert_eq!(ext, ".txt");
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(InputArchive::from_path(Path::new("no_extension")).is_err());
    }

    #[test]
    fn test_image_entry_filters_extensions() {
        let entry = ImageEntry::from_path(PathBuf::from("ch1/Page01.JPG")).unwrap();
        assert_eq!(entry.extension, "jpg");
        assert_eq!(entry.file_name(), "Page01.JPG");

        assert!(ImageEntry::from_path(PathBuf::from("ComicInfo.xml")).is_none());
        assert!(ImageEntry::from_path(PathBuf::from("cover.tiff")).is_none());
        assert!(ImageEntry::from_path(PathBuf::from("README")).is_none());
    }
}
