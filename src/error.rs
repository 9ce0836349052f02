//! Custom error types and result handling for cbz2pdf operations.
//!
//! All fallible operations return a [`Result<T>`], an alias for `std::result::Result<T, Error>`.
//! The first group of variants mirrors the stages of a conversion job so a caller (or a log
//! reader) can tell *where* a job failed; the transparent variants wrap the underlying crates.
//!
use std::path::PathBuf;

/// Type alias for Results with cbz2pdf errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all cbz2pdf operations.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The input path does not exist
    #[error("Input file not found: {0:?}")]
    InputNotFound(PathBuf),
    /// The input extension is neither `.cbz` nor `.cbr`
    #[error("Unsupported input format '{1}' for {0:?}")]
    UnsupportedFormat(PathBuf, String),
    /// The archive could not be opened, or one of its entries failed to stream
    #[error("Failed to extract {archive:?}: {reason}")]
    ExtractionError { archive: PathBuf, reason: String },
    /// Extraction succeeded but produced no supported image files
    #[error("No supported image files found in {0:?}")]
    EmptyPageSet(PathBuf),
    /// A single page could not be decoded or rendered. Recoverable: the page is skipped.
    #[error("Failed to render page {image:?}: {reason}")]
    PageRenderError { image: PathBuf, reason: String },
    /// Every page failed to render, so there is nothing to write
    #[error("None of the {attempted} images could be rendered")]
    NoPagesRendered { attempted: usize },
    /// Serializing the document failed, or the written file is missing or empty
    #[error("Failed to write PDF {output:?}: {reason}")]
    AssemblyWriteError { output: PathBuf, reason: String },

    /// I/O errors from the standard library
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Image processing errors
    #[error(transparent)]
    Image(#[from] image::ImageError),
    /// ZIP file operation errors
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    /// PDF object model errors
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),
    /// Async task join errors
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
    #[error(transparent)]
    ConfigBuilder(#[from] crate::converter::ConverterConfigBuilderError),
    /// Error for invalid file or directory paths
    #[error("The given path '{0:?}' is invalid: {1}")]
    InvalidPath(PathBuf, String),
    /// Other errors that don't fit into specific categories
    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Whether the error only affects a single page and the job may continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::PageRenderError { .. })
    }
}

// Basic From<String> conversion for convenience
impl From<String> for Error {
    fn from(error: String) -> Self {
        Error::Other(error)
    }
}

impl From<&str> for Error {
    fn from(error: &str) -> Self {
        Error::Other(error.to_string())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}
