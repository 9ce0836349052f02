//! Generator module provides the document-writing side of the pipeline.
//!
//! [`Generator`] is the common interface for page-oriented document writers; [`pdf`] holds
//! the PDF implementation used by the page assembler.

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

pub mod pdf;

/// Rendering options shared by all generators.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageOptions {
    /// Resolution assumed for page images; a page is `pixels / dpi` inches wide.
    pub dpi: f32,
    /// JPEG quality (1-100) used when embedding pages.
    pub jpeg_quality: u8,
    /// Colour transparent pixels are blended over. `None` drops the alpha channel as is.
    pub alpha_background: Option<[u8; 3]>,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            dpi: 100.0,
            jpeg_quality: 90,
            alpha_background: None,
        }
    }
}

/// Common interface for all document generators.
///
/// A generator accumulates pages in memory and only touches the output path in
/// [`Generator::save`], so abandoning a generator never leaves a partial file behind.
#[async_trait]
pub trait Generator {
    /// Creates a new generator instance.
    ///
    /// # Parameters
    /// * `output_path` - File the document will be written to on save
    /// * `options` - Page rendering options
    fn new(output_path: &Path, options: PageOptions) -> Result<Self>
    where
        Self: Sized;

    /// Decodes `image_path` and appends it as the next page.
    ///
    /// On error the document is left unchanged, so the caller may skip the image and go on.
    async fn add_page(&mut self, image_path: &Path) -> Result<&mut Self>
    where
        Self: Sized;

    /// Number of pages appended so far.
    fn page_count(&self) -> usize;

    /// Writes the document to disk and returns the size of the written file in bytes.
    async fn save(self) -> Result<u64>;
}
