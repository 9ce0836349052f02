//! Page assembly: ordered images in, one PDF out.
//!
//! Failures are handled per image. An image that cannot be decoded or rendered is logged,
//! reported to the progress sink and left out; the document is only abandoned when no
//! image at all made it in, or when writing the file fails.

use std::path::Path;

use crate::error::{Error, Result};
use crate::generator::pdf::PdfGenerator;
use crate::generator::{Generator, PageOptions};
use crate::progress::ProgressSink;
use crate::types::{AssemblyReport, ImageEntry};

/// Drives a [`PdfGenerator`] over an ordered page list.
pub struct PageAssembler<'a> {
    options: PageOptions,
    progress: &'a dyn ProgressSink,
    /// The archive being converted, used to tag diagnostics
    input: &'a Path,
}

impl<'a> PageAssembler<'a> {
    pub fn new(options: PageOptions, progress: &'a dyn ProgressSink, input: &'a Path) -> Self {
        Self {
            options,
            progress,
            input,
        }
    }

    /// Renders every page in order and writes the document to `output`.
    ///
    /// # Errors
    ///
    /// * [`Error::NoPagesRendered`] - every image failed; nothing is written
    /// * [`Error::AssemblyWriteError`] - serialization failed or produced an empty file
    pub async fn assemble(&self, pages: &[ImageEntry], output: &Path) -> Result<AssemblyReport> {
        let total = pages.len();
        log::info!("Creating PDF from {} images: {:?}", total, output);

        let mut generator = PdfGenerator::new(output, self.options)?;
        let mut skipped = 0;

        for (index, page) in pages.iter().enumerate() {
            log::debug!("Processing image {}/{}: {:?}", index + 1, total, page.path);
            match generator.add_page(&page.path).await {
                Ok(generator) => {
                    self.progress
                        .on_page_rendered(self.input, generator.page_count(), total);
                }
                Err(e) => {
                    skipped += 1;
                    log::warn!(
                        "Skipping page {}/{} of {:?}: {}",
                        index + 1,
                        total,
                        self.input,
                        e
                    );
                    self.progress
                        .on_page_error(self.input, &page.path, &page_error_reason(e));
                }
            }
        }

        let pages_written = generator.page_count();
        log::info!(
            "Rendered {}/{} images for {:?}",
            pages_written,
            total,
            self.input
        );

        let bytes_written = generator.save().await?;
        log::info!("Wrote {:?} ({} bytes)", output, bytes_written);

        Ok(AssemblyReport {
            pages_written,
            pages_skipped: skipped,
            bytes_written,
        })
    }
}

fn page_error_reason(error: Error) -> String {
    match error {
        Error::PageRenderError { reason, .. } => reason,
        other => other.to_string(),
    }
}
