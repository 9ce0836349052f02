//! Page image collection.
//!
//! This module walks an extraction workspace, keeps the files whose extension is one of the
//! supported image formats, and returns them in natural reading order keyed on the file name.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tokio::fs::{ReadDir, read_dir};

use crate::error::{Error, Result};
use crate::path_utils::{compare_paths_natural, is_hidden_file};
use crate::types::{CollectedImages, ImageEntry};

/// Collects page images below a directory
#[derive(Debug)]
pub struct Collector<'a> {
    base_directory: &'a Path,
    skip_hidden_files: bool,
}

impl<'a> Collector<'a> {
    /// Creates a new Collector for the specified directory.
    ///
    /// # Arguments
    ///
    /// * `base_directory` - Root of the extracted archive
    /// * `skip_hidden_files` - Ignore dot-prefixed files and directories (e.g. `._001.jpg`)
    pub fn new(base_directory: &'a Path, skip_hidden_files: bool) -> Self {
        Self {
            base_directory,
            skip_hidden_files,
        }
    }

    /// Walks the base directory recursively and returns the ordered page list.
    ///
    /// An empty result is not an error; the caller decides how to treat it.
    pub async fn collect_images(&self) -> Result<CollectedImages> {
        let files = self.collect_files().await?;
        let total_files = files.len();

        let mut pages: Vec<ImageEntry> = files
            .into_par_iter()
            .filter_map(ImageEntry::from_path)
            .collect();
        pages.par_sort_by(|a, b| {
            compare_paths_natural(
                a.path.strip_prefix(self.base_directory).unwrap_or(&a.path),
                b.path.strip_prefix(self.base_directory).unwrap_or(&b.path),
            )
        });

        let ignored_files = total_files - pages.len();
        log::debug!(
            "Collected {} images ({} other files ignored) in {:?}",
            pages.len(),
            ignored_files,
            self.base_directory
        );

        Ok(CollectedImages {
            pages,
            ignored_files,
        })
    }

    /// Lists every regular file below the base directory.
    pub async fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![self.base_directory.to_path_buf()];

        while let Some(directory) = pending.pop() {
            let mut entries: ReadDir = read_dir(&directory).await.map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to read directory {:?}: {}", directory, e),
                ))
            })?;

            while let Some(entry) = entries.next_entry().await.map_err(Error::Io)? {
                let path = entry.path();
                if self.skip_hidden_files && is_hidden_file(&path) {
                    continue;
                }

                let file_type = entry.file_type().await.map_err(Error::Io)?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    files.push(path);
                }
            }
        }

        Ok(files)
    }
}
