use crate::error::Result;
use crate::extractor::{Extractor, extraction_error, run_blocking};
use crate::path_utils::safe_entry_path;
use crate::types::ArchiveKind;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use unrar::Archive;

/// Extractor for RAR containers (`.cbr`), backed by the unrar library.
pub struct RarExtractor {
    archive: PathBuf,
}

impl RarExtractor {
    fn list_blocking(path: &Path) -> Result<Vec<String>> {
        let listing = Archive::new(path)
            .open_for_listing()
            .map_err(|e| extraction_error(path, e))?;

        let mut names = Vec::new();
        for header in listing {
            let header = header.map_err(|e| extraction_error(path, e))?;
            if header.is_file() {
                names.push(header.filename.to_string_lossy().to_string());
            }
        }
        Ok(names)
    }

    fn extract_blocking(path: &Path, destination: &Path) -> Result<usize> {
        let mut archive = Archive::new(path)
            .open_for_processing()
            .map_err(|e| extraction_error(path, e))?;
        let mut written = 0;

        while let Some(header) = archive
            .read_header()
            .map_err(|e| extraction_error(path, e))?
        {
            archive = if header.entry().is_file() {
                let name = header.entry().filename.to_string_lossy().to_string();
                log::debug!("Extracting entry {}: {}", written + 1, name);
                let target = safe_entry_path(destination, &name)?;
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }

                let (data, rest) = header.read().map_err(|e| extraction_error(path, e))?;
                fs::write(&target, data)?;
                written += 1;
                rest
            } else {
                header.skip().map_err(|e| extraction_error(path, e))?
            };
        }

        Ok(written)
    }
}

#[async_trait]
impl Extractor for RarExtractor {
    fn new(archive: &Path) -> Self {
        Self {
            archive: archive.to_path_buf(),
        }
    }

    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Rar
    }

    fn archive(&self) -> &Path {
        &self.archive
    }

    async fn list_entries(&self) -> Result<Vec<String>> {
        run_blocking(&self.archive, |path| Self::list_blocking(&path)).await
    }

    async fn extract_all(&self, destination: &Path) -> Result<usize> {
        let destination = destination.to_path_buf();
        let written = run_blocking(&self.archive, move |path| {
            Self::extract_blocking(&path, &destination)
        })
        .await?;
        log::info!("Extracted {} entries from {:?}", written, self.archive);
        Ok(written)
    }
}
