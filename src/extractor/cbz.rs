use crate::error::{Error, Result};
use crate::extractor::{Extractor, extraction_error, run_blocking};
use crate::types::ArchiveKind;
use async_trait::async_trait;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Extractor for ZIP containers (`.cbz`).
///
/// Entries are inflated by the `zip` crate and streamed straight to disk.
pub struct ZipExtractor {
    archive: PathBuf,
}

impl ZipExtractor {
    fn open_archive(path: &Path) -> Result<ZipArchive<BufReader<File>>> {
        let file = File::open(path).map_err(|e| extraction_error(path, e))?;
        ZipArchive::new(BufReader::new(file)).map_err(|e| extraction_error(path, e))
    }

    fn list_blocking(path: &Path) -> Result<Vec<String>> {
        let mut zip = Self::open_archive(path)?;
        let mut names = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let entry = zip.by_index(index)?;
            if !entry.is_dir() {
                names.push(entry.name().to_string());
            }
        }
        Ok(names)
    }

    fn extract_blocking(path: &Path, destination: &Path) -> Result<usize> {
        let mut zip = Self::open_archive(path)?;
        let total = zip.len();
        let mut written = 0;

        for index in 0..total {
            let mut entry = zip.by_index(index)?;
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            log::debug!("Extracting entry {}/{}: {}", index + 1, total, name);
            let relative = entry.enclosed_name().ok_or_else(|| {
                Error::InvalidPath(
                    PathBuf::from(&name),
                    "Archive entry escapes the extraction directory".to_string(),
                )
            })?;
            let target = destination.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }

            let mut out = BufWriter::new(File::create(&target)?);
            std::io::copy(&mut entry, &mut out)?;
            out.flush()?;
            written += 1;
        }

        Ok(written)
    }
}

#[async_trait]
impl Extractor for ZipExtractor {
    fn new(archive: &Path) -> Self {
        Self {
            archive: archive.to_path_buf(),
        }
    }

    fn kind(&self) -> ArchiveKind {
        ArchiveKind::Zip
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
