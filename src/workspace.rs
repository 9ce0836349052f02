//! Scoped extraction workspace.
//!
//! A [`Workspace`] owns one temporary directory for the duration of a conversion job.
//! Dropping it removes the directory recursively, so every exit path of the job (success,
//! error return, or unwinding) cleans up without explicit calls.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{Error, Result};

const WORKSPACE_PREFIX: &str = "cbz2pdf-";

/// Temporary extraction directory exclusively owned by one job.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Creates a fresh directory under `root`, or under the system temp dir when `None`.
    pub fn create(root: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);

        let dir = match root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create extraction workspace: {}", e),
            ))
        })?;

        let path = dir.path().to_path_buf();
        log::debug!("Created workspace {:?}", path);
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the directory now and reports failures instead of swallowing them.
    pub fn close(mut self) -> Result<()> {
        match self.dir.take() {
            Some(dir) => {
                dir.close()?;
                log::debug!("Removed workspace {:?}", self.path);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            if let Err(e) = dir.close() {
                log::warn!("Failed to remove workspace {:?}: {}", self.path, e);
            } else {
                log::debug!("Removed workspace {:?}", self.path);
            }
        }
    }
}
