//! A single archive-to-PDF conversion.
//!
//! [`ConversionJob`] walks one input through the stages in [`JobStage`]. The extraction
//! workspace is held by a [`Workspace`] guard, so it is removed on every way out of
//! [`ConversionJob::run`], including early returns through `?`.

use std::path::{Path, PathBuf};

use crate::assembler::PageAssembler;
use crate::collector::Collector;
use crate::converter::ConverterConfig;
use crate::error::{Error, Result};
use crate::extractor::open_extractor;
use crate::path_utils::default_output_path;
use crate::progress::ProgressSink;
use crate::types::{ConversionOutcome, ConversionReport, InputArchive, JobStage};
use crate::workspace::Workspace;

/// One conversion job, exclusively owning its workspace while it runs.
pub struct ConversionJob<'a> {
    input: PathBuf,
    output: PathBuf,
    config: &'a ConverterConfig,
    progress: &'a dyn ProgressSink,
    stage: JobStage,
}

impl<'a> ConversionJob<'a> {
    /// Prepares a job. `output` defaults to the input path with a `.pdf` extension.
    pub fn new(input: &Path, output: Option<&Path>, config: &'a ConverterConfig) -> Self {
        Self {
            input: input.to_path_buf(),
            output: output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| default_output_path(input)),
            config,
            progress: config.progress_sink(),
            stage: JobStage::Start,
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// The stage reached so far. After a failure this is the stage that failed.
    pub fn stage(&self) -> JobStage {
        self.stage
    }

    fn enter(&mut self, stage: JobStage) {
        self.stage = stage;
        log::debug!("{:?}: entering stage {}", self.input, stage);
        self.progress.on_job_stage(&self.input, stage);
    }

    /// Runs the job and returns the detailed report, or the error of the failing stage.
    pub async fn run(&mut self) -> Result<ConversionReport> {
        self.enter(JobStage::Start);
        log::info!("Starting conversion: {:?} -> {:?}", self.input, self.output);

        let archive = InputArchive::from_path(&self.input)?;
        match tokio::fs::metadata(&self.input).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => {
                return Err(Error::InvalidPath(
                    self.input.clone(),
                    "Input is not a regular file".to_string(),
                ));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::InputNotFound(self.input.clone()));
            }
            Err(e) => return Err(Error::Io(e)),
        }
        log::info!("Input format: {}", archive.kind());

        let extractor = open_extractor(&archive)?;
        let workspace = Workspace::create(self.config.workspace_root.as_deref())?;

        self.enter(JobStage::ExtractionPending);
        let entries_extracted = extractor.extract_all(workspace.path()).await?;
        self.enter(JobStage::Extracted);
        log::debug!(
            "Extracted {} entries from {:?} into {:?}",
            entries_extracted,
            self.input,
            workspace.path()
        );

        self.enter(JobStage::Collecting);
        let collected = Collector::new(workspace.path(), self.config.skip_hidden_files)
            .collect_images()
            .await?;
        log::info!(
            "Found {} image files in {:?}",
            collected.len(),
            self.input
        );
        if collected.is_empty() {
            return Err(Error::EmptyPageSet(self.input.clone()));
        }

        self.enter(JobStage::Assembling);
        let assembly = PageAssembler::new(self.config.page_options(), self.progress, &self.input)
            .assemble(&collected.pages, &self.output)
            .await?;

        drop(workspace);
        self.enter(JobStage::Done);
        log::info!(
            "Converted {:?}: {} pages ({} skipped)",
            self.input,
            assembly.pages_written,
            assembly.pages_skipped
        );

        Ok(ConversionReport {
            input: self.input.clone(),
            output: self.output.clone(),
            kind: archive.kind(),
            entries_extracted,
            assembly,
        })
    }

    /// Runs the job and reduces the result to a boolean outcome.
    ///
    /// Errors never escape: each one is logged with the input, the failing stage and the
    /// cause, and forwarded to the progress sink.
    pub async fn convert(mut self) -> ConversionOutcome {
        match self.run().await {
            Ok(report) => ConversionOutcome {
                input: report.input,
                output: report.output,
                success: true,
                error: None,
            },
            Err(e) => {
                let stage = self.stage;
                log::error!(
                    "Conversion of {:?} failed during {}: {}",
                    self.input,
                    stage,
                    e
                );
                self.progress
                    .on_job_error(&self.input, &stage.to_string(), &e.to_string());
                self.enter(JobStage::Done);
                ConversionOutcome {
                    input: self.input,
                    output: self.output,
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
