use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::batch::{BatchOrchestrator, BatchReport};
use crate::error::{Error, Result};
use crate::extractor::open_extractor;
use crate::generator::PageOptions;
use crate::job::ConversionJob;
use crate::progress::{NoopProgress, ProgressSink, SharedProgress};
use crate::types::{ConversionReport, InputArchive};

/// Upper bound used when `max_concurrent_jobs` is 0 (automatic)
const MAX_AUTO_CONCURRENT_JOBS: usize = 4;

/// The cbz2pdf conversion configuration, built declaratively using the builder pattern.
///
/// This struct holds every setting that shapes a conversion: page geometry and encoding,
/// collection filters, batch concurrency, and the hooks a front-end uses to follow or
/// cancel a run. Once built it exposes the entry points:
///
/// - [`convert`](ConverterConfig::convert): one archive, boolean outcome
/// - [`try_convert`](ConverterConfig::try_convert): one archive, detailed report or typed error
/// - [`convert_many`](ConverterConfig::convert_many): many archives, per-input results and tally
/// - [`list_entries`](ConverterConfig::list_entries): archive listing without extraction
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use cbz2pdf::prelude::*;
/// let config = ConverterConfig::builder()
///     .dpi(150.0f32)
///     .jpeg_quality(85u8)
///     .alpha_background([255u8, 255, 255])
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Clone, derive_builder::Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
pub struct ConverterConfig {
    /// Resolution assumed for page images. A page is `pixels / dpi` inches on each side.
    #[builder(default = "100.0")]
    pub dpi: f32,

    /// JPEG quality (1-100) used to embed pages.
    #[builder(default = "90")]
    pub jpeg_quality: u8,

    /// Background colour for transparent pixels.
    ///
    /// `None` drops the alpha channel without compositing, so transparent areas keep
    /// whatever colour the image stores underneath (often black). Use `[255, 255, 255]`
    /// for print-like white pages.
    #[builder(default)]
    pub alpha_background: Option<[u8; 3]>,

    /// Ignore dot-prefixed files and directories inside archives (e.g. `__MACOSX/._001.jpg`
    /// resource forks).
    #[builder(default = "false")]
    pub skip_hidden_files: bool,

    /// How many archives a batch converts at the same time. `1` is strictly sequential;
    /// `0` picks a value from the number of CPUs.
    #[builder(default = "1")]
    pub max_concurrent_jobs: usize,

    /// Directory under which extraction workspaces are created. Defaults to the system
    /// temporary directory.
    #[builder(default)]
    pub workspace_root: Option<PathBuf>,

    /// Sink receiving progress and diagnostic events.
    #[builder(default)]
    pub progress: Option<SharedProgress>,

    /// Checked before each batch job starts; once set, remaining inputs are skipped.
    #[builder(default)]
    pub cancel_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for ConverterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterConfig")
            .field("dpi", &self.dpi)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("alpha_background", &self.alpha_background)
            .field("skip_hidden_files", &self.skip_hidden_files)
            .field("max_concurrent_jobs", &self.max_concurrent_jobs)
            .field("workspace_root", &self.workspace_root)
            .field(
                "progress",
                if self.progress.is_some() {
                    &"Some(ProgressSink)"
                } else {
                    &"None"
                },
            )
            .field("cancel_flag", &self.cancel_flag)
            .finish()
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            dpi: 100.0,
            jpeg_quality: 90,
            alpha_background: None,
            skip_hidden_files: false,
            max_concurrent_jobs: 1,
            workspace_root: None,
            progress: None,
            cancel_flag: None,
        }
    }
}

impl ConverterConfig {
    /// Creates a new builder for configuring `ConverterConfig`.
    pub fn builder() -> ConverterConfigBuilder {
        ConverterConfigBuilder::default()
    }

    /// Page rendering options derived from this configuration.
    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            dpi: self.dpi,
            jpeg_quality: self.jpeg_quality,
            alpha_background: self.alpha_background,
        }
    }

    /// The configured progress sink, or a no-op sink.
    pub fn progress_sink(&self) -> &dyn ProgressSink {
        match &self.progress {
            Some(sink) => sink.as_ref(),
            None => &NoopProgress,
        }
    }

    /// Number of batch jobs allowed to run at once.
    pub fn effective_concurrency(&self) -> usize {
        match self.max_concurrent_jobs {
            0 => num_cpus::get().clamp(1, MAX_AUTO_CONCURRENT_JOBS),
            n => n,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Converts one archive to PDF.
    ///
    /// `output` defaults to the input path with its extension replaced by `.pdf`. Every
    /// failure is logged and reported to the progress sink; the return value only says
    /// whether a PDF was written.
    ///
    /// ```rust,no_run
    /// # use cbz2pdf::prelude::*;
    /// # #[tokio::main]
    /// # async fn main() {
    /// let config = ConverterConfig::default();
    /// let ok = config.convert(Path::new("volume01.cbz"), None).await;
    /// println!("converted: {}", ok);
    /// # }
    /// ```
    pub async fn convert(&self, input: &Path, output: Option<&Path>) -> bool {
        ConversionJob::new(input, output, self)
            .convert()
            .await
            .success
    }

    /// Converts one archive and returns the detailed report, or the error of the stage
    /// that failed.
    pub async fn try_convert(&self, input: &Path, output: Option<&Path>) -> Result<ConversionReport> {
        ConversionJob::new(input, output, self).run().await
    }

    /// Converts every input, writing `<stem>.pdf` into `output_dir` or next to each input.
    ///
    /// One failing input never stops the batch. See [`BatchReport`] for the per-input map
    /// and the tally.
    ///
    /// ```rust,no_run
    /// # use cbz2pdf::prelude::*;
    /// # #[tokio::main]
    /// # async fn main() {
    /// let inputs = vec![PathBuf::from("a.cbz"), PathBuf::from("b.cbr")];
    /// let report = ConverterConfig::default()
    ///     .convert_many(&inputs, Some(Path::new("out")))
    ///     .await;
    /// println!("{}", report.summary());
    /// # }
    /// ```
    pub async fn convert_many(&self, inputs: &[PathBuf], output_dir: Option<&Path>) -> BatchReport {
        BatchOrchestrator::new(self).run(inputs, output_dir).await
    }

    /// Lists the non-directory entries of an archive without extracting it.
    pub async fn list_entries(&self, input: &Path) -> Result<Vec<String>> {
        let archive = InputArchive::from_path(input)?;
        if !input.exists() {
            return Err(Error::InputNotFound(input.to_path_buf()));
        }
        open_extractor(&archive)?.list_entries().await
    }

    /// Blocking form of [`convert`](ConverterConfig::convert) for callers without a runtime,
    /// such as a GUI worker thread. Must not be called from inside an async context.
    pub fn convert_blocking(&self, input: &Path, output: Option<&Path>) -> bool {
        match build_runtime() {
            Ok(runtime) => runtime.block_on(self.convert(input, output)),
            Err(e) => {
                log::error!("Could not start runtime to convert {:?}: {}", input, e);
                false
            }
        }
    }

    /// Blocking form of [`convert_many`](ConverterConfig::convert_many). Must not be called
    /// from inside an async context.
    pub fn convert_many_blocking(
        &self,
        inputs: &[PathBuf],
        output_dir: Option<&Path>,
    ) -> Result<BatchReport> {
        let runtime = build_runtime()?;
        Ok(runtime.block_on(self.convert_many(inputs, output_dir)))
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Error::Io)
}

impl ConverterConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(dpi) = self.dpi {
            if !dpi.is_finite() || dpi <= 0.0 {
                return Err(format!("Invalid dpi: {} (must be a positive number)", dpi));
            }
        }

        if let Some(quality) = self.jpeg_quality {
            if !(1..=100).contains(&quality) {
                return Err("JPEG quality must be between 1 and 100.".to_string());
            }
        }

        if let Some(Some(root)) = &self.workspace_root {
            if root.exists() && !root.is_dir() {
                return Err(format!("Workspace root {:?} is not a directory", root));
            }
        }

        Ok(())
    }
}
