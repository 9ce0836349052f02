//! cbz2pdf - Comic Book Archive to PDF Conversion Library
//!
//! This crate converts comic book archives (CBZ, a ZIP of page images, and CBR, a RAR of
//! page images) into PDF documents with one page per image. Pages are ordered by natural
//! filename order, so `page2.jpg` comes before `page10.jpg`.
//!
//! # Getting Started
//!
//! Build a `ConverterConfig` via its builder, then call one of the conversion methods.
//!
//! ```rust,no_run
//! use cbz2pdf::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> cbz2pdf::error::Result<()> {
//!     // 1. Configure the conversion
//!     let config = ConverterConfig::builder()
//!         .dpi(150.0f32)
//!         .alpha_background([255u8, 255, 255])
//!         .max_concurrent_jobs(2usize)
//!         .build()?;
//!
//!     // 2. Convert a single archive next to itself (volume01.pdf)
//!     let ok = config.convert(Path::new("volume01.cbz"), None).await;
//!     println!("volume01: {}", if ok { "converted" } else { "failed" });
//!
//!     // 3. Or convert a batch into an output directory
//!     let inputs = vec![PathBuf::from("volume02.cbz"), PathBuf::from("volume03.cbr")];
//!     let report = config.convert_many(&inputs, Some(Path::new("./pdf"))).await;
//!     println!("{}", report.summary());
//!
//!     Ok(())
//! }
//! ```
//!
//! Per-input failures never abort a batch, and every extraction workspace is removed
//! whether its conversion succeeded or not. Use [`ConverterConfig::try_convert`] when the
//! typed [`error::Error`] of a single conversion is needed.

pub mod assembler;
pub mod batch;
pub mod collector;
pub mod converter;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod job;
pub mod path_utils;
pub mod progress;
pub mod types;
pub mod workspace;

// Publicly expose the main `ConverterConfig` struct and its builder
pub use converter::ConverterConfig;
pub use converter::ConverterConfigBuilder;

// Re-export reports and core types for direct access
pub use batch::BatchReport;
pub use progress::{BatchProgress, ChannelProgress, ProgressEvent, ProgressSink, SharedProgress};
pub use types::{
    ArchiveKind, AssemblyReport, ConversionOutcome, ConversionReport, InputArchive, JobStage,
};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and traits, allowing you to
/// import everything you need with a single `use cbz2pdf::prelude::*;` statement.
pub mod prelude {
    pub use super::{
        ArchiveKind, AssemblyReport, BatchProgress, BatchReport, ChannelProgress,
        ConversionOutcome, ConversionReport, ConverterConfig, ConverterConfigBuilder,
        InputArchive, JobStage, ProgressEvent, ProgressSink, SharedProgress, error, types,
    };
    pub use crate::path_utils::{compare_natural, natural_sort_key};
    pub use std::path::{Path, PathBuf};
    pub use std::sync::Arc;
}
