use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use cbz2pdf::prelude::*;

/// Convert comic book archives (CBZ/CBR) into PDF documents
#[derive(Parser)]
#[clap(name = "cbz2pdf", version)]
struct Args {
    /// The archives to convert
    #[clap(required = true)]
    inputs: Vec<PathBuf>,
    /// Directory for the generated PDFs (default: next to each input)
    #[clap(short, long)]
    output_dir: Option<PathBuf>,
    /// Resolution assumed for page images
    #[clap(long, default_value_t = 100.0)]
    dpi: f32,
    /// JPEG quality used to embed pages (1-100)
    #[clap(long, default_value_t = 90)]
    quality: u8,
    /// Number of archives converted at the same time (0 = automatic)
    #[clap(short, long, default_value_t = 1)]
    jobs: usize,
    /// Composite transparent pixels over white instead of dropping alpha
    #[clap(long)]
    white_background: bool,
    /// Print the entries of each archive instead of converting
    #[clap(long)]
    list: bool,
    /// More log output (-v info, -vv debug)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Prints one line per finished input.
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn on_job_complete(&self, progress: &BatchProgress) {
        println!(
            "[{}/{}] {} {}",
            progress.processed,
            progress.total,
            if progress.last_success { "ok    " } else { "FAILED" },
            progress.last_input.display()
        );
    }

    fn on_page_error(&self, input: &Path, image: &Path, reason: &str) {
        eprintln!(
            "warning: {}: skipped {}: {}",
            input.display(),
            image.display(),
            reason
        );
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut builder = ConverterConfig::builder();
    builder
        .dpi(args.dpi)
        .jpeg_quality(args.quality)
        .max_concurrent_jobs(args.jobs)
        .progress(Arc::new(ConsoleProgress) as SharedProgress);
    if args.white_background {
        builder.alpha_background([255u8, 255, 255]);
    }
    let config = builder.build()?;

    if args.list {
        for input in &args.inputs {
            println!("{}:", input.display());
            for entry in config.list_entries(input).await? {
                println!("  {}", entry);
            }
        }
        return Ok(());
    }

    let report = config
        .convert_many(&args.inputs, args.output_dir.as_deref())
        .await;

    for failure in report.failures() {
        eprintln!(
            "error: {}: {}",
            failure.input.display(),
            failure.error.as_deref().unwrap_or("unknown error")
        );
    }
    println!("{}", report.summary());

    if report.has_failures() || !report.skipped.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
