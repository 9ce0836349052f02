//! Progress reporting for conversion jobs and batches.
//!
//! The core never touches presentation state. Instead it calls an injected
//! [`ProgressSink`] as work advances. Implement the trait directly for callback-style
//! integration, or use [`ChannelProgress`] to receive [`ProgressEvent`] values on a Tokio
//! channel from another thread or task.
//!
//! ```rust
//! use cbz2pdf::progress::{BatchProgress, ProgressSink};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Tally(AtomicUsize);
//!
//! impl ProgressSink for Tally {
//!     fn on_job_complete(&self, progress: &BatchProgress) {
//!         self.0.store(progress.processed, Ordering::SeqCst);
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::types::JobStage;

/// Running totals of a batch, sent after every finished job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BatchProgress {
    /// 1-based index of the input that just finished
    pub index: usize,
    pub total: usize,
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub last_input: PathBuf,
    pub last_success: bool,
}

/// Receives progress and diagnostic events from the pipeline.
///
/// All methods default to no-ops. Implementations must be `Send + Sync`: with
/// `max_concurrent_jobs > 1` events for different inputs arrive from different tasks.
pub trait ProgressSink: Send + Sync {
    /// Called once before the first job of a batch starts.
    fn on_batch_start(&self, total: usize) {
        let _ = total;
    }

    /// Called when a job for `input` starts. `index` is 1-based.
    fn on_job_start(&self, index: usize, total: usize, input: &Path) {
        let _ = (index, total, input);
    }

    /// Called whenever a job moves to another stage. A failed job ends in `Done` right
    /// after [`on_job_error`](ProgressSink::on_job_error).
    fn on_job_stage(&self, input: &Path, stage: JobStage) {
        let _ = (input, stage);
    }

    /// Called after each page is appended to the document.
    fn on_page_rendered(&self, input: &Path, page: usize, total_pages: usize) {
        let _ = (input, page, total_pages);
    }

    /// Called when a page is skipped because it could not be decoded or rendered.
    fn on_page_error(&self, input: &Path, image: &Path, error: &str) {
        let _ = (input, image, error);
    }

    /// Called when a job fails, with the stage name and cause.
    fn on_job_error(&self, input: &Path, stage: &str, error: &str) {
        let _ = (input, stage, error);
    }

    /// Called after every job with the updated batch totals.
    fn on_job_complete(&self, progress: &BatchProgress) {
        let _ = progress;
    }

    /// Called once after all inputs have been processed or skipped.
    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        let _ = (succeeded, failed);
    }
}

/// A sink that ignores every event. Used when no sink is configured.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {}

/// Shared handle to a sink, as stored in the converter configuration.
pub type SharedProgress = Arc<dyn ProgressSink>;

/// Progress events as delivered by [`ChannelProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    BatchStarted {
        total: usize,
    },
    JobStarted {
        index: usize,
        total: usize,
        input: PathBuf,
    },
    StageChanged {
        input: PathBuf,
        stage: JobStage,
    },
    PageRendered {
        input: PathBuf,
        page: usize,
        total_pages: usize,
    },
    PageFailed {
        input: PathBuf,
        image: PathBuf,
        error: String,
    },
    JobFailed {
        input: PathBuf,
        stage: String,
        error: String,
    },
    JobFinished(BatchProgress),
    BatchFinished {
        succeeded: usize,
        failed: usize,
    },
}

/// Forwards every event into an unbounded Tokio channel.
///
/// Sending never blocks the pipeline; events are dropped silently once the receiver is gone.
pub struct ChannelProgress {
    sender: UnboundedSender<ProgressEvent>,
}

impl ChannelProgress {
    /// Creates the sink and the receiving half of its channel.
    pub fn new() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = unbounded_channel();
        (Self { sender }, receiver)
    }

    fn send(&self, event: ProgressEvent) {
        let _ = self.sender.send(event);
    }
}

impl ProgressSink for ChannelProgress {
    fn on_batch_start(&self, total: usize) {
        self.send(ProgressEvent::BatchStarted { total });
    }

    fn on_job_start(&self, index: usize, total: usize, input: &Path) {
        self.send(ProgressEvent::JobStarted {
            index,
            total,
            input: input.to_path_buf(),
        });
    }

    fn on_job_stage(&self, input: &Path, stage: JobStage) {
        self.send(ProgressEvent::StageChanged {
            input: input.to_path_buf(),
            stage,
        });
    }

    fn on_page_rendered(&self, input: &Path, page: usize, total_pages: usize) {
        self.send(ProgressEvent::PageRendered {
            input: input.to_path_buf(),
            page,
            total_pages,
        });
    }

    fn on_page_error(&self, input: &Path, image: &Path, error: &str) {
        self.send(ProgressEvent::PageFailed {
            input: input.to_path_buf(),
            image: image.to_path_buf(),
            error: error.to_string(),
        });
    }

    fn on_job_error(&self, input: &Path, stage: &str, error: &str) {
        self.send(ProgressEvent::JobFailed {
            input: input.to_path_buf(),
            stage: stage.to_string(),
            error: error.to_string(),
        });
    }

    fn on_job_complete(&self, progress: &BatchProgress) {
        self.send(ProgressEvent::JobFinished(progress.clone()));
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        self.send(ProgressEvent::BatchFinished { succeeded, failed });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_progress_forwards_events() {
        let (sink, mut receiver) = ChannelProgress::new();
        sink.on_batch_start(2);
        sink.on_page_error(Path::new("a.cbz"), Path::new("001.png"), "bad header");
        sink.on_batch_complete(1, 1);

        assert_eq!(
            receiver.try_recv().unwrap(),
            ProgressEvent::BatchStarted { total: 2 }
        );
        assert_eq!(
            receiver.try_recv().unwrap(),
            ProgressEvent::PageFailed {
                input: PathBuf::from("a.cbz"),
                image: PathBuf::from("001.png"),
                error: "bad header".to_string(),
            }
        );
        assert_eq!(
            receiver.try_recv().unwrap(),
            ProgressEvent::BatchFinished {
                succeeded: 1,
                failed: 1
            }
        );
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_channel_progress_survives_dropped_receiver() {
        let (sink, receiver) = ChannelProgress::new();
        drop(receiver);
        sink.on_batch_start(3);
    }
}
