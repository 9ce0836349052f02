//! Batch orchestration over many inputs.
//!
//! Every input gets its own [`ConversionJob`] and therefore its own workspace. A failing
//! input is recorded and the batch moves on; nothing short of the cancellation flag stops
//! the remaining inputs from running.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::converter::ConverterConfig;
use crate::job::ConversionJob;
use crate::path_utils::{default_output_path, output_path_in_dir};
use crate::progress::BatchProgress;
use crate::types::ConversionOutcome;

/// Aggregated result of [`ConverterConfig::convert_many`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct BatchReport {
    /// One outcome per processed input, in input order. Repeated inputs appear once.
    pub outcomes: Vec<ConversionOutcome>,
    /// Inputs never started because the batch was cancelled
    pub skipped: Vec<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BatchReport {
    /// Map of input path to success flag.
    pub fn results(&self) -> HashMap<PathBuf, bool> {
        self.outcomes
            .iter()
            .map(|o| (o.input.clone(), o.success))
            .collect()
    }

    /// Number of inputs that were processed (skipped inputs excluded).
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.success).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// One-line tally, e.g. "Converted 2 of 3 files successfully (1 failed)."
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Converted {} of {} files successfully",
            self.succeeded(),
            self.total()
        );
        if self.has_failures() {
            summary.push_str(&format!(" ({} failed)", self.failed()));
        }
        if !self.skipped.is_empty() {
            summary.push_str(&format!(", {} skipped after cancellation", self.skipped.len()));
        }
        summary.push('.');
        summary
    }
}

#[derive(Debug, Default)]
struct Tally {
    processed: usize,
    succeeded: usize,
    failed: usize,
}

/// A planned conversion: where it reads, where it writes, and why it cannot run if so.
struct JobPlan {
    index: usize,
    input: PathBuf,
    output: PathBuf,
    conflict: Option<String>,
}

/// Runs conversion jobs over a list of inputs.
pub struct BatchOrchestrator<'a> {
    config: &'a ConverterConfig,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(config: &'a ConverterConfig) -> Self {
        Self { config }
    }

    /// Computes one output path per distinct input.
    ///
    /// Repeated input paths are planned once. Distinct inputs whose output path is already
    /// claimed by an earlier input are flagged and will fail without running.
    fn plan(inputs: &[PathBuf], output_dir: Option<&Path>) -> Vec<JobPlan> {
        let mut seen_inputs = HashSet::new();
        let mut claimed = HashSet::new();
        let mut plans = Vec::with_capacity(inputs.len());

        for input in inputs {
            if !seen_inputs.insert(input.clone()) {
                log::warn!("Ignoring repeated input {:?}", input);
                continue;
            }
            let output = match output_dir {
                Some(dir) => output_path_in_dir(input, dir),
                None => default_output_path(input),
            };
            let conflict = if claimed.insert(output.clone()) {
                None
            } else {
                Some(format!(
                    "Output {:?} is already produced by another input",
                    output
                ))
            };
            let index = plans.len() + 1;
            plans.push(JobPlan {
                index,
                input: input.clone(),
                output,
                conflict,
            });
        }
        plans
    }

    /// Converts every input and reports the per-input outcomes.
    pub async fn run(&self, inputs: &[PathBuf], output_dir: Option<&Path>) -> BatchReport {
        let started_at = Utc::now();
        let config = self.config;
        let progress = config.progress_sink();
        let plans = Self::plan(inputs, output_dir);
        let total = plans.len();
        log::info!("Starting batch of {} files", total);
        progress.on_batch_start(total);

        if let Some(dir) = output_dir {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                log::error!("Could not create output directory {:?}: {}", dir, e);
            }
        }

        let semaphore = Arc::new(Semaphore::new(config.effective_concurrency()));
        let tally = Mutex::new(Tally::default());

        let jobs = plans.into_iter().map(|plan| {
            let semaphore = Arc::clone(&semaphore);
            let tally = &tally;
            async move {
                // Held until the job, including workspace cleanup, is finished
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        log::error!("Could not schedule {:?}: {}", plan.input, e);
                        return Err(plan.input);
                    }
                };
                if config.is_cancelled() {
                    log::warn!("Batch cancelled, skipping {:?}", plan.input);
                    return Err(plan.input);
                }

                progress.on_job_start(plan.index, total, &plan.input);
                log::info!(
                    "Converting {}/{}: {:?} -> {:?}",
                    plan.index,
                    total,
                    plan.input,
                    plan.output
                );

                let outcome = match plan.conflict {
                    Some(reason) => {
                        log::error!("Conversion of {:?} refused: {}", plan.input, reason);
                        progress.on_job_error(&plan.input, "planning", &reason);
                        ConversionOutcome {
                            input: plan.input,
                            output: plan.output,
                            success: false,
                            error: Some(reason),
                        }
                    }
                    None => {
                        ConversionJob::new(&plan.input, Some(&plan.output), config)
                            .convert()
                            .await
                    }
                };

                let snapshot = {
                    let mut tally = tally.lock().unwrap_or_else(|e| e.into_inner());
                    tally.processed += 1;
                    if outcome.success {
                        tally.succeeded += 1;
                    } else {
                        tally.failed += 1;
                    }
                    BatchProgress {
                        index: plan.index,
                        total,
                        processed: tally.processed,
                        succeeded: tally.succeeded,
                        failed: tally.failed,
                        last_input: outcome.input.clone(),
                        last_success: outcome.success,
                    }
                };
                progress.on_job_complete(&snapshot);
                Ok(outcome)
            }
        });

        let mut outcomes = Vec::with_capacity(total);
        let mut skipped = Vec::new();
        for result in join_all(jobs).await {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(input) => skipped.push(input),
            }
        }

        let report = BatchReport {
            outcomes,
            skipped,
            started_at,
            finished_at: Utc::now(),
        };
        progress.on_batch_complete(report.succeeded(), report.failed());
        if report.has_failures() {
            log::warn!("{}", report.summary());
        } else {
            log::info!("{}", report.summary());
        }
        report
    }
}
