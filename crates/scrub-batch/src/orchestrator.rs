//! Batch orchestration under a wall-clock budget

use crate::config_loader::ConfigCache;
use crate::pipeline::FilePipeline;
use crate::settings::BatchSettings;
use crate::storage::ObjectStore;
use crate::types::{BatchJob, BatchReport, FileReference, ProcessingResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};

/// Runs batches of file references through the pipeline.
///
/// References are split into sub-batches of `sub_batch_size`, processed in
/// order. The wall-clock budget is checked before each sub-batch starts; once
/// it is spent the remaining references are reported as unprocessed rather
/// than failed. Inside a sub-batch at most `max_workers` files are in flight.
pub struct BatchOrchestrator {
    pipeline: Arc<FilePipeline>,
    settings: Arc<BatchSettings>,
}

impl BatchOrchestrator {
    pub fn new(store: Arc<dyn ObjectStore>, settings: BatchSettings, cache: Arc<ConfigCache>) -> Self {
        let settings = Arc::new(settings);
        Self {
            pipeline: Arc::new(FilePipeline::new(store, settings.clone(), cache)),
            settings,
        }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Process every reference the budget allows. Never fails; problems are
    /// reported per file or, when the batch cannot start, via
    /// [`BatchReport::aborted`].
    pub async fn run(&self, references: Vec<FileReference>) -> BatchReport {
        let total = references.len();

        if let Err(e) = self.settings.validate() {
            error!(error = %e, total, "Batch aborted before start");
            return BatchReport {
                results: Vec::new(),
                total,
                unprocessed: references,
                timed_out: false,
                aborted: Some(e.to_string()),
                elapsed: Duration::ZERO,
            };
        }

        let job = BatchJob::new(
            references,
            self.settings.sub_batch_size,
            self.settings.wall_clock_budget(),
        );
        let semaphore = Arc::new(Semaphore::new(self.settings.max_workers));
        let mut results = Vec::with_capacity(total);
        let mut unprocessed = Vec::new();
        let mut timed_out = false;

        info!(
            total,
            sub_batch_size = job.sub_batch_size,
            max_workers = self.settings.max_workers,
            budget_secs = job.wall_clock_budget.as_secs(),
            "Batch started"
        );

        for (index, chunk) in job.file_references.chunks(job.sub_batch_size).enumerate() {
            if !timed_out && job.budget_exhausted() {
                warn!(
                    sub_batch = index,
                    elapsed_ms = job.elapsed().as_millis() as u64,
                    "Time budget spent, stopping before next sub-batch"
                );
                timed_out = true;
            }
            if timed_out {
                unprocessed.extend_from_slice(chunk);
                continue;
            }

            let span = info_span!("sub_batch", index, size = chunk.len());
            let batch_results = self
                .run_sub_batch(chunk, &semaphore, job.started_at)
                .instrument(span)
                .await;
            results.extend(batch_results);
        }

        let report = BatchReport {
            results,
            total,
            unprocessed,
            timed_out,
            aborted: None,
            elapsed: job.elapsed(),
        };

        info!(
            total,
            succeeded = report.succeeded(),
            quarantined = report.quarantined(),
            errored = report.errored(),
            unprocessed = report.unprocessed.len(),
            timed_out,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Batch finished"
        );
        report
    }

    async fn run_sub_batch(
        &self,
        chunk: &[FileReference],
        semaphore: &Arc<Semaphore>,
        batch_started: DateTime<Utc>,
    ) -> Vec<ProcessingResult> {
        let handles: Vec<(FileReference, JoinHandle<ProcessingResult>)> = chunk
            .iter()
            .map(|reference| {
                let pipeline = self.pipeline.clone();
                let semaphore = semaphore.clone();
                let task_reference = reference.clone();
                let handle = tokio::spawn(
                    async move {
                        let _permit = semaphore.acquire_owned().await.ok();
                        pipeline.process(&task_reference, batch_started).await
                    }
                    .in_current_span(),
                );
                (reference.clone(), handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for (reference, handle) in handles {
            match handle.await {
                Ok(result) => results.push(result),
                Err(e) => {
                    error!(file = %reference, error = %e, "Worker failed");
                    results.push(ProcessingResult::error(reference, format!("Worker failed: {e}")));
                }
            }
        }
        results
    }
}
