//! Job dispatcher.
//!
//! Accepts a validated [`JobRequest`], mints the job id, registers the
//! queued record, and launches a [`JobRunner`](super::runner::JobRunner)
//! task -- returning the id without waiting on any of the job's external
//! calls. Execution concurrency is bounded by a semaphore: submissions are
//! always accepted immediately, but at most `max_concurrent_jobs` runners
//! hold a permit at once; the rest queue-wait inside their task.

use std::sync::Arc;
use std::time::Duration;

use caseforge_bedrock::ImageGenerator;
use caseforge_core::job::{JobRecord, JobTable};
use caseforge_core::params;
use caseforge_core::types::JobId;
use caseforge_storage::ObjectStore;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

use super::runner::JobRunner;
use super::JobRequest;

/// Spawns and tracks one runner task per accepted submission.
///
/// Created once at startup and shared behind an `Arc`.
pub struct JobDispatcher {
    jobs: Arc<JobTable>,
    generator: Arc<dyn ImageGenerator>,
    store: Arc<dyn ObjectStore>,
    /// Execution permits; taken by runners, not by `dispatch`.
    permits: Arc<Semaphore>,
    /// Tracks in-flight runner tasks so shutdown can drain them.
    tracker: TaskTracker,
    generation_timeout: Duration,
}

impl JobDispatcher {
    pub fn new(
        jobs: Arc<JobTable>,
        generator: Arc<dyn ImageGenerator>,
        store: Arc<dyn ObjectStore>,
        max_concurrent_jobs: usize,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            jobs,
            generator,
            store,
            permits: Arc::new(Semaphore::new(max_concurrent_jobs)),
            tracker: TaskTracker::new(),
            generation_timeout,
        }
    }

    /// Accept a job: mint an id, resolve the seed, register the queued
    /// record, and spawn the runner. Returns as soon as the record is
    /// registered -- never waits for the runner.
    pub async fn dispatch(&self, mut request: JobRequest) -> JobId {
        let id = uuid::Uuid::new_v4();

        // Seedless submissions get a random seed so repeated runs differ.
        let seed = request.seed.unwrap_or_else(params::random_seed);
        request.seed = Some(seed);

        self.jobs.insert(JobRecord::queued(id)).await;

        tracing::info!(
            job_id = %id,
            seed,
            batch_count = request.batch_count,
            references = request.reference_images.len(),
            "Image job accepted",
        );

        let runner = JobRunner::new(
            Arc::clone(&self.jobs),
            Arc::clone(&self.generator),
            Arc::clone(&self.store),
            Arc::clone(&self.permits),
            self.generation_timeout,
        );
        self.tracker.spawn(async move { runner.run(id, request).await });

        id
    }

    /// Number of runner tasks that have been spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Stop accepting tracked work and wait for in-flight runners to
    /// record their outcomes.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}
