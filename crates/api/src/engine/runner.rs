//! Job runner: executes one job end-to-end and records its single terminal
//! outcome.
//!
//! Every failure path -- generation backend, storage, dimension probing,
//! the generation deadline -- is caught here and converted into the job's
//! terminal `error` state. Nothing escapes the task boundary, and the job
//! table is only ever touched once, after all external calls are over.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use caseforge_bedrock::{
    GeneratorError, ImageEditRequest, ImageGenerator, Mask, TextToImageRequest,
};
use caseforge_core::job::{JobOutcome, JobTable};
use caseforge_core::params;
use caseforge_core::types::{ImageRef, JobId};
use caseforge_storage::{ObjectStore, StorageError};
use tokio::sync::Semaphore;

use super::{JobRequest, MaskSpec};

/// Failures internal to a job run. The Display string becomes the job's
/// recorded error message.
#[derive(Debug, thiserror::Error)]
enum RunnerError {
    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Could not read dimensions of reference image '{key}': {reason}")]
    Dimensions { key: String, reason: String },

    #[error("Image generation timed out after {0} seconds")]
    Timeout(u64),

    #[error("Job execution pool is shut down")]
    PoolClosed,
}

/// Executes a single job. One runner is created per dispatched submission.
pub struct JobRunner {
    jobs: Arc<JobTable>,
    generator: Arc<dyn ImageGenerator>,
    store: Arc<dyn ObjectStore>,
    permits: Arc<Semaphore>,
    generation_timeout: Duration,
}

impl JobRunner {
    pub fn new(
        jobs: Arc<JobTable>,
        generator: Arc<dyn ImageGenerator>,
        store: Arc<dyn ObjectStore>,
        permits: Arc<Semaphore>,
        generation_timeout: Duration,
    ) -> Self {
        Self {
            jobs,
            generator,
            store,
            permits,
            generation_timeout,
        }
    }

    /// Run the job to its terminal state. Infallible by construction: any
    /// execution error becomes the job's `error` outcome.
    pub async fn run(self, id: JobId, request: JobRequest) {
        let outcome = match self.execute(&request).await {
            Ok(refs) => {
                tracing::info!(job_id = %id, images = refs.len(), "Image job completed");
                JobOutcome::Done(refs)
            }
            Err(e) => {
                tracing::warn!(job_id = %id, error = %e, "Image job failed");
                JobOutcome::Error(e.to_string())
            }
        };
        self.jobs.complete(id, outcome).await;
    }

    async fn execute(&self, request: &JobRequest) -> Result<Vec<ImageRef>, RunnerError> {
        // Queue-wait for an execution slot. The job stays visibly `queued`
        // while it waits; submission itself never blocked on this.
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| RunnerError::PoolClosed)?;

        let prompt = params::augment_prompt(&request.prompt, &request.extra_params);

        let outputs = if request.reference_images.is_empty() {
            self.run_generate(prompt, request).await?
        } else {
            self.run_edit(prompt, request).await?
        };

        // Persist in generation order; the reference sequence mirrors it.
        let mut refs = Vec::with_capacity(outputs.len());
        for bytes in &outputs {
            refs.push(self.store.put(bytes).await?);
        }
        Ok(refs)
    }

    /// Generate shape: text in, images out.
    async fn run_generate(
        &self,
        prompt: String,
        request: &JobRequest,
    ) -> Result<Vec<Vec<u8>>, RunnerError> {
        let backend_request = TextToImageRequest {
            prompt,
            batch_count: request.batch_count,
            height: request.height.unwrap_or(params::DEFAULT_IMAGE_SIZE),
            width: request.width.unwrap_or(params::DEFAULT_IMAGE_SIZE),
            cfg_scale: request.cfg_scale,
            seed: request.seed.unwrap_or(0),
        };
        self.with_deadline(self.generator.generate(&backend_request))
            .await
    }

    /// Edit shape: resolve references, derive missing dimensions from the
    /// first reference image, then run a variation or mask-guided edit.
    async fn run_edit(
        &self,
        prompt: String,
        request: &JobRequest,
    ) -> Result<Vec<Vec<u8>>, RunnerError> {
        let mut reference_images = Vec::with_capacity(request.reference_images.len());
        for key in &request.reference_images {
            reference_images.push(self.store.get(key).await?);
        }

        let (height, width) = match (request.height, request.width) {
            (Some(h), Some(w)) => (h, w),
            (h, w) => {
                let key = &request.reference_images[0];
                let (probed_w, probed_h) =
                    image_dimensions(&reference_images[0]).map_err(|reason| {
                        RunnerError::Dimensions {
                            key: key.clone(),
                            reason,
                        }
                    })?;
                (h.unwrap_or(probed_h), w.unwrap_or(probed_w))
            }
        };

        let mask = match &request.mask {
            Some(MaskSpec::Image(key)) => Some(Mask::Image(self.store.get(key).await?)),
            Some(MaskSpec::Prompt(text)) => Some(Mask::Prompt(text.clone())),
            None => None,
        };

        let backend_request = ImageEditRequest {
            prompt,
            negative_prompt: request.negative_prompt.clone(),
            reference_images,
            mask,
            batch_count: request.batch_count,
            height,
            width,
            cfg_scale: request.cfg_scale,
            seed: request.seed.unwrap_or(0),
            similarity_strength: request.similarity_strength,
        };
        self.with_deadline(self.generator.edit(&backend_request))
            .await
    }

    /// Bound a generation backend call with the configured deadline.
    async fn with_deadline<F>(&self, call: F) -> Result<Vec<Vec<u8>>, RunnerError>
    where
        F: std::future::Future<Output = Result<Vec<Vec<u8>>, GeneratorError>>,
    {
        match tokio::time::timeout(self.generation_timeout, call).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(RunnerError::Timeout(self.generation_timeout.as_secs())),
        }
    }
}

/// Read `(width, height)` from an image header without decoding pixels.
fn image_dimensions(bytes: &[u8]) -> Result<(u32, u32), String> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .into_dimensions()
        .map_err(|e| e.to_string())
}
