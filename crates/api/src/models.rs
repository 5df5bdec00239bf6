//! Request/response DTOs for the image job endpoints.

use caseforge_core::error::CoreError;
use caseforge_core::job::{JobRecord, JobStatus};
use caseforge_core::params::{self, ExtraParams};
use caseforge_core::types::{ImageRef, JobId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::engine::{JobRequest, MaskSpec};

/// DTO for submitting a new image job via `POST /api/v1/images/generations`.
///
/// Supplying `reference_images` switches the job to the edit/variation
/// shape; a mask (image key or textual description) further selects the
/// mask-guided edit mode. `parameters` is free-form: `height`/`width` are
/// consumed structurally, everything else is folded into the prompt.
#[derive(Debug, Deserialize)]
pub struct SubmitImageJob {
    pub prompt: String,
    #[serde(default)]
    pub reference_images: Vec<ImageRef>,
    pub batch_count: Option<u32>,
    pub cfg_scale: Option<f64>,
    pub seed: Option<i64>,
    pub negative_prompt: Option<String>,
    /// Storage key of an explicit mask image.
    pub mask_image: Option<ImageRef>,
    /// Natural-language description of the region to edit.
    pub mask_prompt: Option<String>,
    pub similarity_strength: Option<f64>,
    #[serde(default)]
    pub parameters: ExtraParams,
}

impl SubmitImageJob {
    /// Validate the submission and resolve it into an engine [`JobRequest`].
    ///
    /// All validation happens here, synchronously, before any job record
    /// exists -- a rejected submission leaves no trace in the job table.
    pub fn into_job_request(self) -> Result<JobRequest, CoreError> {
        params::validate_prompt(&self.prompt)?;

        let batch_count = self.batch_count.unwrap_or(params::DEFAULT_BATCH_COUNT);
        params::validate_batch_count(batch_count)?;

        let cfg_scale = self.cfg_scale.unwrap_or(params::DEFAULT_CFG_SCALE);
        params::validate_cfg_scale(cfg_scale)?;

        if let Some(seed) = self.seed {
            params::validate_seed(seed)?;
        }

        let height = params::extract_dimension(&self.parameters, "height");
        let width = params::extract_dimension(&self.parameters, "width");
        if let Some(height) = height {
            params::validate_dimension("height", height)?;
        }
        if let Some(width) = width {
            params::validate_dimension("width", width)?;
        }

        let similarity_strength = self
            .similarity_strength
            .unwrap_or(params::DEFAULT_SIMILARITY_STRENGTH);
        params::validate_similarity_strength(similarity_strength)?;

        let mask = match (self.mask_image, self.mask_prompt) {
            (Some(_), Some(_)) => {
                return Err(CoreError::Validation(
                    "mask_image and mask_prompt are mutually exclusive".to_string(),
                ));
            }
            (Some(key), None) => Some(MaskSpec::Image(key)),
            (None, Some(text)) => Some(MaskSpec::Prompt(text)),
            (None, None) => None,
        };
        if mask.is_some() && self.reference_images.is_empty() {
            return Err(CoreError::Validation(
                "a mask requires at least one reference image".to_string(),
            ));
        }
        if self.reference_images.iter().any(|key| key.trim().is_empty()) {
            return Err(CoreError::Validation(
                "reference image keys must not be empty".to_string(),
            ));
        }

        Ok(JobRequest {
            prompt: self.prompt,
            negative_prompt: self.negative_prompt,
            reference_images: self.reference_images,
            mask,
            batch_count,
            height,
            width,
            cfg_scale,
            seed: self.seed,
            similarity_strength,
            extra_params: self.parameters,
        })
    }
}

/// Response for an accepted submission: just the id to poll with.
#[derive(Debug, Serialize)]
pub struct SubmitImageJobResponse {
    pub id: JobId,
}

/// Snapshot of a job returned by `GET /api/v1/images/generations/{id}`.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Vec<ImageRef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub submitted_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Timestamp>,
}

impl From<JobRecord> for JobStatusResponse {
    fn from(record: JobRecord) -> Self {
        Self {
            id: record.id,
            status: record.status,
            result: record.result,
            error: record.error,
            submitted_at: record.submitted_at,
            completed_at: record.completed_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn submission(body: serde_json::Value) -> SubmitImageJob {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn minimal_submission_resolves_with_defaults() {
        let request = submission(json!({ "prompt": "a tower case" }))
            .into_job_request()
            .unwrap();

        assert_eq!(request.batch_count, params::DEFAULT_BATCH_COUNT);
        assert_eq!(request.cfg_scale, params::DEFAULT_CFG_SCALE);
        assert_eq!(request.seed, None);
        assert_eq!(request.height, None);
        assert!(request.reference_images.is_empty());
        assert!(request.mask.is_none());
    }

    #[test]
    fn dimensions_come_from_free_form_parameters() {
        let request = submission(json!({
            "prompt": "case",
            "parameters": { "height": 512, "width": 768, "color": "red" }
        }))
        .into_job_request()
        .unwrap();

        assert_eq!(request.height, Some(512));
        assert_eq!(request.width, Some(768));
        // The non-reserved key stays for prompt folding.
        assert!(request.extra_params.contains_key("color"));
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let err = submission(json!({ "prompt": "  " }))
            .into_job_request()
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn out_of_range_batch_count_is_rejected() {
        let err = submission(json!({ "prompt": "case", "batch_count": 0 }))
            .into_job_request()
            .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn conflicting_masks_are_rejected() {
        let err = submission(json!({
            "prompt": "case",
            "reference_images": ["images/a.png"],
            "mask_image": "images/mask.png",
            "mask_prompt": "the front panel"
        }))
        .into_job_request()
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn mask_without_references_is_rejected() {
        let err = submission(json!({
            "prompt": "case",
            "mask_prompt": "the front panel"
        }))
        .into_job_request()
        .unwrap_err();
        assert_matches!(err, CoreError::Validation(_));
    }

    #[test]
    fn mask_prompt_selects_prompt_mask() {
        let request = submission(json!({
            "prompt": "case",
            "reference_images": ["images/a.png"],
            "mask_prompt": "the mesh front"
        }))
        .into_job_request()
        .unwrap();
        assert_matches!(request.mask, Some(MaskSpec::Prompt(ref text)) if text == "the mesh front");
    }
}
