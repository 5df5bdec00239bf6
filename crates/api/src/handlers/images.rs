//! Handlers for the image job resource.
//!
//! Routes:
//! - `POST /images/generations`       — submit a generate or edit job
//! - `GET  /images/generations/{id}`  — poll job status

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use caseforge_core::error::CoreError;
use caseforge_core::types::JobId;

use crate::error::{AppError, AppResult};
use crate::models::{JobStatusResponse, SubmitImageJob, SubmitImageJobResponse};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/images/generations
///
/// Validates the submission synchronously and dispatches it. The job id
/// comes back immediately; all outcome information arrives via polling.
pub async fn submit_image_job(
    State(state): State<AppState>,
    Json(input): Json<SubmitImageJob>,
) -> AppResult<impl IntoResponse> {
    let request = input.into_job_request().map_err(AppError::Core)?;
    let id = state.dispatcher.dispatch(request).await;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SubmitImageJobResponse { id },
        }),
    ))
}

/// GET /api/v1/images/generations/{id}
///
/// Returns the current snapshot of the job. An id that was never
/// dispatched is a 404 -- distinct from a job whose own status is `error`.
pub async fn get_image_job(
    State(state): State<AppState>,
    Path(job_id): Path<JobId>,
) -> AppResult<impl IntoResponse> {
    let record = state
        .jobs
        .get(job_id)
        .await
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Job",
            id: job_id,
        }))?;

    Ok(Json(DataResponse {
        data: JobStatusResponse::from(record),
    }))
}
