use super::dispatcher::DispatchTarget;
use super::dto::{AudienceImageQuery, DispatchResponse, JobStatusResponse, TriggerImageQuery};
use crate::common::error::AppError;
use crate::common::response::{ApiResponse, ApiSuccess};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// Queue image generation for a brand's audiences that have no image yet
#[utoipa::path(
    post,
    path = "/api/v1/brands/{brand_id}/audiences/images",
    params(
        ("brand_id" = Uuid, Path, description = "Brand ID"),
        AudienceImageQuery
    ),
    responses(
        (status = 202, description = "Jobs scheduled", body = ApiResponse<DispatchResponse>),
        (status = 404, description = "No audiences for this brand"),
        (status = 503, description = "Queue unavailable")
    ),
    tag = "Images"
)]
pub async fn generate_audience_images(
    State(state): State<AppState>,
    Path(brand_id): Path<Uuid>,
    Query(query): Query<AudienceImageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let target = DispatchTarget::Audiences {
        audience_id: query.audience_id,
    };
    let tickets = state.dispatcher.dispatch(brand_id, target).await?;

    Ok(ApiSuccess::accepted(
        DispatchResponse::from(tickets),
        "Image generation scheduled",
    ))
}

/// Queue image generation for a brand's triggers that have no image yet
#[utoipa::path(
    post,
    path = "/api/v1/brands/{brand_id}/triggers/images",
    params(
        ("brand_id" = Uuid, Path, description = "Brand ID"),
        TriggerImageQuery
    ),
    responses(
        (status = 202, description = "Jobs scheduled", body = ApiResponse<DispatchResponse>),
        (status = 404, description = "No triggers for this brand"),
        (status = 503, description = "Queue unavailable")
    ),
    tag = "Images"
)]
pub async fn generate_trigger_images(
    State(state): State<AppState>,
    Path(brand_id): Path<Uuid>,
    Query(query): Query<TriggerImageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let target = DispatchTarget::Triggers {
        trigger_id: query.trigger_id,
    };
    let tickets = state.dispatcher.dispatch(brand_id, target).await?;

    Ok(ApiSuccess::accepted(
        DispatchResponse::from(tickets),
        "Image generation scheduled",
    ))
}

/// Poll an image job
#[utoipa::path(
    get,
    path = "/status/{job_id}",
    params(
        ("job_id" = String, Path, description = "Job ID returned at dispatch")
    ),
    responses(
        (status = 200, description = "Current job state; unknown ids read as PENDING", body = JobStatusResponse),
        (status = 503, description = "Result backend unavailable")
    ),
    tag = "Images"
)]
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobStatusResponse>, AppError> {
    let status = state.statuses.status(&job_id).await?;
    Ok(Json(status))
}
