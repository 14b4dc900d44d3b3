use axum::Router;
use axum::routing::{get, post};
use crate::state::AppState;

pub mod dispatcher;
pub mod dto;
pub mod handler;
pub mod job;
pub mod persistence;
pub mod queue;
pub mod status;
pub mod worker;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/brands/{brand_id}/audiences/images", post(handler::generate_audience_images))
        .route("/brands/{brand_id}/triggers/images", post(handler::generate_trigger_images))
}

pub fn status_router() -> Router<AppState> {
    Router::new().route("/status/{job_id}", get(handler::get_job_status))
}
