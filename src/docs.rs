use utoipa::OpenApi;
use crate::modules::images::dto::{DispatchResponse, JobStatusResponse};
use crate::modules::images::job::{EntityKind, JobState, JobTicket};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::images::handler::generate_audience_images,
        crate::modules::images::handler::generate_trigger_images,
        crate::modules::images::handler::get_job_status,
    ),
    components(
        schemas(
            DispatchResponse, JobStatusResponse, JobTicket, JobState, EntityKind,
        )
    ),
    tags(
        (name = "Images", description = "Background image generation for audiences and triggers")
    )
)]
pub struct ApiDoc;
