use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::job::{JobState, JobTicket};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AudienceImageQuery {
    /// Restrict generation to this audience.
    pub audience_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TriggerImageQuery {
    /// Restrict generation to this trigger.
    pub trigger_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DispatchResponse {
    pub scheduled: usize,
    pub jobs: Vec<JobTicket>,
}

impl From<Vec<JobTicket>> for DispatchResponse {
    fn from(jobs: Vec<JobTicket>) -> Self {
        Self {
            scheduled: jobs.len(),
            jobs,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct JobStatusResponse {
    pub status: JobState,
    pub result: Option<String>,
}
