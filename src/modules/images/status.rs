use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use super::dto::JobStatusResponse;
use super::job::JobState;
use super::queue::{QueueError, ResultBackend};

/// Read-only view over the result backend.
pub struct StatusService {
    backend: Arc<dyn ResultBackend>,
}

impl StatusService {
    pub fn new(backend: Arc<dyn ResultBackend>) -> Self {
        Self { backend }
    }

    /// Ids the backend has never seen (malformed ones included) report `PENDING`.
    /// A finished job can also still read `PENDING` if its record expired.
    pub async fn status(&self, raw_id: &str) -> Result<JobStatusResponse, QueueError> {
        let Ok(job_id) = Uuid::parse_str(raw_id.trim()) else {
            debug!(job_id = %raw_id, "Status requested for malformed job id");
            return Ok(JobStatusResponse::pending());
        };

        let response = match self.backend.load(job_id).await? {
            Some(record) => JobStatusResponse {
                status: record.state,
                result: record.result,
            },
            None => JobStatusResponse::pending(),
        };

        Ok(response)
    }
}

impl JobStatusResponse {
    pub fn pending() -> Self {
        Self {
            status: JobState::Pending,
            result: None,
        }
    }
}
