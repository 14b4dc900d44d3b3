use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

pub const IMAGE_EXTENSION: &str = "png";

/// Record that receives the generated image reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Audience,
    Trigger,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Audience => "audience",
            EntityKind::Trigger => "trigger",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `B<brand>A<audience>img.png`
pub fn audience_file_name(brand_id: Uuid, audience_id: Uuid) -> String {
    format!("B{brand_id}A{audience_id}img.{IMAGE_EXTENSION}")
}

/// `B<brand>A<audience>T<trigger>img.png`
pub fn trigger_file_name(brand_id: Uuid, audience_id: Uuid, trigger_id: Uuid) -> String {
    format!("B{brand_id}A{audience_id}T{trigger_id}img.{IMAGE_EXTENSION}")
}

/// Payload of one image job. Never mutated after enqueue.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageJob {
    pub prompt: String,
    pub file_name: String,
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
}

/// Broker message: the job plus the id the queue assigned to it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: Uuid,
    pub job: ImageJob,
    #[serde(with = "time::serde::rfc3339")]
    pub enqueued_at: OffsetDateTime,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobState {
    Pending,
    Started,
    Retry,
    Success,
    Failure,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Success | JobState::Failure)
    }
}

/// What the result backend holds for a job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub state: JobState,
    /// Stored file name on success, error text on failure.
    pub result: Option<String>,
    #[serde(default)]
    pub attempts: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl JobRecord {
    pub fn new(state: JobState, result: Option<String>, attempts: u32) -> Self {
        Self {
            state,
            result,
            attempts,
            updated_at: OffsetDateTime::now_utc(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct JobTicket {
    pub job_id: Uuid,
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
    pub file_name: String,
}
