use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};
use uuid::Uuid;

use super::job::{audience_file_name, trigger_file_name, EntityKind, ImageJob, JobTicket};
use super::queue::{JobQueue, QueueError};

/// Which owning collection of a brand to scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchTarget {
    Audiences { audience_id: Option<Uuid> },
    Triggers { trigger_id: Option<Uuid> },
}

impl DispatchTarget {
    pub fn kind(&self) -> EntityKind {
        match self {
            DispatchTarget::Audiences { .. } => EntityKind::Audience,
            DispatchTarget::Triggers { .. } => EntityKind::Trigger,
        }
    }
}

/// An owning entity as the dispatcher sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageCandidate {
    pub kind: EntityKind,
    pub id: Uuid,
    /// The audience itself, or the audience a trigger belongs to.
    pub audience_id: Uuid,
    pub prompt: String,
    pub image_ref: Option<String>,
}

impl ImageCandidate {
    pub fn needs_image(&self) -> bool {
        self.image_ref
            .as_deref()
            .is_none_or(|reference| reference.trim().is_empty())
    }

    pub fn file_name(&self, brand_id: Uuid) -> String {
        match self.kind {
            EntityKind::Audience => audience_file_name(brand_id, self.id),
            EntityKind::Trigger => trigger_file_name(brand_id, self.audience_id, self.id),
        }
    }
}

#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn candidates(
        &self,
        brand_id: Uuid,
        target: DispatchTarget,
    ) -> anyhow::Result<Vec<ImageCandidate>>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("no {kind} found for brand {brand_id}")]
    NotFound { kind: EntityKind, brand_id: Uuid },

    #[error("failed to load candidates: {0}")]
    Source(anyhow::Error),

    #[error(transparent)]
    Queue(#[from] QueueError),
}

pub struct ImageDispatcher {
    source: Arc<dyn CandidateSource>,
    queue: Arc<dyn JobQueue>,
}

impl ImageDispatcher {
    pub fn new(source: Arc<dyn CandidateSource>, queue: Arc<dyn JobQueue>) -> Self {
        Self { source, queue }
    }

    /// Enqueues one job per entity that has no image yet.
    ///
    /// Nothing marks an entity as claimed, so calling this twice before the
    /// first jobs finish schedules the same entities twice.
    pub async fn dispatch(
        &self,
        brand_id: Uuid,
        target: DispatchTarget,
    ) -> Result<Vec<JobTicket>, DispatchError> {
        let candidates = self
            .source
            .candidates(brand_id, target)
            .await
            .map_err(DispatchError::Source)?;

        if candidates.is_empty() {
            return Err(DispatchError::NotFound {
                kind: target.kind(),
                brand_id,
            });
        }

        let total = candidates.len();
        let mut tickets = Vec::new();

        for candidate in candidates.into_iter().filter(ImageCandidate::needs_image) {
            let file_name = candidate.file_name(brand_id);
            let job = ImageJob {
                prompt: candidate.prompt,
                file_name: file_name.clone(),
                entity_kind: candidate.kind,
                entity_id: candidate.id,
            };

            let job_id = self.queue.enqueue(job).await.inspect_err(|e| {
                error!(
                    brand_id = %brand_id,
                    entity_id = %candidate.id,
                    scheduled = tickets.len(),
                    "❌ Failed to enqueue image job: {}", e
                );
            })?;

            tickets.push(JobTicket {
                job_id,
                entity_kind: candidate.kind,
                entity_id: candidate.id,
                file_name,
            });
        }

        info!(
            brand_id = %brand_id,
            kind = target.kind().as_str(),
            total,
            scheduled = tickets.len(),
            "Dispatched image jobs"
        );

        Ok(tickets)
    }
}
