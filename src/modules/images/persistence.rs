use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use super::dispatcher::{CandidateSource, DispatchTarget, ImageCandidate};
use super::job::EntityKind;
use crate::infrastructure::db::pool::DbPool;
use crate::modules::audience::repository::AudienceRepository;
use crate::modules::trigger::repository::TriggerRepository;

/// Single-field write-back of a generated image onto its owning entity.
#[async_trait]
pub trait ImageReferenceStore: Send + Sync {
    /// `Ok(false)` means the entity no longer exists; nothing was written.
    async fn set_image_reference(
        &self,
        kind: EntityKind,
        entity_id: Uuid,
        file_name: &str,
    ) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgImageReferences {
    db: DbPool,
}

impl PgImageReferences {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ImageReferenceStore for PgImageReferences {
    async fn set_image_reference(
        &self,
        kind: EntityKind,
        entity_id: Uuid,
        file_name: &str,
    ) -> anyhow::Result<bool> {
        let updated = match kind {
            EntityKind::Audience => {
                AudienceRepository::update_image_url(&self.db, entity_id, file_name).await?
            }
            EntityKind::Trigger => {
                TriggerRepository::update_trigger_img(&self.db, entity_id, file_name).await?
            }
        };

        if updated {
            info!(%kind, %entity_id, %file_name, "Image reference saved");
        } else {
            warn!(%kind, %entity_id, %file_name, "Owning entity is gone, image reference not saved");
        }

        Ok(updated)
    }
}

#[derive(Clone)]
pub struct PgCandidateSource {
    db: DbPool,
}

impl PgCandidateSource {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CandidateSource for PgCandidateSource {
    async fn candidates(
        &self,
        brand_id: Uuid,
        target: DispatchTarget,
    ) -> anyhow::Result<Vec<ImageCandidate>> {
        let candidates = match target {
            DispatchTarget::Audiences { audience_id } => {
                AudienceRepository::find_by_brand(&self.db, brand_id, audience_id)
                    .await?
                    .into_iter()
                    .map(|audience| ImageCandidate {
                        kind: EntityKind::Audience,
                        id: audience.id,
                        audience_id: audience.id,
                        prompt: audience.prompt(),
                        image_ref: audience.image_url,
                    })
                    .collect()
            }
            DispatchTarget::Triggers { trigger_id } => {
                TriggerRepository::find_by_brand(&self.db, brand_id, trigger_id)
                    .await?
                    .into_iter()
                    .map(|trigger| ImageCandidate {
                        kind: EntityKind::Trigger,
                        id: trigger.id,
                        audience_id: trigger.audience_id,
                        prompt: trigger.image_prompt,
                        image_ref: trigger.trigger_img,
                    })
                    .collect()
            }
        };

        Ok(candidates)
    }
}
