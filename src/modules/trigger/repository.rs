use super::model::Trigger;
use anyhow::{anyhow, Result};
use sqlx::PgPool;
use uuid::Uuid;

pub struct TriggerRepository;

impl TriggerRepository {
    /// Triggers of every audience owned by the brand, or just `trigger_id` when given.
    pub async fn find_by_brand(
        pool: &PgPool,
        brand_id: Uuid,
        trigger_id: Option<Uuid>,
    ) -> Result<Vec<Trigger>> {
        let triggers = sqlx::query_as::<_, Trigger>(
            r#"
            SELECT t.id, t.audience_id, t.name, t.description, t.image_prompt,
                   t.trigger_img, t.territory, t.created_at, t.updated_at
            FROM triggers t
            JOIN audiences a ON a.id = t.audience_id
            WHERE a.brand_id = $1 AND ($2::uuid IS NULL OR t.id = $2)
            ORDER BY t.created_at ASC
            "#,
        )
        .bind(brand_id)
        .bind(trigger_id)
        .fetch_all(pool)
        .await
        .map_err(|e| anyhow!("Failed to fetch triggers: {}", e))?;

        Ok(triggers)
    }

    /// Returns `false` when no trigger has this id.
    pub async fn update_trigger_img(pool: &PgPool, id: Uuid, image_url: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE triggers SET trigger_img = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(image_url)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| anyhow!("Failed to update trigger image: {}", e))?;

        Ok(result.rows_affected() > 0)
    }
}
