use super::model::Audience;
use anyhow::{anyhow, Result};
use sqlx::PgPool;
use uuid::Uuid;

pub struct AudienceRepository;

impl AudienceRepository {
    /// All audiences of a brand, or just `audience_id` when given.
    pub async fn find_by_brand(
        pool: &PgPool,
        brand_id: Uuid,
        audience_id: Option<Uuid>,
    ) -> Result<Vec<Audience>> {
        let audiences = sqlx::query_as::<_, Audience>(
            r#"
            SELECT id, brand_id, name, description, image_prompt, image_url, created_at, updated_at
            FROM audiences
            WHERE brand_id = $1 AND ($2::uuid IS NULL OR id = $2)
            ORDER BY created_at ASC
            "#,
        )
        .bind(brand_id)
        .bind(audience_id)
        .fetch_all(pool)
        .await
        .map_err(|e| anyhow!("Failed to fetch audiences: {}", e))?;

        Ok(audiences)
    }

    /// Returns `false` when no audience has this id.
    pub async fn update_image_url(pool: &PgPool, id: Uuid, image_url: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE audiences SET image_url = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(image_url)
        .bind(id)
        .execute(pool)
        .await
        .map_err(|e| anyhow!("Failed to update audience image: {}", e))?;

        Ok(result.rows_affected() > 0)
    }
}
