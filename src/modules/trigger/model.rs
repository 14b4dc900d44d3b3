use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Trigger {
    pub id: Uuid,
    pub audience_id: Uuid,
    pub name: String,
    pub description: String,
    pub image_prompt: String,
    pub trigger_img: Option<String>,
    pub territory: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
