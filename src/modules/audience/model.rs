use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Audience {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_prompt: Option<String>,
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Audience {
    /// The stored prompt, else the description, else the name.
    pub fn prompt(&self) -> String {
        [&self.image_prompt, &self.description]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .unwrap_or(self.name.as_str())
            .to_string()
    }
}
