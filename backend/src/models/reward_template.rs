use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use shared::RewardCategory;

/// Database model for reward templates
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RewardTemplateRow {
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub description: String,
    pub bucks_price: i64,
    pub category: String,
    pub quantity: i64,
    pub expires_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub available_to: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RewardTemplateRow {
    pub fn to_shared(&self) -> shared::RewardTemplate {
        let available_to: Vec<Uuid> =
            serde_json::from_str(&self.available_to).unwrap_or_default();

        shared::RewardTemplate {
            id: Uuid::parse_str(&self.id).unwrap(),
            family_id: Uuid::parse_str(&self.family_id).unwrap(),
            title: self.title.clone(),
            description: self.description.clone(),
            bucks_price: self.bucks_price,
            category: self.category.parse().unwrap_or(RewardCategory::Items),
            quantity: self.quantity,
            expires_at: self.expires_at,
            image_url: self.image_url.clone(),
            available_to,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
