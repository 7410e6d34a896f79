use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use shared::StoryKind;

/// Database model for family story feed entries
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StoryEntryRow {
    pub id: String,
    pub family_id: String,
    pub kind: String,
    pub source_id: Option<String>,
    pub title: String,
    pub description: String,
    pub photo_urls: String,
    pub child_id: Option<String>,
    pub child_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StoryEntryRow {
    pub fn to_shared(&self) -> shared::StoryEntry {
        shared::StoryEntry {
            id: Uuid::parse_str(&self.id).unwrap(),
            family_id: Uuid::parse_str(&self.family_id).unwrap(),
            kind: self.kind.parse().unwrap_or(StoryKind::General),
            source_id: self
                .source_id
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            title: self.title.clone(),
            description: self.description.clone(),
            photo_urls: serde_json::from_str(&self.photo_urls).unwrap_or_default(),
            child_id: self.child_id.as_ref().and_then(|id| Uuid::parse_str(id).ok()),
            child_name: self.child_name.clone(),
            created_at: self.created_at,
        }
    }
}
