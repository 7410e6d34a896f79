use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use shared::{Attendee, DocumentRef, EventStatus, EventType};

/// Database model for calendar events
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub event_type: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub timezone: String,
    pub child_id: Option<String>,
    pub child_name: Option<String>,
    pub attending_parent_id: Option<String>,
    pub attendees: String,
    pub linked_documents: String,
    pub created_by: String,
    pub last_modified_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EventRow {
    pub fn to_shared(&self) -> shared::Event {
        let attendees: Vec<Attendee> =
            serde_json::from_str(&self.attendees).unwrap_or_default();
        let linked_documents: Vec<DocumentRef> =
            serde_json::from_str(&self.linked_documents).unwrap_or_default();

        shared::Event {
            id: Uuid::parse_str(&self.id).unwrap(),
            family_id: Uuid::parse_str(&self.family_id).unwrap(),
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            event_type: self.event_type.parse().unwrap_or(EventType::General),
            status: self.status.parse().unwrap_or(EventStatus::Confirmed),
            start_time: self.start_time,
            end_time: self.end_time,
            timezone: self.timezone.clone(),
            child_id: self.child_id.as_ref().and_then(|id| Uuid::parse_str(id).ok()),
            child_name: self.child_name.clone(),
            attending_parent_id: self
                .attending_parent_id
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            attendees,
            linked_documents,
            created_by: Uuid::parse_str(&self.created_by).unwrap(),
            last_modified_by: self
                .last_modified_by
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
