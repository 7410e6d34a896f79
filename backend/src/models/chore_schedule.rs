use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for per-child chore schedules
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChoreScheduleRow {
    pub id: String,
    pub family_id: String,
    pub template_id: String,
    pub child_id: String,
    pub days_of_week: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChoreScheduleRow {
    pub fn to_shared(&self) -> shared::ChoreSchedule {
        shared::ChoreSchedule {
            id: Uuid::parse_str(&self.id).unwrap(),
            family_id: Uuid::parse_str(&self.family_id).unwrap(),
            template_id: Uuid::parse_str(&self.template_id).unwrap(),
            child_id: Uuid::parse_str(&self.child_id).unwrap(),
            days_of_week: serde_json::from_str(&self.days_of_week).unwrap_or_default(),
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
