use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use shared::ChoreStatus;

/// Database model for dated chore instances
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChoreInstanceRow {
    pub id: String,
    pub family_id: String,
    pub template_id: String,
    pub schedule_id: Option<String>,
    pub child_id: String,
    pub date: NaiveDate,
    pub status: String,
    pub bucks_awarded: i64,
    pub mood: Option<String>,
    pub effort: Option<i32>,
    pub photo_url: Option<String>,
    pub note: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChoreInstanceRow {
    pub fn to_shared(&self) -> shared::ChoreInstance {
        shared::ChoreInstance {
            id: Uuid::parse_str(&self.id).unwrap(),
            family_id: Uuid::parse_str(&self.family_id).unwrap(),
            template_id: Uuid::parse_str(&self.template_id).unwrap(),
            schedule_id: self
                .schedule_id
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            child_id: Uuid::parse_str(&self.child_id).unwrap(),
            date: self.date,
            status: self.status.parse().unwrap_or(ChoreStatus::Pending),
            bucks_awarded: self.bucks_awarded,
            mood: self.mood.clone(),
            effort: self.effort,
            photo_url: self.photo_url.clone(),
            note: self.note.clone(),
            completed_at: self.completed_at,
            reviewed_by: self
                .reviewed_by
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            reviewed_at: self.reviewed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chore_instance_row_to_shared() {
        let now = Utc::now();
        let row = ChoreInstanceRow {
            id: Uuid::new_v4().to_string(),
            family_id: Uuid::new_v4().to_string(),
            template_id: Uuid::new_v4().to_string(),
            schedule_id: None,
            child_id: Uuid::new_v4().to_string(),
            date: now.date_naive(),
            status: "approved".to_string(),
            bucks_awarded: 5,
            mood: Some("happy".to_string()),
            effort: Some(4),
            photo_url: None,
            note: None,
            completed_at: Some(now),
            reviewed_by: None,
            reviewed_at: None,
            created_at: now,
            updated_at: now,
        };

        let instance = row.to_shared();
        assert_eq!(instance.status, ChoreStatus::Approved);
        assert_eq!(instance.bucks_awarded, 5);
        assert!(instance.schedule_id.is_none());
        assert_eq!(instance.mood.as_deref(), Some("happy"));
    }
}
