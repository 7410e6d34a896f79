use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use shared::{Recurrence, TimeOfDay};

/// Database model for chore templates
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ChoreTemplateRow {
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub description: String,
    pub time_of_day: String,
    pub bucks_reward: i64,
    pub required: bool,
    pub recurrence: String,
    pub days_of_week: Option<String>,
    pub assigned_child_ids: String,
    pub icon_url: Option<String>,
    pub active: bool,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChoreTemplateRow {
    pub fn to_shared(&self) -> shared::ChoreTemplate {
        let days_of_week = self
            .days_of_week
            .as_ref()
            .and_then(|days| serde_json::from_str(days).ok());
        let assigned_child_ids: Vec<Uuid> =
            serde_json::from_str(&self.assigned_child_ids).unwrap_or_default();

        shared::ChoreTemplate {
            id: Uuid::parse_str(&self.id).unwrap(),
            family_id: Uuid::parse_str(&self.family_id).unwrap(),
            title: self.title.clone(),
            description: self.description.clone(),
            time_of_day: self.time_of_day.parse().unwrap_or(TimeOfDay::Anytime),
            bucks_reward: self.bucks_reward,
            required: self.required,
            recurrence: self.recurrence.parse().unwrap_or(Recurrence::Daily),
            days_of_week,
            assigned_child_ids,
            icon_url: self.icon_url.clone(),
            active: self.active,
            archived: self.archived,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chore_template_row_to_shared() {
        let now = Utc::now();
        let child_id = Uuid::new_v4();

        let row = ChoreTemplateRow {
            id: Uuid::new_v4().to_string(),
            family_id: Uuid::new_v4().to_string(),
            title: "Feed the dog".to_string(),
            description: "Two scoops".to_string(),
            time_of_day: "morning".to_string(),
            bucks_reward: 5,
            required: true,
            recurrence: "weekdays".to_string(),
            days_of_week: Some("[1,2,3,4,5]".to_string()),
            assigned_child_ids: format!("[\"{}\"]", child_id),
            icon_url: None,
            active: true,
            archived: false,
            created_at: now,
            updated_at: now,
        };

        let template = row.to_shared();

        assert_eq!(template.time_of_day, TimeOfDay::Morning);
        assert_eq!(template.recurrence, Recurrence::Weekdays);
        assert_eq!(template.days_of_week, Some(vec![1, 2, 3, 4, 5]));
        assert_eq!(template.assigned_child_ids, vec![child_id]);
        assert!(template.active);
        assert!(!template.archived);
    }
}
