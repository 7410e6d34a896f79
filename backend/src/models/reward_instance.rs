use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use shared::{RewardMemories, RewardStatus};

/// Database model for reward redemption instances
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct RewardInstanceRow {
    pub id: String,
    pub family_id: String,
    pub template_id: String,
    pub child_id: String,
    pub status: String,
    pub bucks_price: i64,
    pub request_notes: String,
    pub requested_at: DateTime<Utc>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_notes: Option<String>,
    pub rejected_by: Option<String>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub fulfilled_by: Option<String>,
    pub fulfilled_at: Option<DateTime<Utc>>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub calendar_event_id: Option<String>,
    pub memories: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RewardInstanceRow {
    pub fn to_shared(&self) -> shared::RewardInstance {
        let memories: RewardMemories =
            serde_json::from_str(&self.memories).unwrap_or_default();

        shared::RewardInstance {
            id: Uuid::parse_str(&self.id).unwrap(),
            family_id: Uuid::parse_str(&self.family_id).unwrap(),
            template_id: Uuid::parse_str(&self.template_id).unwrap(),
            child_id: Uuid::parse_str(&self.child_id).unwrap(),
            status: self.status.parse().unwrap_or(RewardStatus::Requested),
            bucks_price: self.bucks_price,
            request_notes: self.request_notes.clone(),
            requested_at: self.requested_at,
            approved_by: self
                .approved_by
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            approved_at: self.approved_at,
            approval_notes: self.approval_notes.clone(),
            rejected_by: self
                .rejected_by
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            rejected_at: self.rejected_at,
            rejection_reason: self.rejection_reason.clone(),
            fulfilled_by: self
                .fulfilled_by
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            fulfilled_at: self.fulfilled_at,
            scheduled_date: self.scheduled_date,
            calendar_event_id: self
                .calendar_event_id
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            memories,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reward_instance_row_memories_default() {
        let now = Utc::now();
        let row = RewardInstanceRow {
            id: Uuid::new_v4().to_string(),
            family_id: Uuid::new_v4().to_string(),
            template_id: Uuid::new_v4().to_string(),
            child_id: Uuid::new_v4().to_string(),
            status: "requested".to_string(),
            bucks_price: 25,
            request_notes: "".to_string(),
            requested_at: now,
            approved_by: None,
            approved_at: None,
            approval_notes: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            fulfilled_by: None,
            fulfilled_at: None,
            scheduled_date: None,
            calendar_event_id: None,
            memories: "{}".to_string(),
            created_at: now,
            updated_at: now,
        };

        let instance = row.to_shared();
        assert_eq!(instance.status, RewardStatus::Requested);
        assert_eq!(instance.memories, RewardMemories::default());
    }
}
