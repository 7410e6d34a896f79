use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use shared::{TransactionKind, TransactionSource};

/// Database model for the materialized per-child balance
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BucksBalanceRow {
    pub child_id: String,
    pub family_id: String,
    pub current_balance: i64,
    pub lifetime_earned: i64,
    pub lifetime_spent: i64,
    pub updated_at: DateTime<Utc>,
}

impl BucksBalanceRow {
    pub fn to_shared(&self) -> shared::BucksBalance {
        shared::BucksBalance {
            child_id: Uuid::parse_str(&self.child_id).unwrap(),
            family_id: Uuid::parse_str(&self.family_id).unwrap(),
            current_balance: self.current_balance,
            lifetime_earned: self.lifetime_earned,
            lifetime_spent: self.lifetime_spent,
            updated_at: self.updated_at,
        }
    }
}

/// Database model for immutable ledger transactions
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BucksTransactionRow {
    pub id: String,
    pub family_id: String,
    pub child_id: String,
    pub amount: i64,
    pub kind: String,
    pub source: String,
    pub source_id: Option<String>,
    pub description: String,
    pub resulting_balance: i64,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl BucksTransactionRow {
    pub fn to_shared(&self) -> shared::BucksTransaction {
        shared::BucksTransaction {
            id: Uuid::parse_str(&self.id).unwrap(),
            family_id: Uuid::parse_str(&self.family_id).unwrap(),
            child_id: Uuid::parse_str(&self.child_id).unwrap(),
            amount: self.amount,
            kind: self.kind.parse().unwrap_or(TransactionKind::Adjusted),
            source: self.source.parse().unwrap_or(TransactionSource::Manual),
            source_id: self
                .source_id
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            description: self.description.clone(),
            resulting_balance: self.resulting_balance,
            created_by: self
                .created_by
                .as_ref()
                .and_then(|id| Uuid::parse_str(id).ok()),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_row_to_shared() {
        let now = Utc::now();
        let source_id = Uuid::new_v4();
        let row = BucksTransactionRow {
            id: Uuid::new_v4().to_string(),
            family_id: Uuid::new_v4().to_string(),
            child_id: Uuid::new_v4().to_string(),
            amount: -20,
            kind: "spent".to_string(),
            source: "reward".to_string(),
            source_id: Some(source_id.to_string()),
            description: "Purchased reward".to_string(),
            resulting_balance: 35,
            created_by: None,
            created_at: now,
        };

        let transaction = row.to_shared();
        assert_eq!(transaction.amount, -20);
        assert_eq!(transaction.kind, TransactionKind::Spent);
        assert_eq!(transaction.source, TransactionSource::Reward);
        assert_eq!(transaction.source_id, Some(source_id));
        assert_eq!(transaction.resulting_balance, 35);
    }
}
