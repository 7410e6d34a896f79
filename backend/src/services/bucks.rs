use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{BucksBalanceRow, BucksTransactionRow};
use shared::{BucksBalance, BucksStats, BucksTransaction, TransactionKind, TransactionSource};

#[derive(Debug, Error)]
pub enum BucksError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Append a ledger transaction and update the materialized balance.
///
/// Both writes happen inside one database transaction so the balance and
/// the transaction log can never diverge. Amounts are signed; there is no
/// floor, a balance may go negative.
#[allow(clippy::too_many_arguments)]
pub async fn adjust(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    amount: i64,
    kind: TransactionKind,
    source: TransactionSource,
    source_id: Option<&Uuid>,
    description: &str,
    created_by: Option<&Uuid>,
) -> Result<BucksTransaction, BucksError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    let existing: Option<BucksBalanceRow> =
        sqlx::query_as("SELECT * FROM bucks_balances WHERE child_id = ?")
            .bind(child_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;

    let (current_balance, lifetime_earned, lifetime_spent) = existing
        .as_ref()
        .map(|b| (b.current_balance, b.lifetime_earned, b.lifetime_spent))
        .unwrap_or((0, 0, 0));

    let new_balance = current_balance + amount;
    let new_earned = if amount > 0 {
        lifetime_earned + amount
    } else {
        lifetime_earned
    };
    let new_spent = if amount < 0 {
        lifetime_spent + amount.abs()
    } else {
        lifetime_spent
    };

    if existing.is_some() {
        sqlx::query(
            r#"
            UPDATE bucks_balances
            SET current_balance = ?, lifetime_earned = ?, lifetime_spent = ?, updated_at = ?
            WHERE child_id = ?
            "#,
        )
        .bind(new_balance)
        .bind(new_earned)
        .bind(new_spent)
        .bind(now)
        .bind(child_id.to_string())
        .execute(&mut *tx)
        .await?;
    } else {
        sqlx::query(
            r#"
            INSERT INTO bucks_balances (child_id, family_id, current_balance, lifetime_earned, lifetime_spent, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(child_id.to_string())
        .bind(family_id.to_string())
        .bind(new_balance)
        .bind(new_earned)
        .bind(new_spent)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        r#"
        INSERT INTO bucks_transactions (id, family_id, child_id, amount, kind, source, source_id, description, resulting_balance, created_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(family_id.to_string())
    .bind(child_id.to_string())
    .bind(amount)
    .bind(kind.as_str())
    .bind(source.as_str())
    .bind(source_id.map(|s| s.to_string()))
    .bind(description)
    .bind(new_balance)
    .bind(created_by.map(|c| c.to_string()))
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(BucksTransaction {
        id,
        family_id: *family_id,
        child_id: *child_id,
        amount,
        kind,
        source,
        source_id: source_id.copied(),
        description: description.to_string(),
        resulting_balance: new_balance,
        created_by: created_by.copied(),
        created_at: now,
    })
}

/// Current materialized balance; 0 for a child with no ledger yet.
pub async fn get_balance(pool: &SqlitePool, child_id: &Uuid) -> Result<i64, BucksError> {
    let balance: Option<i64> =
        sqlx::query_scalar("SELECT current_balance FROM bucks_balances WHERE child_id = ?")
            .bind(child_id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(balance.unwrap_or(0))
}

pub async fn get_balance_detail(
    pool: &SqlitePool,
    child_id: &Uuid,
) -> Result<Option<BucksBalance>, BucksError> {
    let balance: Option<BucksBalanceRow> =
        sqlx::query_as("SELECT * FROM bucks_balances WHERE child_id = ?")
            .bind(child_id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(balance.map(|b| b.to_shared()))
}

pub async fn get_family_balances(
    pool: &SqlitePool,
    family_id: &Uuid,
) -> Result<Vec<BucksBalance>, BucksError> {
    let balances: Vec<BucksBalanceRow> =
        sqlx::query_as("SELECT * FROM bucks_balances WHERE family_id = ?")
            .bind(family_id.to_string())
            .fetch_all(pool)
            .await?;

    Ok(balances.into_iter().map(|b| b.to_shared()).collect())
}

pub async fn get_history(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    limit: Option<i64>,
) -> Result<Vec<BucksTransaction>, BucksError> {
    let limit = limit.unwrap_or(50);

    let transactions: Vec<BucksTransactionRow> = sqlx::query_as(
        r#"
        SELECT * FROM bucks_transactions
        WHERE family_id = ? AND child_id = ?
        ORDER BY created_at DESC
        LIMIT ?
        "#,
    )
    .bind(family_id.to_string())
    .bind(child_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(transactions.into_iter().map(|t| t.to_shared()).collect())
}

/// Earned/spent aggregates over the last `days` days.
pub async fn get_stats(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    days: i64,
) -> Result<BucksStats, BucksError> {
    let since = Utc::now() - Duration::days(days);

    let transactions: Vec<BucksTransactionRow> = sqlx::query_as(
        r#"
        SELECT * FROM bucks_transactions
        WHERE family_id = ? AND child_id = ? AND created_at >= ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(family_id.to_string())
    .bind(child_id.to_string())
    .bind(since)
    .fetch_all(pool)
    .await?;

    let balance = get_balance_detail(pool, child_id).await?;

    let mut stats = BucksStats {
        transaction_count: transactions.len() as i64,
        ..BucksStats::default()
    };
    if let Some(balance) = balance {
        stats.current_balance = balance.current_balance;
        stats.lifetime_earned = balance.lifetime_earned;
        stats.lifetime_spent = balance.lifetime_spent;
    }

    for transaction in &transactions {
        if transaction.amount > 0 {
            stats.period_earned += transaction.amount;
        } else {
            stats.period_spent += transaction.amount.abs();
        }
    }

    Ok(stats)
}

/// Credit bucks for a completed chore.
pub async fn reward_chore(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    chore_instance_id: &Uuid,
    amount: i64,
    parent_id: Option<&Uuid>,
) -> Result<BucksTransaction, BucksError> {
    adjust(
        pool,
        family_id,
        child_id,
        amount,
        TransactionKind::Earned,
        TransactionSource::Chore,
        Some(chore_instance_id),
        "Completed chore",
        parent_id,
    )
    .await
}

/// Bonus on top of an already-paid chore.
pub async fn tip_chore(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    chore_instance_id: &Uuid,
    amount: i64,
    parent_id: &Uuid,
) -> Result<BucksTransaction, BucksError> {
    adjust(
        pool,
        family_id,
        child_id,
        amount,
        TransactionKind::Bonus,
        TransactionSource::Chore,
        Some(chore_instance_id),
        "Bonus for great work on chore",
        Some(parent_id),
    )
    .await
}

/// Debit bucks for a reward purchase. The amount is forced negative.
pub async fn spend_on_reward(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    reward_instance_id: &Uuid,
    amount: i64,
) -> Result<BucksTransaction, BucksError> {
    adjust(
        pool,
        family_id,
        child_id,
        -amount.abs(),
        TransactionKind::Spent,
        TransactionSource::Reward,
        Some(reward_instance_id),
        "Purchased reward",
        Some(child_id),
    )
    .await
}

/// Return bucks debited by a request that was later rejected. The amount is
/// forced positive.
pub async fn refund_reward(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    reward_instance_id: &Uuid,
    amount: i64,
    parent_id: &Uuid,
) -> Result<BucksTransaction, BucksError> {
    adjust(
        pool,
        family_id,
        child_id,
        amount.abs(),
        TransactionKind::Adjusted,
        TransactionSource::Reward,
        Some(reward_instance_id),
        "Refund for rejected reward",
        Some(parent_id),
    )
    .await
}

/// Free-form parent adjustment.
pub async fn adjust_balance(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    amount: i64,
    reason: Option<&str>,
    parent_id: &Uuid,
) -> Result<BucksTransaction, BucksError> {
    adjust(
        pool,
        family_id,
        child_id,
        amount,
        TransactionKind::Adjusted,
        TransactionSource::Manual,
        None,
        reason.unwrap_or("Manual adjustment"),
        Some(parent_id),
    )
    .await
}
