use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ChoreInstanceRow, ChoreScheduleRow, ChoreTemplateRow};
use crate::services::{bucks, scheduler};
use shared::{
    ChoreInstance, ChoreInstanceWithTemplate, ChoreStatus, CompleteChoreRequest, TransactionKind,
    TransactionSource,
};

#[derive(Debug, Error)]
pub enum ChoreError {
    #[error("Chore instance not found")]
    NotFound,
    #[error("Chore template not found")]
    TemplateNotFound,
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Adjustment must be +1 or -1")]
    InvalidAdjustment,
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Ledger error: {0}")]
    BucksError(#[from] bucks::BucksError),
}

/// Materialize instances for every active schedule due on `date`.
///
/// Idempotent: the (template, child, date) uniqueness makes re-runs insert
/// nothing, so the activation path and the nightly pass can overlap safely.
pub async fn generate_instances(
    pool: &SqlitePool,
    family_id: &Uuid,
    date: NaiveDate,
) -> Result<u32, ChoreError> {
    let schedules: Vec<ChoreScheduleRow> = sqlx::query_as(
        r#"
        SELECT cs.* FROM chore_schedules cs
        JOIN chore_templates ct ON cs.template_id = ct.id
        WHERE cs.family_id = ? AND cs.active = 1 AND ct.active = 1 AND ct.archived = 0
        "#,
    )
    .bind(family_id.to_string())
    .fetch_all(pool)
    .await?;

    let now = Utc::now();
    let mut created: u32 = 0;

    for schedule_row in schedules {
        let schedule = schedule_row.to_shared();
        if !scheduler::is_due_on(&schedule.days_of_week, date) {
            continue;
        }

        let result = sqlx::query(
            r#"
            INSERT INTO chore_instances (id, family_id, template_id, schedule_id, child_id, date,
                                         status, bucks_awarded, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'pending', 0, ?, ?)
            ON CONFLICT (template_id, child_id, date) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(family_id.to_string())
        .bind(schedule.template_id.to_string())
        .bind(schedule.id.to_string())
        .bind(schedule.child_id.to_string())
        .bind(date)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        created += result.rows_affected() as u32;
    }

    Ok(created)
}

async fn get_instance_row(
    pool: &SqlitePool,
    instance_id: &Uuid,
) -> Result<ChoreInstanceRow, ChoreError> {
    let row: Option<ChoreInstanceRow> =
        sqlx::query_as("SELECT * FROM chore_instances WHERE id = ?")
            .bind(instance_id.to_string())
            .fetch_optional(pool)
            .await?;

    row.ok_or(ChoreError::NotFound)
}

pub async fn get_instance(
    pool: &SqlitePool,
    instance_id: &Uuid,
) -> Result<ChoreInstance, ChoreError> {
    Ok(get_instance_row(pool, instance_id).await?.to_shared())
}

/// Complete a pending chore. Chores are auto-approved and paid on
/// completion; a parent can still reject retroactively.
pub async fn complete_instance(
    pool: &SqlitePool,
    instance_id: &Uuid,
    request: &CompleteChoreRequest,
) -> Result<ChoreInstance, ChoreError> {
    let row = get_instance_row(pool, instance_id).await?;
    let status: ChoreStatus = row.status.parse().unwrap_or(ChoreStatus::Pending);
    if status != ChoreStatus::Pending {
        return Err(ChoreError::InvalidState(format!(
            "Chore is already {}",
            status.as_str()
        )));
    }

    let template: Option<ChoreTemplateRow> =
        sqlx::query_as("SELECT * FROM chore_templates WHERE id = ?")
            .bind(&row.template_id)
            .fetch_optional(pool)
            .await?;
    let template = template.ok_or(ChoreError::TemplateNotFound)?;

    let award = request.bucks_override.unwrap_or(template.bucks_reward);
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE chore_instances
        SET status = 'approved', bucks_awarded = ?, mood = ?, effort = ?, photo_url = ?,
            note = ?, completed_at = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(award)
    .bind(&request.mood)
    .bind(request.effort)
    .bind(&request.photo_url)
    .bind(&request.note)
    .bind(now)
    .bind(now)
    .bind(instance_id.to_string())
    .execute(pool)
    .await?;

    if award != 0 {
        let family_id = Uuid::parse_str(&row.family_id).unwrap();
        let child_id = Uuid::parse_str(&row.child_id).unwrap();
        bucks::reward_chore(pool, &family_id, &child_id, instance_id, award, None).await?;
    }

    get_instance(pool, instance_id).await
}

/// One-buck manual adjustment on an already-completed instance. Each
/// effective call produces its own ledger transaction; decrementing past
/// zero is a no-op rather than a negative award.
pub async fn adjust_award(
    pool: &SqlitePool,
    instance_id: &Uuid,
    delta: i64,
    parent_id: &Uuid,
) -> Result<ChoreInstance, ChoreError> {
    if delta != 1 && delta != -1 {
        return Err(ChoreError::InvalidAdjustment);
    }

    let row = get_instance_row(pool, instance_id).await?;
    let status: ChoreStatus = row.status.parse().unwrap_or(ChoreStatus::Pending);
    if !status.is_done() {
        return Err(ChoreError::InvalidState(
            "Only completed chores can be adjusted".to_string(),
        ));
    }

    if delta < 0 && row.bucks_awarded == 0 {
        return Ok(row.to_shared());
    }

    sqlx::query("UPDATE chore_instances SET bucks_awarded = bucks_awarded + ?, updated_at = ? WHERE id = ?")
        .bind(delta)
        .bind(Utc::now())
        .bind(instance_id.to_string())
        .execute(pool)
        .await?;

    let family_id = Uuid::parse_str(&row.family_id).unwrap();
    let child_id = Uuid::parse_str(&row.child_id).unwrap();
    let description = if delta > 0 {
        "Chore reward bonus by parent"
    } else {
        "Chore reward reduction by parent"
    };
    bucks::adjust(
        pool,
        &family_id,
        &child_id,
        delta,
        TransactionKind::Adjusted,
        TransactionSource::Chore,
        Some(instance_id),
        description,
        Some(parent_id),
    )
    .await?;

    get_instance(pool, instance_id).await
}

/// Parent bonus on top of an already-paid chore. Does not touch the
/// instance's awarded amount; the tip is its own ledger transaction.
pub async fn tip_instance(
    pool: &SqlitePool,
    instance_id: &Uuid,
    amount: i64,
    parent_id: &Uuid,
) -> Result<shared::BucksTransaction, ChoreError> {
    if amount <= 0 {
        return Err(ChoreError::InvalidState(
            "Tip amount must be positive".to_string(),
        ));
    }

    let row = get_instance_row(pool, instance_id).await?;
    let status: ChoreStatus = row.status.parse().unwrap_or(ChoreStatus::Pending);
    if !status.is_done() {
        return Err(ChoreError::InvalidState(
            "Only completed chores can be tipped".to_string(),
        ));
    }

    let family_id = Uuid::parse_str(&row.family_id).unwrap();
    let child_id = Uuid::parse_str(&row.child_id).unwrap();
    Ok(bucks::tip_chore(pool, &family_id, &child_id, instance_id, amount, parent_id).await?)
}

/// Retroactive parent rejection of a completed chore: the awarded bucks are
/// reversed with an exactly offsetting debit. Terminal, no re-approval.
pub async fn reject_instance(
    pool: &SqlitePool,
    instance_id: &Uuid,
    parent_id: &Uuid,
    reason: Option<&str>,
) -> Result<ChoreInstance, ChoreError> {
    let row = get_instance_row(pool, instance_id).await?;
    let status: ChoreStatus = row.status.parse().unwrap_or(ChoreStatus::Pending);
    if !status.is_done() {
        return Err(ChoreError::InvalidState(
            "Only completed chores can be rejected".to_string(),
        ));
    }

    if row.bucks_awarded != 0 {
        let family_id = Uuid::parse_str(&row.family_id).unwrap();
        let child_id = Uuid::parse_str(&row.child_id).unwrap();
        bucks::adjust(
            pool,
            &family_id,
            &child_id,
            -row.bucks_awarded,
            TransactionKind::Adjusted,
            TransactionSource::Chore,
            Some(instance_id),
            "Reversal for rejected chore",
            Some(parent_id),
        )
        .await?;
    }

    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE chore_instances
        SET status = 'rejected', reviewed_by = ?, reviewed_at = ?, note = COALESCE(?, note),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(parent_id.to_string())
    .bind(now)
    .bind(reason)
    .bind(now)
    .bind(instance_id.to_string())
    .execute(pool)
    .await?;

    get_instance(pool, instance_id).await
}

pub async fn list_for_child(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<ChoreInstanceWithTemplate>, ChoreError> {
    let rows: Vec<ChoreInstanceRow> = sqlx::query_as(
        "SELECT * FROM chore_instances WHERE family_id = ? AND child_id = ? AND date = ? ORDER BY created_at ASC",
    )
    .bind(family_id.to_string())
    .bind(child_id.to_string())
    .bind(date)
    .fetch_all(pool)
    .await?;

    with_templates(pool, rows).await
}

/// Completed instances a parent may still review (retroactive rejection).
pub async fn list_pending_review(
    pool: &SqlitePool,
    family_id: &Uuid,
) -> Result<Vec<ChoreInstanceWithTemplate>, ChoreError> {
    let rows: Vec<ChoreInstanceRow> = sqlx::query_as(
        r#"
        SELECT * FROM chore_instances
        WHERE family_id = ? AND status IN ('completed', 'approved')
        ORDER BY date DESC, completed_at DESC
        "#,
    )
    .bind(family_id.to_string())
    .fetch_all(pool)
    .await?;

    with_templates(pool, rows).await
}

async fn with_templates(
    pool: &SqlitePool,
    rows: Vec<ChoreInstanceRow>,
) -> Result<Vec<ChoreInstanceWithTemplate>, ChoreError> {
    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        let template: Option<ChoreTemplateRow> =
            sqlx::query_as("SELECT * FROM chore_templates WHERE id = ?")
                .bind(&row.template_id)
                .fetch_optional(pool)
                .await?;
        if let Some(template) = template {
            result.push(ChoreInstanceWithTemplate {
                instance: row.to_shared(),
                template: template.to_shared(),
            });
        }
    }
    Ok(result)
}

/// Consecutive approved completions for (template, child), walking back from
/// `as_of` over the schedule's due days. An unfinished `as_of` day doesn't
/// break the streak.
pub async fn streak_count(
    pool: &SqlitePool,
    template_id: &Uuid,
    child_id: &Uuid,
    as_of: NaiveDate,
) -> Result<i32, ChoreError> {
    let schedule: Option<ChoreScheduleRow> = sqlx::query_as(
        "SELECT * FROM chore_schedules WHERE template_id = ? AND child_id = ? AND active = 1 LIMIT 1",
    )
    .bind(template_id.to_string())
    .bind(child_id.to_string())
    .fetch_optional(pool)
    .await?;

    let days: Vec<u8> = schedule
        .map(|s| s.to_shared().days_of_week)
        .unwrap_or_else(|| vec![0, 1, 2, 3, 4, 5, 6]);

    let mut streak = 0;
    let mut date = as_of;
    for offset in 0..365 {
        if scheduler::is_due_on(&days, date) {
            let approved: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM chore_instances WHERE template_id = ? AND child_id = ? AND date = ? AND status = 'approved'",
            )
            .bind(template_id.to_string())
            .bind(child_id.to_string())
            .bind(date)
            .fetch_one(pool)
            .await?;

            if approved > 0 {
                streak += 1;
            } else if offset == 0 {
                // Today may simply not be done yet.
            } else {
                break;
            }
        }
        date = match date.pred_opt() {
            Some(prev) => prev,
            None => break,
        };
    }

    Ok(streak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::chore_templates;
    use crate::test_support::setup_pool;
    use shared::{CreateChoreTemplateRequest, Recurrence, TimeOfDay};

    async fn setup_template(
        pool: &SqlitePool,
        family_id: &Uuid,
        child_id: Uuid,
        bucks_reward: i64,
    ) -> shared::ChoreTemplate {
        let request = CreateChoreTemplateRequest {
            title: "Feed the cat".to_string(),
            description: None,
            time_of_day: TimeOfDay::Morning,
            bucks_reward,
            required: Some(true),
            recurrence: Recurrence::Daily,
            days_of_week: None,
            assigned_child_ids: Some(vec![child_id]),
            icon_url: None,
            active: Some(true),
        };
        chore_templates::create_template(pool, family_id, &request)
            .await
            .unwrap()
    }

    async fn todays_instance(
        pool: &SqlitePool,
        family_id: &Uuid,
        child_id: &Uuid,
    ) -> ChoreInstance {
        let today = Utc::now().date_naive();
        let list = list_for_child(pool, family_id, child_id, today).await.unwrap();
        list[0].instance.clone()
    }

    #[tokio::test]
    async fn test_generation_is_idempotent() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        setup_template(&pool, &family_id, child_id, 5).await;

        // Activation already generated today's instance.
        let today = Utc::now().date_naive();
        let second_run = generate_instances(&pool, &family_id, today).await.unwrap();
        assert_eq!(second_run, 0);

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chore_instances WHERE family_id = ?")
                .bind(family_id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_completion_pays_and_is_single_shot() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        setup_template(&pool, &family_id, child_id, 5).await;

        let instance = todays_instance(&pool, &family_id, &child_id).await;
        let request = CompleteChoreRequest {
            mood: Some("proud".to_string()),
            ..CompleteChoreRequest::default()
        };

        let completed = complete_instance(&pool, &instance.id, &request).await.unwrap();
        assert_eq!(completed.status, ChoreStatus::Approved);
        assert_eq!(completed.bucks_awarded, 5);
        assert!(completed.completed_at.is_some());

        assert_eq!(bucks::get_balance(&pool, &child_id).await.unwrap(), 5);

        let again = complete_instance(&pool, &instance.id, &request).await;
        assert!(matches!(again, Err(ChoreError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_completion_honors_bucks_override() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        setup_template(&pool, &family_id, child_id, 5).await;

        let instance = todays_instance(&pool, &family_id, &child_id).await;
        let request = CompleteChoreRequest {
            bucks_override: Some(8),
            ..CompleteChoreRequest::default()
        };

        let completed = complete_instance(&pool, &instance.id, &request).await.unwrap();
        assert_eq!(completed.bucks_awarded, 8);
        assert_eq!(bucks::get_balance(&pool, &child_id).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_adjust_award_each_step_is_a_transaction() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        let parent_id = Uuid::new_v4();
        setup_template(&pool, &family_id, child_id, 5).await;

        let instance = todays_instance(&pool, &family_id, &child_id).await;
        complete_instance(&pool, &instance.id, &CompleteChoreRequest::default())
            .await
            .unwrap();

        let bumped = adjust_award(&pool, &instance.id, 1, &parent_id).await.unwrap();
        assert_eq!(bumped.bucks_awarded, 6);
        assert_eq!(bucks::get_balance(&pool, &child_id).await.unwrap(), 6);

        let history = bucks::get_history(&pool, &family_id, &child_id, None)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);

        let invalid = adjust_award(&pool, &instance.id, 2, &parent_id).await;
        assert!(matches!(invalid, Err(ChoreError::InvalidAdjustment)));
    }

    #[tokio::test]
    async fn test_decrement_at_zero_award_is_noop() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        let parent_id = Uuid::new_v4();
        setup_template(&pool, &family_id, child_id, 0).await;

        let instance = todays_instance(&pool, &family_id, &child_id).await;
        complete_instance(&pool, &instance.id, &CompleteChoreRequest::default())
            .await
            .unwrap();

        let unchanged = adjust_award(&pool, &instance.id, -1, &parent_id).await.unwrap();
        assert_eq!(unchanged.bucks_awarded, 0);

        let history = bucks::get_history(&pool, &family_id, &child_id, None)
            .await
            .unwrap();
        assert!(history.is_empty());
    }

    #[tokio::test]
    async fn test_tip_adds_bonus_without_touching_award() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        let parent_id = Uuid::new_v4();
        setup_template(&pool, &family_id, child_id, 5).await;

        let instance = todays_instance(&pool, &family_id, &child_id).await;

        // Tipping a pending chore is refused.
        let premature = tip_instance(&pool, &instance.id, 2, &parent_id).await;
        assert!(matches!(premature, Err(ChoreError::InvalidState(_))));

        complete_instance(&pool, &instance.id, &CompleteChoreRequest::default())
            .await
            .unwrap();
        tip_instance(&pool, &instance.id, 2, &parent_id).await.unwrap();

        assert_eq!(bucks::get_balance(&pool, &child_id).await.unwrap(), 7);
        let after = get_instance(&pool, &instance.id).await.unwrap();
        assert_eq!(after.bucks_awarded, 5);
    }

    #[tokio::test]
    async fn test_rejection_restores_pre_completion_balance() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        let parent_id = Uuid::new_v4();
        setup_template(&pool, &family_id, child_id, 5).await;

        let before = bucks::get_balance(&pool, &child_id).await.unwrap();

        let instance = todays_instance(&pool, &family_id, &child_id).await;
        complete_instance(&pool, &instance.id, &CompleteChoreRequest::default())
            .await
            .unwrap();

        let rejected = reject_instance(&pool, &instance.id, &parent_id, Some("not actually done"))
            .await
            .unwrap();
        assert_eq!(rejected.status, ChoreStatus::Rejected);
        assert_eq!(rejected.reviewed_by, Some(parent_id));

        let after = bucks::get_balance(&pool, &child_id).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_pending_chore_cannot_be_rejected() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        let parent_id = Uuid::new_v4();
        setup_template(&pool, &family_id, child_id, 5).await;

        let instance = todays_instance(&pool, &family_id, &child_id).await;
        let result = reject_instance(&pool, &instance.id, &parent_id, None).await;
        assert!(matches!(result, Err(ChoreError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_streak_counts_consecutive_approved_days() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        let template = setup_template(&pool, &family_id, child_id, 1).await;

        let today = Utc::now().date_naive();
        for days_back in 1..=3 {
            let date = today - chrono::Duration::days(days_back);
            generate_instances(&pool, &family_id, date).await.unwrap();
            let list = list_for_child(&pool, &family_id, &child_id, date).await.unwrap();
            complete_instance(&pool, &list[0].instance.id, &CompleteChoreRequest::default())
                .await
                .unwrap();
        }

        let streak = streak_count(&pool, &template.id, &child_id, today).await.unwrap();
        assert_eq!(streak, 3);
    }
}
