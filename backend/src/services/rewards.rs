use chrono::Utc;
use chrono_tz::Tz;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{RewardInstanceRow, RewardTemplateRow};
use crate::services::event_feed::EventFeed;
use crate::services::{bucks, events, story};
use shared::{
    AddMemoriesRequest, ApproveRewardRequest, Attendee, CreateEventRequest, DateTimeInput,
    EventStatus, EventType, RewardInstance, RewardInstanceWithTemplate, RewardMemories,
    RewardStatus, RewardTemplate, StoryKind, UpdateEventRequest,
};

#[derive(Debug, Error)]
pub enum RewardError {
    #[error("Reward template not found")]
    TemplateNotFound,
    #[error("Reward request not found")]
    NotFound,
    #[error("Reward is no longer available")]
    NotAvailable,
    #[error("Reward is out of stock")]
    OutOfStock,
    #[error("Reward has expired")]
    Expired,
    #[error("Invalid state: {0}")]
    InvalidState(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Ledger error: {0}")]
    BucksError(#[from] bucks::BucksError),
}

async fn get_template_row(
    pool: &SqlitePool,
    template_id: &Uuid,
) -> Result<RewardTemplate, RewardError> {
    let template: Option<RewardTemplateRow> =
        sqlx::query_as("SELECT * FROM reward_templates WHERE id = ?")
            .bind(template_id.to_string())
            .fetch_optional(pool)
            .await?;

    template
        .map(|t| t.to_shared())
        .ok_or(RewardError::TemplateNotFound)
}

async fn get_instance_row(
    pool: &SqlitePool,
    instance_id: &Uuid,
) -> Result<RewardInstanceRow, RewardError> {
    let row: Option<RewardInstanceRow> =
        sqlx::query_as("SELECT * FROM reward_instances WHERE id = ?")
            .bind(instance_id.to_string())
            .fetch_optional(pool)
            .await?;

    row.ok_or(RewardError::NotFound)
}

pub async fn get_instance(
    pool: &SqlitePool,
    instance_id: &Uuid,
) -> Result<RewardInstance, RewardError> {
    Ok(get_instance_row(pool, instance_id).await?.to_shared())
}

/// A child asks to redeem a reward. The template must be active, unexpired,
/// offered to the child, and in stock; a limited quantity is decremented and
/// the bucks price is debited through the ledger.
///
/// The stock check, the decrement and the instance insert are sequential
/// writes without a guarding transaction; concurrent requests for the last
/// unit of a limited reward can race.
pub async fn request_reward(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    template_id: &Uuid,
    request: &shared::RequestRewardRequest,
) -> Result<RewardInstance, RewardError> {
    let template = get_template_row(pool, template_id).await?;

    if !template.active {
        return Err(RewardError::NotAvailable);
    }
    if let Some(expires_at) = template.expires_at {
        if expires_at < Utc::now() {
            return Err(RewardError::Expired);
        }
    }
    if !template.available_to.is_empty() && !template.available_to.contains(child_id) {
        return Err(RewardError::NotAvailable);
    }
    if !template.in_stock() {
        return Err(RewardError::OutOfStock);
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    let memories_json =
        serde_json::to_string(&RewardMemories::default()).unwrap_or_else(|_| "{}".to_string());

    sqlx::query(
        r#"
        INSERT INTO reward_instances (id, family_id, template_id, child_id, status, bucks_price,
                                      request_notes, requested_at, scheduled_date, memories,
                                      created_at, updated_at)
        VALUES (?, ?, ?, ?, 'requested', ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(family_id.to_string())
    .bind(template_id.to_string())
    .bind(child_id.to_string())
    .bind(template.bucks_price)
    .bind(request.notes.as_deref().unwrap_or(""))
    .bind(now)
    .bind(request.scheduled_date)
    .bind(&memories_json)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    if !template.is_unlimited() {
        sqlx::query("UPDATE reward_templates SET quantity = quantity - 1, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(template_id.to_string())
            .execute(pool)
            .await?;
    }

    bucks::spend_on_reward(pool, family_id, child_id, &id, template.bucks_price).await?;

    get_instance(pool, &id).await
}

/// Parent approval. When a schedule date exists a linked calendar event is
/// created through the event service; calendar failures are logged and never
/// block the approval.
pub async fn approve_reward(
    pool: &SqlitePool,
    feed: &EventFeed,
    instance_id: &Uuid,
    parent_id: &Uuid,
    request: &ApproveRewardRequest,
    default_tz: Tz,
) -> Result<RewardInstance, RewardError> {
    let row = get_instance_row(pool, instance_id).await?;
    let status: RewardStatus = row.status.parse().unwrap_or(RewardStatus::Requested);
    if status != RewardStatus::Requested {
        return Err(RewardError::InvalidState(format!(
            "Only requested rewards can be approved (currently {})",
            status.as_str()
        )));
    }

    let now = Utc::now();
    let scheduled_date = request.scheduled_date.or(row.scheduled_date);

    sqlx::query(
        r#"
        UPDATE reward_instances
        SET status = 'approved', approved_by = ?, approved_at = ?, approval_notes = ?,
            scheduled_date = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(parent_id.to_string())
    .bind(now)
    .bind(request.notes.as_deref().unwrap_or(""))
    .bind(scheduled_date)
    .bind(now)
    .bind(instance_id.to_string())
    .execute(pool)
    .await?;

    if let Some(scheduled) = scheduled_date {
        link_calendar_event(pool, feed, &row, instance_id, parent_id, request, scheduled, default_tz)
            .await;
    }

    get_instance(pool, instance_id).await
}

/// Best-effort calendar link for an approved reward.
#[allow(clippy::too_many_arguments)]
async fn link_calendar_event(
    pool: &SqlitePool,
    feed: &EventFeed,
    row: &RewardInstanceRow,
    instance_id: &Uuid,
    parent_id: &Uuid,
    request: &ApproveRewardRequest,
    scheduled: chrono::DateTime<Utc>,
    default_tz: Tz,
) {
    let family_id = Uuid::parse_str(&row.family_id).unwrap();
    let child_id = Uuid::parse_str(&row.child_id).unwrap();

    let template_title = match Uuid::parse_str(&row.template_id) {
        Ok(template_id) => get_template_row(pool, &template_id)
            .await
            .map(|t| t.title)
            .unwrap_or_else(|_| "Reward".to_string()),
        Err(_) => "Reward".to_string(),
    };

    let event_request = CreateEventRequest {
        title: format!("Reward: {}", template_title),
        description: Some(format!("Bucks spent: {}", row.bucks_price)),
        location: request.location.clone(),
        event_type: Some(EventType::Activity),
        start: DateTimeInput::Iso(scheduled.to_rfc3339()),
        end: None,
        timezone: None,
        child_id: Some(child_id),
        child_name: None,
        attending_parent_id: Some(*parent_id),
        attendees: Some(vec![
            Attendee {
                id: Some(child_id),
                name: "Child".to_string(),
                email: None,
            },
            Attendee {
                id: Some(*parent_id),
                name: "Parent".to_string(),
                email: None,
            },
        ]),
        linked_documents: None,
    };

    // create_event already retries transient store failures with backoff.
    match events::create_event(pool, feed, &family_id, parent_id, &event_request, default_tz).await
    {
        Ok(event) => {
            let result =
                sqlx::query("UPDATE reward_instances SET calendar_event_id = ?, updated_at = ? WHERE id = ?")
                    .bind(event.id.to_string())
                    .bind(Utc::now())
                    .bind(instance_id.to_string())
                    .execute(pool)
                    .await;
            if let Err(err) = result {
                log::error!("Failed to store calendar link for reward {}: {:?}", instance_id, err);
            }
        }
        Err(err) => {
            log::error!(
                "Calendar event creation failed for reward {} (approval proceeds): {:?}",
                instance_id,
                err
            );
        }
    }
}

/// Parent rejection, terminal. The debited bucks are refunded; a limited
/// quantity is not restocked.
pub async fn reject_reward(
    pool: &SqlitePool,
    instance_id: &Uuid,
    parent_id: &Uuid,
    reason: &str,
) -> Result<RewardInstance, RewardError> {
    let row = get_instance_row(pool, instance_id).await?;
    let status: RewardStatus = row.status.parse().unwrap_or(RewardStatus::Requested);
    if status != RewardStatus::Requested {
        return Err(RewardError::InvalidState(format!(
            "Only requested rewards can be rejected (currently {})",
            status.as_str()
        )));
    }

    let now = Utc::now();
    sqlx::query(
        r#"
        UPDATE reward_instances
        SET status = 'rejected', rejected_by = ?, rejected_at = ?, rejection_reason = ?, updated_at = ?
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

    let family_id = Uuid::parse_str(&row.family_id).unwrap();
    let child_id = Uuid::parse_str(&row.child_id).unwrap();
    bucks::refund_reward(pool, &family_id, &child_id, instance_id, row.bucks_price, parent_id)
        .await?;

    get_instance(pool, instance_id).await
}

/// Hand the reward over. Requires prior approval; the linked calendar event,
/// if any, is best-effort marked completed.
pub async fn fulfill_reward(
    pool: &SqlitePool,
    feed: &EventFeed,
    instance_id: &Uuid,
    parent_id: &Uuid,
) -> Result<RewardInstance, RewardError> {
    let row = get_instance_row(pool, instance_id).await?;
    let status: RewardStatus = row.status.parse().unwrap_or(RewardStatus::Requested);
    if status != RewardStatus::Approved {
        return Err(RewardError::InvalidState(format!(
            "Only approved rewards can be fulfilled (currently {})",
            status.as_str()
        )));
    }

    let now = Utc::now();
    sqlx::query(
        "UPDATE reward_instances SET status = 'fulfilled', fulfilled_by = ?, fulfilled_at = ?, updated_at = ? WHERE id = ?",
    )
    .bind(parent_id.to_string())
    .bind(now)
    .bind(now)
    .bind(instance_id.to_string())
    .execute(pool)
    .await?;

    if let Some(calendar_event_id) = row
        .calendar_event_id
        .as_ref()
        .and_then(|id| Uuid::parse_str(id).ok())
    {
        let updates = UpdateEventRequest {
            status: Some(EventStatus::Completed),
            ..UpdateEventRequest::default()
        };
        if let Err(err) =
            events::update_event(pool, feed, &calendar_event_id, parent_id, &updates).await
        {
            log::warn!(
                "Could not mark linked calendar event {} completed: {:?}",
                calendar_event_id,
                err
            );
        }
    }

    get_instance(pool, instance_id).await
}

/// Attach photos/notes/a rating to a fulfilled reward. Photos accumulate
/// across calls; a story-feed entry is appended best-effort.
pub async fn add_memories(
    pool: &SqlitePool,
    instance_id: &Uuid,
    request: &AddMemoriesRequest,
) -> Result<RewardInstance, RewardError> {
    let row = get_instance_row(pool, instance_id).await?;
    let status: RewardStatus = row.status.parse().unwrap_or(RewardStatus::Requested);
    if status != RewardStatus::Fulfilled {
        return Err(RewardError::InvalidState(
            "Memories can only be added after fulfillment".to_string(),
        ));
    }

    let mut memories: RewardMemories = serde_json::from_str(&row.memories).unwrap_or_default();
    memories
        .photo_urls
        .extend(request.photo_urls.iter().cloned());
    if let Some(ref notes) = request.notes {
        memories.notes = notes.clone();
    }
    if let Some(rating) = request.rating {
        memories.rating = rating;
    }

    let now = Utc::now();
    sqlx::query("UPDATE reward_instances SET memories = ?, updated_at = ? WHERE id = ?")
        .bind(serde_json::to_string(&memories).unwrap_or_else(|_| "{}".to_string()))
        .bind(now)
        .bind(instance_id.to_string())
        .execute(pool)
        .await?;

    let family_id = Uuid::parse_str(&row.family_id).unwrap();
    let child_id = Uuid::parse_str(&row.child_id).unwrap();
    let template_title = match Uuid::parse_str(&row.template_id) {
        Ok(template_id) => get_template_row(pool, &template_id)
            .await
            .map(|t| t.title)
            .unwrap_or_else(|_| "Reward".to_string()),
        Err(_) => "Reward".to_string(),
    };

    if let Err(err) = story::append(
        pool,
        &family_id,
        StoryKind::RewardMemory,
        Some(instance_id),
        &format!("Reward enjoyed: {}", template_title),
        &memories.notes,
        &memories.photo_urls,
        Some(&child_id),
        None,
    )
    .await
    {
        log::warn!("Story feed append failed for reward {}: {:?}", instance_id, err);
    }

    get_instance(pool, instance_id).await
}

pub async fn list_child_rewards(
    pool: &SqlitePool,
    family_id: &Uuid,
    child_id: &Uuid,
    status: Option<RewardStatus>,
) -> Result<Vec<RewardInstanceWithTemplate>, RewardError> {
    let rows: Vec<RewardInstanceRow> = match status {
        Some(status) => {
            sqlx::query_as(
                "SELECT * FROM reward_instances WHERE family_id = ? AND child_id = ? AND status = ? ORDER BY requested_at DESC",
            )
            .bind(family_id.to_string())
            .bind(child_id.to_string())
            .bind(status.as_str())
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT * FROM reward_instances WHERE family_id = ? AND child_id = ? ORDER BY requested_at DESC",
            )
            .bind(family_id.to_string())
            .bind(child_id.to_string())
            .fetch_all(pool)
            .await?
        }
    };

    with_templates(pool, rows).await
}

pub async fn list_pending_approval(
    pool: &SqlitePool,
    family_id: &Uuid,
) -> Result<Vec<RewardInstanceWithTemplate>, RewardError> {
    let rows: Vec<RewardInstanceRow> = sqlx::query_as(
        "SELECT * FROM reward_instances WHERE family_id = ? AND status = 'requested' ORDER BY requested_at ASC",
    )
    .bind(family_id.to_string())
    .fetch_all(pool)
    .await?;

    with_templates(pool, rows).await
}

async fn with_templates(
    pool: &SqlitePool,
    rows: Vec<RewardInstanceRow>,
) -> Result<Vec<RewardInstanceWithTemplate>, RewardError> {
    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        let template: Option<RewardTemplateRow> =
            sqlx::query_as("SELECT * FROM reward_templates WHERE id = ?")
                .bind(&row.template_id)
                .fetch_optional(pool)
                .await?;
        if let Some(template) = template {
            result.push(RewardInstanceWithTemplate {
                instance: row.to_shared(),
                template: template.to_shared(),
            });
        }
    }
    Ok(result)
}
