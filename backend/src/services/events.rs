use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::EventRow;
use crate::services::event_feed::{EventChange, EventFeed};
use crate::services::event_time;
use crate::store;
use shared::{CreateEventRequest, Event, EventFilters, EventStatus, EventType, UpdateEventRequest};

/// Window used by search when the caller gives no range.
const SEARCH_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event not found")]
    NotFound,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid date/time input: {0}")]
    InvalidDate(#[from] event_time::ParseError),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

pub async fn create_event(
    pool: &SqlitePool,
    feed: &EventFeed,
    family_id: &Uuid,
    user_id: &Uuid,
    request: &CreateEventRequest,
    default_tz: Tz,
) -> Result<Event, EventError> {
    if request.title.trim().is_empty() {
        return Err(EventError::Validation("Event title is required".to_string()));
    }

    let tz = match &request.timezone {
        Some(label) => event_time::parse_timezone(label)?,
        None => default_tz,
    };
    let (start_time, end_time) =
        event_time::resolve_range(&request.start, request.end.as_ref(), tz)?;
    if end_time < start_time {
        return Err(EventError::Validation(
            "Event end precedes its start".to_string(),
        ));
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    let event_type = request.event_type.unwrap_or(EventType::General);
    let attendees = request.attendees.clone().unwrap_or_default();
    let linked_documents = request.linked_documents.clone().unwrap_or_default();

    let row = EventRow {
        id: id.to_string(),
        family_id: family_id.to_string(),
        title: request.title.clone(),
        description: request.description.clone().unwrap_or_default(),
        location: request.location.clone().unwrap_or_default(),
        event_type: event_type.as_str().to_string(),
        status: EventStatus::Confirmed.as_str().to_string(),
        start_time,
        end_time,
        timezone: tz.name().to_string(),
        child_id: request.child_id.map(|c| c.to_string()),
        child_name: request.child_name.clone(),
        attending_parent_id: request.attending_parent_id.map(|p| p.to_string()),
        attendees: serde_json::to_string(&attendees).unwrap_or_else(|_| "[]".to_string()),
        linked_documents: serde_json::to_string(&linked_documents)
            .unwrap_or_else(|_| "[]".to_string()),
        created_by: user_id.to_string(),
        last_modified_by: None,
        created_at: now,
        updated_at: now,
    };

    store::with_retry(|| insert_event_row(pool, &row)).await?;

    let event = row.to_shared();
    feed.publish(pool, EventChange::Added(event.clone())).await;

    Ok(event)
}

async fn insert_event_row(pool: &SqlitePool, row: &EventRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO events (id, family_id, title, description, location, event_type, status,
                            start_time, end_time, timezone, child_id, child_name,
                            attending_parent_id, attendees, linked_documents, created_by,
                            last_modified_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&row.id)
    .bind(&row.family_id)
    .bind(&row.title)
    .bind(&row.description)
    .bind(&row.location)
    .bind(&row.event_type)
    .bind(&row.status)
    .bind(row.start_time)
    .bind(row.end_time)
    .bind(&row.timezone)
    .bind(&row.child_id)
    .bind(&row.child_name)
    .bind(&row.attending_parent_id)
    .bind(&row.attendees)
    .bind(&row.linked_documents)
    .bind(&row.created_by)
    .bind(&row.last_modified_by)
    .bind(row.created_at)
    .bind(row.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_event(
    pool: &SqlitePool,
    feed: &EventFeed,
    event_id: &Uuid,
    user_id: &Uuid,
    request: &UpdateEventRequest,
) -> Result<Event, EventError> {
    let mut row: EventRow = sqlx::query_as("SELECT * FROM events WHERE id = ?")
        .bind(event_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or(EventError::NotFound)?;

    // Date fields re-normalize against the record's timezone unless the
    // update carries a new label.
    let tz = match &request.timezone {
        Some(label) => event_time::parse_timezone(label)?,
        None => event_time::parse_timezone(&row.timezone).unwrap_or(chrono_tz::UTC),
    };
    if let Some(ref start) = request.start {
        row.start_time = event_time::parse_input(start, tz)?;
    }
    if let Some(ref end) = request.end {
        row.end_time = event_time::parse_input(end, tz)?;
    }
    row.timezone = tz.name().to_string();

    if let Some(ref title) = request.title {
        row.title = title.clone();
    }
    if let Some(ref description) = request.description {
        row.description = description.clone();
    }
    if let Some(ref location) = request.location {
        row.location = location.clone();
    }
    if let Some(event_type) = request.event_type {
        row.event_type = event_type.as_str().to_string();
    }
    if let Some(status) = request.status {
        row.status = status.as_str().to_string();
    }
    if let Some(child_id) = request.child_id {
        row.child_id = Some(child_id.to_string());
    }
    if let Some(ref child_name) = request.child_name {
        row.child_name = Some(child_name.clone());
    }
    if let Some(attending_parent_id) = request.attending_parent_id {
        row.attending_parent_id = Some(attending_parent_id.to_string());
    }
    if let Some(ref attendees) = request.attendees {
        row.attendees = serde_json::to_string(attendees).unwrap_or_else(|_| "[]".to_string());
    }
    if let Some(ref linked_documents) = request.linked_documents {
        row.linked_documents =
            serde_json::to_string(linked_documents).unwrap_or_else(|_| "[]".to_string());
    }

    let now = Utc::now();
    row.updated_at = now;
    row.last_modified_by = Some(user_id.to_string());

    sqlx::query(
        r#"
        UPDATE events SET title = ?, description = ?, location = ?, event_type = ?, status = ?,
                          start_time = ?, end_time = ?, timezone = ?, child_id = ?, child_name = ?,
                          attending_parent_id = ?, attendees = ?, linked_documents = ?,
                          last_modified_by = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&row.title)
    .bind(&row.description)
    .bind(&row.location)
    .bind(&row.event_type)
    .bind(&row.status)
    .bind(row.start_time)
    .bind(row.end_time)
    .bind(&row.timezone)
    .bind(&row.child_id)
    .bind(&row.child_name)
    .bind(&row.attending_parent_id)
    .bind(&row.attendees)
    .bind(&row.linked_documents)
    .bind(&row.last_modified_by)
    .bind(row.updated_at)
    .bind(event_id.to_string())
    .execute(pool)
    .await?;

    let event = row.to_shared();
    feed.publish(pool, EventChange::Modified(event.clone())).await;

    Ok(event)
}

pub async fn delete_event(
    pool: &SqlitePool,
    feed: &EventFeed,
    event_id: &Uuid,
) -> Result<(), EventError> {
    let family_id: Option<String> =
        sqlx::query_scalar("SELECT family_id FROM events WHERE id = ?")
            .bind(event_id.to_string())
            .fetch_optional(pool)
            .await?;

    let family_id = family_id.ok_or(EventError::NotFound)?;

    sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(event_id.to_string())
        .execute(pool)
        .await?;

    feed.publish(
        pool,
        EventChange::Removed {
            id: *event_id,
            family_id: Uuid::parse_str(&family_id).unwrap_or_default(),
        },
    )
    .await;

    Ok(())
}

/// Point lookup, read-through the feed's advisory cache.
pub async fn get_event(
    pool: &SqlitePool,
    feed: &EventFeed,
    event_id: &Uuid,
) -> Result<Option<Event>, EventError> {
    if let Some(event) = feed.cached(event_id).await {
        return Ok(Some(event));
    }

    let row: Option<EventRow> = sqlx::query_as("SELECT * FROM events WHERE id = ?")
        .bind(event_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let event = row.to_shared();
            feed.remember(event.clone()).await;
            Ok(Some(event))
        }
        None => Ok(None),
    }
}

/// Range query on start time, ascending, with optional post-filters.
///
/// Query failures degrade to an empty list; a missing-index failure falls
/// back to an unordered family fetch filtered and sorted in memory.
pub async fn get_events(
    pool: &SqlitePool,
    family_id: &Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    filters: &EventFilters,
) -> Vec<Event> {
    let ranged: Result<Vec<EventRow>, sqlx::Error> = sqlx::query_as(
        r#"
        SELECT * FROM events
        WHERE family_id = ? AND start_time >= ? AND start_time <= ?
        ORDER BY start_time ASC
        "#,
    )
    .bind(family_id.to_string())
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await;

    match ranged {
        Ok(rows) => rows
            .iter()
            .map(|row| row.to_shared())
            .filter(|event| filters.matches(event))
            .collect(),
        Err(err) if store::is_index_missing(&err) => {
            log::warn!("Range index unavailable, falling back to family scan: {}", err);
            family_scan(pool, family_id, start, end, filters).await
        }
        Err(err) => {
            log::error!("Error querying events: {:?}", err);
            Vec::new()
        }
    }
}

async fn family_scan(
    pool: &SqlitePool,
    family_id: &Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    filters: &EventFilters,
) -> Vec<Event> {
    let rows: Result<Vec<EventRow>, sqlx::Error> =
        sqlx::query_as("SELECT * FROM events WHERE family_id = ?")
            .bind(family_id.to_string())
            .fetch_all(pool)
            .await;

    match rows {
        Ok(rows) => {
            let mut events: Vec<Event> = rows
                .iter()
                .map(|row| row.to_shared())
                .filter(|event| event.start_time >= start && event.start_time <= end)
                .filter(|event| filters.matches(event))
                .collect();
            events.sort_by_key(|event| event.start_time);
            events
        }
        Err(err) => {
            log::error!("Error scanning events: {:?}", err);
            Vec::new()
        }
    }
}

/// Case-insensitive substring search across title, description, location,
/// child name and attendee name/email.
pub async fn search_events(
    pool: &SqlitePool,
    family_id: &Uuid,
    term: &str,
    range: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> Vec<Event> {
    let (start, end) = range.unwrap_or_else(|| {
        let now = Utc::now();
        (
            now - Duration::days(SEARCH_WINDOW_DAYS),
            now + Duration::days(SEARCH_WINDOW_DAYS),
        )
    });

    let needle = term.to_lowercase();
    get_events(pool, family_id, start, end, &EventFilters::default())
        .await
        .into_iter()
        .filter(|event| event_matches_term(event, &needle))
        .collect()
}

fn event_matches_term(event: &Event, needle: &str) -> bool {
    if event.title.to_lowercase().contains(needle)
        || event.description.to_lowercase().contains(needle)
        || event.location.to_lowercase().contains(needle)
    {
        return true;
    }
    if let Some(ref child_name) = event.child_name {
        if child_name.to_lowercase().contains(needle) {
            return true;
        }
    }
    event.attendees.iter().any(|attendee| {
        attendee.name.to_lowercase().contains(needle)
            || attendee
                .email
                .as_ref()
                .is_some_and(|email| email.to_lowercase().contains(needle))
    })
}
