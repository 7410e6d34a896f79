use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::StoryEntryRow;
use shared::{StoryEntry, StoryKind};

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Append a denormalized entry to the family story feed.
#[allow(clippy::too_many_arguments)]
pub async fn append(
    pool: &SqlitePool,
    family_id: &Uuid,
    kind: StoryKind,
    source_id: Option<&Uuid>,
    title: &str,
    description: &str,
    photo_urls: &[String],
    child_id: Option<&Uuid>,
    child_name: Option<&str>,
) -> Result<StoryEntry, StoryError> {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO story_entries (id, family_id, kind, source_id, title, description, photo_urls, child_id, child_name, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(family_id.to_string())
    .bind(kind.as_str())
    .bind(source_id.map(|s| s.to_string()))
    .bind(title)
    .bind(description)
    .bind(serde_json::to_string(photo_urls).unwrap_or_else(|_| "[]".to_string()))
    .bind(child_id.map(|c| c.to_string()))
    .bind(child_name)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(StoryEntry {
        id,
        family_id: *family_id,
        kind,
        source_id: source_id.copied(),
        title: title.to_string(),
        description: description.to_string(),
        photo_urls: photo_urls.to_vec(),
        child_id: child_id.copied(),
        child_name: child_name.map(|n| n.to_string()),
        created_at: now,
    })
}

pub async fn list(
    pool: &SqlitePool,
    family_id: &Uuid,
    limit: Option<i64>,
) -> Result<Vec<StoryEntry>, StoryError> {
    let limit = limit.unwrap_or(100);

    let entries: Vec<StoryEntryRow> = sqlx::query_as(
        "SELECT * FROM story_entries WHERE family_id = ? ORDER BY created_at DESC LIMIT ?",
    )
    .bind(family_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(entries.into_iter().map(|e| e.to_shared()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_pool;

    #[tokio::test]
    async fn test_append_and_list() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();

        append(
            &pool,
            &family_id,
            StoryKind::General,
            None,
            "First day of school",
            "",
            &[],
            None,
            Some("Mia"),
        )
        .await
        .unwrap();

        let entries = list(&pool, &family_id, None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "First day of school");
        assert_eq!(entries[0].child_name.as_deref(), Some("Mia"));
    }
}
