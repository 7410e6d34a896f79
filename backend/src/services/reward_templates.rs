use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::RewardTemplateRow;
use shared::{
    CreateRewardTemplateRequest, RewardTemplate, UpdateRewardTemplateRequest, UNLIMITED_QUANTITY,
};

#[derive(Debug, Error)]
pub enum RewardTemplateError {
    #[error("Reward template not found")]
    NotFound,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

pub async fn create_template(
    pool: &SqlitePool,
    family_id: &Uuid,
    request: &CreateRewardTemplateRequest,
) -> Result<RewardTemplate, RewardTemplateError> {
    if request.title.trim().is_empty() {
        return Err(RewardTemplateError::Validation(
            "Reward title is required".to_string(),
        ));
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    let available_to = request.available_to.clone().unwrap_or_default();

    sqlx::query(
        r#"
        INSERT INTO reward_templates (id, family_id, title, description, bucks_price, category,
                                      quantity, expires_at, image_url, available_to, active,
                                      created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(family_id.to_string())
    .bind(&request.title)
    .bind(request.description.as_deref().unwrap_or(""))
    .bind(request.bucks_price)
    .bind(request.category.as_str())
    .bind(request.quantity.unwrap_or(UNLIMITED_QUANTITY))
    .bind(request.expires_at)
    .bind(&request.image_url)
    .bind(serde_json::to_string(&available_to).unwrap_or_else(|_| "[]".to_string()))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(RewardTemplate {
        id,
        family_id: *family_id,
        title: request.title.clone(),
        description: request.description.clone().unwrap_or_default(),
        bucks_price: request.bucks_price,
        category: request.category,
        quantity: request.quantity.unwrap_or(UNLIMITED_QUANTITY),
        expires_at: request.expires_at,
        image_url: request.image_url.clone(),
        available_to,
        active: true,
        created_at: now,
        updated_at: now,
    })
}

/// Idempotent creation point used by the bulk import: an existing template
/// with the same title and category is returned instead of duplicated.
pub async fn create_or_get(
    pool: &SqlitePool,
    family_id: &Uuid,
    request: &CreateRewardTemplateRequest,
) -> Result<RewardTemplate, RewardTemplateError> {
    let existing: Option<RewardTemplateRow> = sqlx::query_as(
        "SELECT * FROM reward_templates WHERE family_id = ? AND title = ? AND category = ?",
    )
    .bind(family_id.to_string())
    .bind(&request.title)
    .bind(request.category.as_str())
    .fetch_optional(pool)
    .await?;

    if let Some(existing) = existing {
        return Ok(existing.to_shared());
    }

    create_template(pool, family_id, request).await
}

pub async fn get_template(
    pool: &SqlitePool,
    template_id: &Uuid,
) -> Result<Option<RewardTemplate>, RewardTemplateError> {
    let template: Option<RewardTemplateRow> =
        sqlx::query_as("SELECT * FROM reward_templates WHERE id = ?")
            .bind(template_id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(template.map(|t| t.to_shared()))
}

pub async fn list_templates(
    pool: &SqlitePool,
    family_id: &Uuid,
    active_only: bool,
) -> Result<Vec<RewardTemplate>, RewardTemplateError> {
    let query = if active_only {
        "SELECT * FROM reward_templates WHERE family_id = ? AND active = 1 ORDER BY created_at DESC"
    } else {
        "SELECT * FROM reward_templates WHERE family_id = ? ORDER BY created_at DESC"
    };

    let templates: Vec<RewardTemplateRow> = sqlx::query_as(query)
        .bind(family_id.to_string())
        .fetch_all(pool)
        .await?;

    Ok(templates.into_iter().map(|t| t.to_shared()).collect())
}

pub async fn update_template(
    pool: &SqlitePool,
    template_id: &Uuid,
    request: &UpdateRewardTemplateRequest,
) -> Result<RewardTemplate, RewardTemplateError> {
    let mut template: RewardTemplateRow =
        sqlx::query_as("SELECT * FROM reward_templates WHERE id = ?")
            .bind(template_id.to_string())
            .fetch_optional(pool)
            .await?
            .ok_or(RewardTemplateError::NotFound)?;

    if let Some(ref title) = request.title {
        template.title = title.clone();
    }
    if let Some(ref description) = request.description {
        template.description = description.clone();
    }
    if let Some(bucks_price) = request.bucks_price {
        template.bucks_price = bucks_price;
    }
    if let Some(category) = request.category {
        template.category = category.as_str().to_string();
    }
    if let Some(quantity) = request.quantity {
        template.quantity = quantity;
    }
    if let Some(expires_at) = request.expires_at {
        template.expires_at = Some(expires_at);
    }
    if let Some(ref image_url) = request.image_url {
        template.image_url = Some(image_url.clone());
    }
    if let Some(ref available_to) = request.available_to {
        template.available_to =
            serde_json::to_string(available_to).unwrap_or_else(|_| "[]".to_string());
    }
    if let Some(active) = request.active {
        template.active = active;
    }

    let now = Utc::now();
    template.updated_at = now;

    sqlx::query(
        r#"
        UPDATE reward_templates SET title = ?, description = ?, bucks_price = ?, category = ?,
                                    quantity = ?, expires_at = ?, image_url = ?, available_to = ?,
                                    active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&template.title)
    .bind(&template.description)
    .bind(template.bucks_price)
    .bind(&template.category)
    .bind(template.quantity)
    .bind(template.expires_at)
    .bind(&template.image_url)
    .bind(&template.available_to)
    .bind(template.active)
    .bind(now)
    .bind(template_id.to_string())
    .execute(pool)
    .await?;

    Ok(template.to_shared())
}

/// Soft deactivation; redemption history keeps pointing at the row.
pub async fn deactivate_template(
    pool: &SqlitePool,
    template_id: &Uuid,
) -> Result<(), RewardTemplateError> {
    let result =
        sqlx::query("UPDATE reward_templates SET active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(template_id.to_string())
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(RewardTemplateError::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_pool;
    use shared::RewardCategory;

    fn request(title: &str, category: RewardCategory) -> CreateRewardTemplateRequest {
        CreateRewardTemplateRequest {
            title: title.to_string(),
            description: None,
            bucks_price: 15,
            category,
            quantity: None,
            expires_at: None,
            image_url: None,
            available_to: None,
        }
    }

    #[tokio::test]
    async fn test_create_or_get_is_idempotent_on_title_and_category() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();

        let first = create_or_get(&pool, &family_id, &request("Ice cream", RewardCategory::Items))
            .await
            .unwrap();
        let second = create_or_get(&pool, &family_id, &request("Ice cream", RewardCategory::Items))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        // Same title in a different category is a different reward.
        let third = create_or_get(
            &pool,
            &family_id,
            &request("Ice cream", RewardCategory::Activities),
        )
        .await
        .unwrap();
        assert_ne!(first.id, third.id);
    }

    #[tokio::test]
    async fn test_deactivate_hides_from_active_list() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();

        let template =
            create_template(&pool, &family_id, &request("Movie night", RewardCategory::Activities))
                .await
                .unwrap();
        deactivate_template(&pool, &template.id).await.unwrap();

        assert!(list_templates(&pool, &family_id, true).await.unwrap().is_empty());
        assert_eq!(list_templates(&pool, &family_id, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_quantity_defaults_to_unlimited() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();

        let template =
            create_template(&pool, &family_id, &request("Stickers", RewardCategory::Items))
                .await
                .unwrap();
        assert!(template.is_unlimited());
    }
}
