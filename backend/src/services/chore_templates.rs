use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ChoreTemplateRow;
use crate::services::{chore_instances, scheduler};
use shared::{ChoreTemplate, CreateChoreTemplateRequest, UpdateChoreTemplateRequest};

#[derive(Debug, Error)]
pub enum ChoreTemplateError {
    #[error("Chore template not found")]
    NotFound,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Instance generation error: {0}")]
    InstanceError(#[from] chore_instances::ChoreError),
}

pub async fn create_template(
    pool: &SqlitePool,
    family_id: &Uuid,
    request: &CreateChoreTemplateRequest,
) -> Result<ChoreTemplate, ChoreTemplateError> {
    if request.title.trim().is_empty() {
        return Err(ChoreTemplateError::Validation(
            "Chore title is required".to_string(),
        ));
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    let assigned_child_ids = request.assigned_child_ids.clone().unwrap_or_default();
    let days_of_week = request
        .days_of_week
        .as_ref()
        .map(|days| serde_json::to_string(days).unwrap_or_default());

    sqlx::query(
        r#"
        INSERT INTO chore_templates (id, family_id, title, description, time_of_day, bucks_reward,
                                     required, recurrence, days_of_week, assigned_child_ids,
                                     icon_url, active, archived, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(family_id.to_string())
    .bind(&request.title)
    .bind(request.description.as_deref().unwrap_or(""))
    .bind(request.time_of_day.as_str())
    .bind(request.bucks_reward)
    .bind(request.required.unwrap_or(false))
    .bind(request.recurrence.as_str())
    .bind(&days_of_week)
    .bind(serde_json::to_string(&assigned_child_ids).unwrap_or_else(|_| "[]".to_string()))
    .bind(&request.icon_url)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    // Templates start inactive; activation builds the per-child schedules and
    // today's instances in one step.
    if request.active.unwrap_or(true) {
        return activate_template(pool, &id).await;
    }

    get_template(pool, &id)
        .await?
        .ok_or(ChoreTemplateError::NotFound)
}

pub async fn get_template(
    pool: &SqlitePool,
    template_id: &Uuid,
) -> Result<Option<ChoreTemplate>, ChoreTemplateError> {
    let template: Option<ChoreTemplateRow> =
        sqlx::query_as("SELECT * FROM chore_templates WHERE id = ?")
            .bind(template_id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(template.map(|t| t.to_shared()))
}

pub async fn list_templates(
    pool: &SqlitePool,
    family_id: &Uuid,
    include_archived: bool,
) -> Result<Vec<ChoreTemplate>, ChoreTemplateError> {
    let query = if include_archived {
        "SELECT * FROM chore_templates WHERE family_id = ? ORDER BY created_at DESC"
    } else {
        "SELECT * FROM chore_templates WHERE family_id = ? AND archived = 0 ORDER BY created_at DESC"
    };

    let templates: Vec<ChoreTemplateRow> = sqlx::query_as(query)
        .bind(family_id.to_string())
        .fetch_all(pool)
        .await?;

    Ok(templates.into_iter().map(|t| t.to_shared()).collect())
}

pub async fn update_template(
    pool: &SqlitePool,
    template_id: &Uuid,
    request: &UpdateChoreTemplateRequest,
) -> Result<ChoreTemplate, ChoreTemplateError> {
    let mut template: ChoreTemplateRow =
        sqlx::query_as("SELECT * FROM chore_templates WHERE id = ?")
            .bind(template_id.to_string())
            .fetch_optional(pool)
            .await?
            .ok_or(ChoreTemplateError::NotFound)?;

    let was_active = template.active;

    if let Some(ref title) = request.title {
        template.title = title.clone();
    }
    if let Some(ref description) = request.description {
        template.description = description.clone();
    }
    if let Some(time_of_day) = request.time_of_day {
        template.time_of_day = time_of_day.as_str().to_string();
    }
    if let Some(bucks_reward) = request.bucks_reward {
        template.bucks_reward = bucks_reward;
    }
    if let Some(required) = request.required {
        template.required = required;
    }
    if let Some(recurrence) = request.recurrence {
        template.recurrence = recurrence.as_str().to_string();
    }
    if let Some(ref days_of_week) = request.days_of_week {
        template.days_of_week = Some(serde_json::to_string(days_of_week).unwrap_or_default());
    }
    if let Some(ref assigned_child_ids) = request.assigned_child_ids {
        template.assigned_child_ids =
            serde_json::to_string(assigned_child_ids).unwrap_or_else(|_| "[]".to_string());
    }
    if let Some(ref icon_url) = request.icon_url {
        template.icon_url = Some(icon_url.clone());
    }
    if let Some(active) = request.active {
        template.active = active;
    }

    let now = Utc::now();
    template.updated_at = now;

    sqlx::query(
        r#"
        UPDATE chore_templates SET title = ?, description = ?, time_of_day = ?, bucks_reward = ?,
                                   required = ?, recurrence = ?, days_of_week = ?,
                                   assigned_child_ids = ?, icon_url = ?, active = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&template.title)
    .bind(&template.description)
    .bind(&template.time_of_day)
    .bind(template.bucks_reward)
    .bind(template.required)
    .bind(&template.recurrence)
    .bind(&template.days_of_week)
    .bind(&template.assigned_child_ids)
    .bind(&template.icon_url)
    .bind(template.active)
    .bind(now)
    .bind(template_id.to_string())
    .execute(pool)
    .await?;

    let schedule_inputs_changed = request.recurrence.is_some()
        || request.days_of_week.is_some()
        || request.assigned_child_ids.is_some();

    if template.active && (!was_active || schedule_inputs_changed) {
        // Inactive -> active (or a schedule-shaping edit while active)
        // rebuilds the schedules and makes today's instances visible
        // immediately.
        let shared = template.to_shared();
        rebuild_schedules(pool, &shared).await?;
        chore_instances::generate_instances(pool, &shared.family_id, Utc::now().date_naive())
            .await?;
    } else if was_active && !template.active {
        deactivate_schedules(pool, template_id).await?;
    }

    Ok(template.to_shared())
}

/// Activate a template: per-child schedules are rebuilt from the recurrence
/// rule and today's instances are generated so the change is visible without
/// waiting for the nightly pass.
pub async fn activate_template(
    pool: &SqlitePool,
    template_id: &Uuid,
) -> Result<ChoreTemplate, ChoreTemplateError> {
    let template = get_template(pool, template_id)
        .await?
        .ok_or(ChoreTemplateError::NotFound)?;

    if template.archived {
        return Err(ChoreTemplateError::Validation(
            "Archived chore templates cannot be activated".to_string(),
        ));
    }

    sqlx::query("UPDATE chore_templates SET active = 1, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(template_id.to_string())
        .execute(pool)
        .await?;

    rebuild_schedules(pool, &template).await?;
    chore_instances::generate_instances(pool, &template.family_id, Utc::now().date_naive())
        .await?;

    get_template(pool, template_id)
        .await?
        .ok_or(ChoreTemplateError::NotFound)
}

pub async fn deactivate_template(
    pool: &SqlitePool,
    template_id: &Uuid,
) -> Result<ChoreTemplate, ChoreTemplateError> {
    let template = get_template(pool, template_id)
        .await?
        .ok_or(ChoreTemplateError::NotFound)?;

    sqlx::query("UPDATE chore_templates SET active = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(template_id.to_string())
        .execute(pool)
        .await?;
    deactivate_schedules(pool, template_id).await?;

    Ok(ChoreTemplate {
        active: false,
        ..template
    })
}

/// Soft delete. History keeps referencing the template, so rows are never
/// hard-deleted.
pub async fn archive_template(
    pool: &SqlitePool,
    template_id: &Uuid,
) -> Result<(), ChoreTemplateError> {
    let result =
        sqlx::query("UPDATE chore_templates SET archived = 1, active = 0, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(template_id.to_string())
            .execute(pool)
            .await?;

    if result.rows_affected() == 0 {
        return Err(ChoreTemplateError::NotFound);
    }
    deactivate_schedules(pool, template_id).await?;

    Ok(())
}

async fn rebuild_schedules(
    pool: &SqlitePool,
    template: &ChoreTemplate,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM chore_schedules WHERE template_id = ?")
        .bind(template.id.to_string())
        .execute(pool)
        .await?;

    let days = scheduler::schedule_days(template);
    let days_json = serde_json::to_string(&days).unwrap_or_else(|_| "[]".to_string());
    let now = Utc::now();

    for child_id in &template.assigned_child_ids {
        sqlx::query(
            r#"
            INSERT INTO chore_schedules (id, family_id, template_id, child_id, days_of_week, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(template.family_id.to_string())
        .bind(template.id.to_string())
        .bind(child_id.to_string())
        .bind(&days_json)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }

    Ok(())
}

async fn deactivate_schedules(pool: &SqlitePool, template_id: &Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE chore_schedules SET active = 0, updated_at = ? WHERE template_id = ?")
        .bind(Utc::now())
        .bind(template_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_pool;
    use shared::{Recurrence, TimeOfDay};

    fn daily_request(title: &str, child_id: Uuid) -> CreateChoreTemplateRequest {
        CreateChoreTemplateRequest {
            title: title.to_string(),
            description: None,
            time_of_day: TimeOfDay::Morning,
            bucks_reward: 5,
            required: Some(true),
            recurrence: Recurrence::Daily,
            days_of_week: None,
            assigned_child_ids: Some(vec![child_id]),
            icon_url: None,
            active: Some(true),
        }
    }

    #[tokio::test]
    async fn test_activation_builds_schedules_and_todays_instances() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();

        let template = create_template(&pool, &family_id, &daily_request("Make bed", child_id))
            .await
            .unwrap();
        assert!(template.active);

        let schedules: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chore_schedules WHERE template_id = ? AND active = 1")
                .bind(template.id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(schedules, 1);

        let instances: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM chore_instances WHERE template_id = ? AND child_id = ? AND date = ?",
        )
        .bind(template.id.to_string())
        .bind(child_id.to_string())
        .bind(Utc::now().date_naive())
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(instances, 1);
    }

    #[tokio::test]
    async fn test_weekly_schedule_lands_on_monday() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();

        let mut request = daily_request("Water plants", child_id);
        request.recurrence = Recurrence::Weekly;
        let template = create_template(&pool, &family_id, &request).await.unwrap();

        let days: String =
            sqlx::query_scalar("SELECT days_of_week FROM chore_schedules WHERE template_id = ?")
                .bind(template.id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(days, "[1]");
    }

    #[tokio::test]
    async fn test_archive_is_soft_and_hides_from_default_list() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();

        let template = create_template(&pool, &family_id, &daily_request("Dishes", child_id))
            .await
            .unwrap();

        archive_template(&pool, &template.id).await.unwrap();

        let visible = list_templates(&pool, &family_id, false).await.unwrap();
        assert!(visible.is_empty());

        let all = list_templates(&pool, &family_id, true).await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].archived);

        let result = activate_template(&pool, &template.id).await;
        assert!(matches!(result, Err(ChoreTemplateError::Validation(_))));
    }

    #[tokio::test]
    async fn test_deactivate_disables_schedules() {
        let pool = setup_pool().await;
        let family_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();

        let template = create_template(&pool, &family_id, &daily_request("Trash", child_id))
            .await
            .unwrap();
        deactivate_template(&pool, &template.id).await.unwrap();

        let active: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chore_schedules WHERE template_id = ? AND active = 1")
                .bind(template.id.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(active, 0);
    }
}
