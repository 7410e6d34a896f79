use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::services::chore_instances;
use tokio::time;

#[derive(Debug, Error)]
pub enum BackgroundJobError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Report from one generation pass
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub processed_at: chrono::DateTime<Utc>,
    pub families_processed: i64,
    pub instances_created: i64,
}

/// Configuration for the background job scheduler
#[derive(Debug, Clone)]
pub struct JobConfig {
    /// Hour of day to run the daily instance generation pass (0-23)
    pub generation_hour: u32,
    /// Minute of hour to run the pass (0-59)
    pub generation_minute: u32,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            generation_hour: 0, // Shortly after midnight
            generation_minute: 15,
        }
    }
}

/// Start the background job scheduler.
/// Runs in a loop, generating the day's chore instances for every family
/// with active schedules. Activation also generates immediately, so this
/// pass only fills in what nobody touched since midnight.
pub async fn start_scheduler(pool: Arc<SqlitePool>, config: JobConfig) {
    log::info!(
        "Background job scheduler started. Daily chore generation scheduled for {:02}:{:02}",
        config.generation_hour,
        config.generation_minute
    );

    loop {
        let now = Utc::now();
        let today_run = now
            .date_naive()
            .and_hms_opt(config.generation_hour, config.generation_minute, 0)
            .unwrap();

        let next_run = if now.naive_utc() < today_run {
            today_run
        } else {
            today_run + Duration::days(1)
        };

        let sleep_duration = (next_run - now.naive_utc())
            .to_std()
            .unwrap_or(std::time::Duration::from_secs(3600));

        log::debug!(
            "Next chore generation pass in {} seconds",
            sleep_duration.as_secs()
        );

        time::sleep(sleep_duration).await;

        match generate_daily_instances(&pool).await {
            Ok(report) => {
                log::info!(
                    "Chore generation pass at {}: {} families processed, {} instances created",
                    report.processed_at,
                    report.families_processed,
                    report.instances_created
                );
            }
            Err(e) => {
                log::error!("Error generating chore instances: {}", e);
            }
        }
    }
}

/// Generate today's instances for every family with active schedules.
pub async fn generate_daily_instances(
    pool: &SqlitePool,
) -> Result<GenerationReport, BackgroundJobError> {
    let today = Utc::now().date_naive();

    let family_ids: Vec<String> =
        sqlx::query_scalar("SELECT DISTINCT family_id FROM chore_schedules WHERE active = 1")
            .fetch_all(pool)
            .await?;

    let mut families_processed: i64 = 0;
    let mut instances_created: i64 = 0;

    for family_id in family_ids {
        let family_id = match Uuid::parse_str(&family_id) {
            Ok(id) => id,
            Err(_) => continue,
        };

        match chore_instances::generate_instances(pool, &family_id, today).await {
            Ok(created) => {
                families_processed += 1;
                instances_created += i64::from(created);
            }
            Err(e) => {
                log::error!("Generation failed for family {}: {}", family_id, e);
            }
        }
    }

    Ok(GenerationReport {
        processed_at: Utc::now(),
        families_processed,
        instances_created,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::chore_templates;
    use crate::test_support::setup_pool;
    use shared::{CreateChoreTemplateRequest, Recurrence, TimeOfDay};

    #[tokio::test]
    async fn test_daily_pass_covers_all_families() {
        let pool = setup_pool().await;
        let family_a = Uuid::new_v4();
        let family_b = Uuid::new_v4();

        for family_id in [&family_a, &family_b] {
            let request = CreateChoreTemplateRequest {
                title: "Sweep the floor".to_string(),
                description: None,
                time_of_day: TimeOfDay::Evening,
                bucks_reward: 2,
                required: Some(false),
                recurrence: Recurrence::Daily,
                days_of_week: None,
                assigned_child_ids: Some(vec![Uuid::new_v4()]),
                icon_url: None,
                // Inactive first so activation doesn't pre-generate.
                active: Some(false),
            };
            let template = chore_templates::create_template(&pool, family_id, &request)
                .await
                .unwrap();
            chore_templates::activate_template(&pool, &template.id)
                .await
                .unwrap();
            // Remove what activation generated so the pass has work to do.
            sqlx::query("DELETE FROM chore_instances WHERE family_id = ?")
                .bind(family_id.to_string())
                .execute(&pool)
                .await
                .unwrap();
        }

        let report = generate_daily_instances(&pool).await.unwrap();
        assert_eq!(report.families_processed, 2);
        assert_eq!(report.instances_created, 2);

        // Re-running right away creates nothing new.
        let rerun = generate_daily_instances(&pool).await.unwrap();
        assert_eq!(rerun.instances_created, 0);
    }
}
