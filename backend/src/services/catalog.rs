use std::time::Duration;

use sqlx::SqlitePool;
use thiserror::Error;
use tokio::time;
use uuid::Uuid;

use crate::services::{chore_templates, reward_templates};
use shared::{
    CatalogKind, CreateChoreTemplateRequest, CreateRewardTemplateRequest, ImportReport,
    Recurrence, RewardCategory, TimeOfDay,
};

/// Pause between individual imports so a bulk import does not hammer the
/// store.
const IMPORT_THROTTLE: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Chore template error: {0}")]
    ChoreTemplateError(#[from] chore_templates::ChoreTemplateError),
    #[error("Reward template error: {0}")]
    RewardTemplateError(#[from] reward_templates::RewardTemplateError),
}

struct DefaultChore {
    title: &'static str,
    description: &'static str,
    time_of_day: TimeOfDay,
    bucks_reward: i64,
    required: bool,
    recurrence: Recurrence,
}

struct DefaultReward {
    title: &'static str,
    description: &'static str,
    bucks_price: i64,
    category: RewardCategory,
}

const DEFAULT_CHORES: &[DefaultChore] = &[
    DefaultChore {
        title: "Make your bed",
        description: "Straighten the sheets and arrange the pillows",
        time_of_day: TimeOfDay::Morning,
        bucks_reward: 2,
        required: true,
        recurrence: Recurrence::Daily,
    },
    DefaultChore {
        title: "Brush teeth",
        description: "Two full minutes",
        time_of_day: TimeOfDay::Morning,
        bucks_reward: 1,
        required: true,
        recurrence: Recurrence::Daily,
    },
    DefaultChore {
        title: "Brush teeth",
        description: "Two full minutes before bed",
        time_of_day: TimeOfDay::Evening,
        bucks_reward: 1,
        required: true,
        recurrence: Recurrence::Daily,
    },
    DefaultChore {
        title: "Pack your school bag",
        description: "Homework, lunch box, water bottle",
        time_of_day: TimeOfDay::Evening,
        bucks_reward: 2,
        required: true,
        recurrence: Recurrence::Weekdays,
    },
    DefaultChore {
        title: "Set the dinner table",
        description: "Plates, cutlery and glasses for everyone",
        time_of_day: TimeOfDay::Evening,
        bucks_reward: 3,
        required: false,
        recurrence: Recurrence::Daily,
    },
    DefaultChore {
        title: "Feed the pet",
        description: "Food and fresh water",
        time_of_day: TimeOfDay::Morning,
        bucks_reward: 2,
        required: false,
        recurrence: Recurrence::Daily,
    },
    DefaultChore {
        title: "Tidy your room",
        description: "Toys away, clothes in the hamper",
        time_of_day: TimeOfDay::Afternoon,
        bucks_reward: 5,
        required: false,
        recurrence: Recurrence::Weekly,
    },
    DefaultChore {
        title: "Take out the trash",
        description: "All bins to the curb",
        time_of_day: TimeOfDay::Evening,
        bucks_reward: 3,
        required: false,
        recurrence: Recurrence::Weekly,
    },
    DefaultChore {
        title: "Help with groceries",
        description: "Carry bags and put things away",
        time_of_day: TimeOfDay::Anytime,
        bucks_reward: 3,
        required: false,
        recurrence: Recurrence::AsNeeded,
    },
    DefaultChore {
        title: "Water the plants",
        description: "Indoor plants and the balcony",
        time_of_day: TimeOfDay::Afternoon,
        bucks_reward: 2,
        required: false,
        recurrence: Recurrence::Weekly,
    },
];

const DEFAULT_REWARDS: &[DefaultReward] = &[
    DefaultReward {
        title: "30 minutes extra screen time",
        description: "Games or shows, your pick",
        bucks_price: 10,
        category: RewardCategory::Privileges,
    },
    DefaultReward {
        title: "Stay up 30 minutes later",
        description: "Weekend nights only",
        bucks_price: 15,
        category: RewardCategory::Privileges,
    },
    DefaultReward {
        title: "Pick the movie for family night",
        description: "Everyone watches what you choose",
        bucks_price: 12,
        category: RewardCategory::Activities,
    },
    DefaultReward {
        title: "Ice cream outing",
        description: "A trip to the ice cream shop",
        bucks_price: 20,
        category: RewardCategory::Activities,
    },
    DefaultReward {
        title: "Small toy or book",
        description: "Up to the agreed budget",
        bucks_price: 40,
        category: RewardCategory::Items,
    },
    DefaultReward {
        title: "Sticker pack",
        description: "One pack of your choice",
        bucks_price: 8,
        category: RewardCategory::Items,
    },
    DefaultReward {
        title: "Sleepover with a friend",
        description: "Plan it with a parent",
        bucks_price: 50,
        category: RewardCategory::SpecialEvents,
    },
    DefaultReward {
        title: "Day trip of your choice",
        description: "Zoo, museum or pool",
        bucks_price: 100,
        category: RewardCategory::SpecialEvents,
    },
];

/// Import the starter catalog, best-effort: duplicates are skipped up front,
/// per-item failures are collected without aborting the rest, and items are
/// throttled to one per 100 ms.
pub async fn import_defaults(
    pool: &SqlitePool,
    family_id: &Uuid,
    kind: CatalogKind,
) -> Result<ImportReport, CatalogError> {
    match kind {
        CatalogKind::Chores => import_default_chores(pool, family_id).await,
        CatalogKind::Rewards => import_default_rewards(pool, family_id).await,
    }
}

async fn import_default_chores(
    pool: &SqlitePool,
    family_id: &Uuid,
) -> Result<ImportReport, CatalogError> {
    let existing = chore_templates::list_templates(pool, family_id, false).await?;
    let mut report = ImportReport::default();

    for chore in DEFAULT_CHORES {
        // Title alone is not a key: "Brush teeth" exists for both morning
        // and evening.
        let duplicate = existing
            .iter()
            .any(|t| t.title == chore.title && t.time_of_day == chore.time_of_day);
        if duplicate {
            report.skipped += 1;
            continue;
        }

        let request = CreateChoreTemplateRequest {
            title: chore.title.to_string(),
            description: Some(chore.description.to_string()),
            time_of_day: chore.time_of_day,
            bucks_reward: chore.bucks_reward,
            required: Some(chore.required),
            recurrence: chore.recurrence,
            days_of_week: None,
            assigned_child_ids: None,
            icon_url: None,
            active: Some(true),
        };

        match chore_templates::create_template(pool, family_id, &request).await {
            Ok(_) => report.imported += 1,
            Err(err) => {
                log::error!("Failed to import default chore '{}': {:?}", chore.title, err);
                report.failed += 1;
                report.errors.push(format!("{}: {}", chore.title, err));
            }
        }

        time::sleep(IMPORT_THROTTLE).await;
    }

    log::info!(
        "Default chore import for {}: {} imported, {} skipped, {} failed",
        family_id,
        report.imported,
        report.skipped,
        report.failed
    );

    Ok(report)
}

async fn import_default_rewards(
    pool: &SqlitePool,
    family_id: &Uuid,
) -> Result<ImportReport, CatalogError> {
    let existing = reward_templates::list_templates(pool, family_id, false).await?;
    let mut report = ImportReport::default();

    for reward in DEFAULT_REWARDS {
        let duplicate = existing
            .iter()
            .any(|t| t.title == reward.title && t.category == reward.category);
        if duplicate {
            report.skipped += 1;
            continue;
        }

        let request = CreateRewardTemplateRequest {
            title: reward.title.to_string(),
            description: Some(reward.description.to_string()),
            bucks_price: reward.bucks_price,
            category: reward.category,
            quantity: None,
            expires_at: None,
            image_url: None,
            available_to: None,
        };

        match reward_templates::create_or_get(pool, family_id, &request).await {
            Ok(_) => report.imported += 1,
            Err(err) => {
                log::error!("Failed to import default reward '{}': {:?}", reward.title, err);
                report.failed += 1;
                report.errors.push(format!("{}: {}", reward.title, err));
            }
        }

        time::sleep(IMPORT_THROTTLE).await;
    }

    log::info!(
        "Default reward import for {}: {} imported, {} skipped, {} failed",
        family_id,
        report.imported,
        report.skipped,
        report.failed
    );

    Ok(report)
}
