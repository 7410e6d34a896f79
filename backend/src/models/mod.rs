use sqlx::SqlitePool;
use std::sync::Arc;

use crate::config::Config;
use crate::services::event_feed::EventFeed;

pub mod bucks;
pub mod chore_instance;
pub mod chore_schedule;
pub mod chore_template;
pub mod event;
pub mod reward_instance;
pub mod reward_template;
pub mod story;

pub use bucks::*;
pub use chore_instance::*;
pub use chore_schedule::*;
pub use chore_template::*;
pub use event::*;
pub use reward_instance::*;
pub use reward_template::*;
pub use story::*;

/// Application state shared across all handlers
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub feed: Arc<EventFeed>,
}
