use actix_web::web;
use serde::Deserialize;
use uuid::Uuid;

pub mod bucks;
pub mod catalog;
pub mod chores;
pub mod events;
pub mod feed;
pub mod rewards;
pub mod story;

/// Acting user (parent or child), supplied by the authenticating gateway in
/// front of this service.
#[derive(Debug, Deserialize)]
pub struct ActorQuery {
    pub actor: Uuid,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/families/{family_id}")
            .configure(events::configure)
            .configure(chores::configure)
            .configure(rewards::configure)
            .configure(bucks::configure)
            .configure(story::configure)
            .configure(catalog::configure),
    );
}
