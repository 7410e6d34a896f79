use actix_web::{web, HttpResponse, Result};
use uuid::Uuid;

use crate::models::AppState;
use crate::services::catalog;
use shared::{ApiError, ApiSuccess, CatalogKind};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/import-defaults").route("/{kind}", web::post().to(import_defaults)),
    );
}

async fn import_defaults(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (family_id, kind) = path.into_inner();

    let family_id = match Uuid::parse_str(&family_id) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_id".to_string(),
                message: "Invalid family ID format".to_string(),
            }));
        }
    };

    let kind = match kind.as_str() {
        "chores" => CatalogKind::Chores,
        "rewards" => CatalogKind::Rewards,
        other => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_kind".to_string(),
                message: format!("Unknown catalog kind: {}", other),
            }));
        }
    };

    match catalog::import_defaults(&state.db, &family_id, kind).await {
        Ok(report) => Ok(HttpResponse::Ok().json(ApiSuccess::new(report))),
        Err(err) => {
            log::error!("Error importing defaults: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to import defaults".to_string(),
            }))
        }
    }
}
