use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::AppState;
use crate::services::story;
use shared::{ApiError, ApiSuccess};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/stories").route("", web::get().to(list_stories)));
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<i64>,
}

async fn list_stories(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse> {
    let family_id = match Uuid::parse_str(&path.into_inner()) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_id".to_string(),
                message: "Invalid family ID format".to_string(),
            }));
        }
    };

    match story::list(&state.db, &family_id, query.limit).await {
        Ok(entries) => Ok(HttpResponse::Ok().json(ApiSuccess::new(entries))),
        Err(err) => {
            log::error!("Error listing stories: {:?}", err);
            Ok(HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: "Failed to list stories".to_string(),
            }))
        }
    }
}
