use actix_web::{web, HttpResponse, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::ActorQuery;
use crate::models::AppState;
use crate::services::events as event_service;
use crate::services::events::EventError;
use shared::{ApiError, ApiSuccess, CreateEventRequest, EventFilters, EventType, UpdateEventRequest};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/events")
            .route("", web::get().to(list_events))
            .route("", web::post().to(create_event))
            .route("/search", web::get().to(search_events))
            .route("/{event_id}", web::get().to(get_event))
            .route("/{event_id}", web::put().to(update_event))
            .route("/{event_id}", web::delete().to(delete_event)),
    );
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    child_id: Option<Uuid>,
    event_type: Option<EventType>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    term: String,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

fn parse_family_id(raw: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        HttpResponse::BadRequest().json(ApiError {
            error: "invalid_id".to_string(),
            message: "Invalid family ID format".to_string(),
        })
    })
}

fn error_response(err: EventError, action: &str) -> HttpResponse {
    match err {
        EventError::NotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Event not found".to_string(),
        }),
        EventError::Validation(message) => HttpResponse::BadRequest().json(ApiError {
            error: "validation_error".to_string(),
            message,
        }),
        EventError::InvalidDate(parse_err) => HttpResponse::BadRequest().json(ApiError {
            error: "validation_error".to_string(),
            message: parse_err.to_string(),
        }),
        other => {
            log::error!("Error {} event: {:?}", action, other);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Failed to {} event", action),
            })
        }
    }
}

async fn list_events(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RangeQuery>,
) -> Result<HttpResponse> {
    let family_id = match parse_family_id(&path.into_inner()) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let filters = EventFilters {
        child_id: query.child_id,
        event_type: query.event_type,
    };
    let events =
        event_service::get_events(&state.db, &family_id, query.start, query.end, &filters).await;

    Ok(HttpResponse::Ok().json(ApiSuccess::new(events)))
}

async fn create_event(
    state: web::Data<AppState>,
    path: web::Path<String>,
    actor: web::Query<ActorQuery>,
    body: web::Json<CreateEventRequest>,
) -> Result<HttpResponse> {
    let family_id = match parse_family_id(&path.into_inner()) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match event_service::create_event(
        &state.db,
        &state.feed,
        &family_id,
        &actor.actor,
        &body.into_inner(),
        state.config.default_timezone,
    )
    .await
    {
        Ok(event) => Ok(HttpResponse::Created().json(ApiSuccess::new(event))),
        Err(err) => Ok(error_response(err, "create")),
    }
}

async fn search_events(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<SearchQuery>,
) -> Result<HttpResponse> {
    let family_id = match parse_family_id(&path.into_inner()) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let range = match (query.start, query.end) {
        (Some(start), Some(end)) => Some((start, end)),
        _ => None,
    };
    let events = event_service::search_events(&state.db, &family_id, &query.term, range).await;

    Ok(HttpResponse::Ok().json(ApiSuccess::new(events)))
}

async fn get_event(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (_, event_id) = path.into_inner();
    let event_id = match Uuid::parse_str(&event_id) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_id".to_string(),
                message: "Invalid event ID format".to_string(),
            }));
        }
    };

    match event_service::get_event(&state.db, &state.feed, &event_id).await {
        Ok(Some(event)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(event))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Event not found".to_string(),
        })),
        Err(err) => Ok(error_response(err, "fetch")),
    }
}

async fn update_event(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    actor: web::Query<ActorQuery>,
    body: web::Json<UpdateEventRequest>,
) -> Result<HttpResponse> {
    let (_, event_id) = path.into_inner();
    let event_id = match Uuid::parse_str(&event_id) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_id".to_string(),
                message: "Invalid event ID format".to_string(),
            }));
        }
    };

    match event_service::update_event(
        &state.db,
        &state.feed,
        &event_id,
        &actor.actor,
        &body.into_inner(),
    )
    .await
    {
        Ok(event) => Ok(HttpResponse::Ok().json(ApiSuccess::new(event))),
        Err(err) => Ok(error_response(err, "update")),
    }
}

async fn delete_event(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (_, event_id) = path.into_inner();
    let event_id = match Uuid::parse_str(&event_id) {
        Ok(id) => id,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(ApiError {
                error: "invalid_id".to_string(),
                message: "Invalid event ID format".to_string(),
            }));
        }
    };

    match event_service::delete_event(&state.db, &state.feed, &event_id).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(err) => Ok(error_response(err, "delete")),
    }
}
