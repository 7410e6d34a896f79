use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::ActorQuery;
use crate::models::AppState;
use crate::services::bucks;
use shared::{AdjustBucksRequest, ApiError, ApiSuccess};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bucks")
            .route("/balances", web::get().to(family_balances))
            .route("/{child_id}/balance", web::get().to(get_balance))
            .route("/{child_id}/history", web::get().to(get_history))
            .route("/{child_id}/stats", web::get().to(get_stats))
            .route("/{child_id}/adjust", web::post().to(adjust_balance)),
    );
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    days: Option<i64>,
}

fn parse_id(raw: &str, label: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        HttpResponse::BadRequest().json(ApiError {
            error: "invalid_id".to_string(),
            message: format!("Invalid {} ID format", label),
        })
    })
}

fn internal_error(err: bucks::BucksError, action: &str) -> HttpResponse {
    log::error!("Error {} bucks: {:?}", action, err);
    HttpResponse::InternalServerError().json(ApiError {
        error: "internal_error".to_string(),
        message: format!("Failed to {}", action),
    })
}

async fn family_balances(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let family_id = match parse_id(&path.into_inner(), "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match bucks::get_family_balances(&state.db, &family_id).await {
        Ok(balances) => Ok(HttpResponse::Ok().json(ApiSuccess::new(balances))),
        Err(err) => Ok(internal_error(err, "list balances")),
    }
}

async fn get_balance(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (_, child_id) = path.into_inner();
    let child_id = match parse_id(&child_id, "child") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match bucks::get_balance(&state.db, &child_id).await {
        Ok(balance) => Ok(HttpResponse::Ok().json(ApiSuccess::new(balance))),
        Err(err) => Ok(internal_error(err, "fetch balance")),
    }
}

async fn get_history(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    query: web::Query<HistoryQuery>,
) -> Result<HttpResponse> {
    let (family_id, child_id) = path.into_inner();
    let family_id = match parse_id(&family_id, "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let child_id = match parse_id(&child_id, "child") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match bucks::get_history(&state.db, &family_id, &child_id, query.limit).await {
        Ok(history) => Ok(HttpResponse::Ok().json(ApiSuccess::new(history))),
        Err(err) => Ok(internal_error(err, "fetch history")),
    }
}

async fn get_stats(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    query: web::Query<StatsQuery>,
) -> Result<HttpResponse> {
    let (family_id, child_id) = path.into_inner();
    let family_id = match parse_id(&family_id, "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let child_id = match parse_id(&child_id, "child") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match bucks::get_stats(&state.db, &family_id, &child_id, query.days.unwrap_or(30)).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiSuccess::new(stats))),
        Err(err) => Ok(internal_error(err, "compute stats")),
    }
}

async fn adjust_balance(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    actor: web::Query<ActorQuery>,
    body: web::Json<AdjustBucksRequest>,
) -> Result<HttpResponse> {
    let (family_id, child_id) = path.into_inner();
    let family_id = match parse_id(&family_id, "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let child_id = match parse_id(&child_id, "child") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match bucks::adjust_balance(
        &state.db,
        &family_id,
        &child_id,
        body.amount,
        body.reason.as_deref(),
        &actor.actor,
    )
    .await
    {
        Ok(transaction) => Ok(HttpResponse::Created().json(ApiSuccess::new(transaction))),
        Err(err) => Ok(internal_error(err, "adjust balance")),
    }
}
