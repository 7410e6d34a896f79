use actix_web::{web, HttpResponse, Result};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::ActorQuery;
use crate::models::AppState;
use crate::services::chore_instances::{self, ChoreError};
use crate::services::chore_templates::{self, ChoreTemplateError};
use shared::{
    ApiError, ApiSuccess, CompleteChoreRequest, CreateChoreTemplateRequest,
    UpdateChoreTemplateRequest,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/chores")
            .route("/templates", web::get().to(list_templates))
            .route("/templates", web::post().to(create_template))
            .route("/templates/{template_id}", web::get().to(get_template))
            .route("/templates/{template_id}", web::put().to(update_template))
            .route("/templates/{template_id}/activate", web::post().to(activate_template))
            .route("/templates/{template_id}/deactivate", web::post().to(deactivate_template))
            .route("/templates/{template_id}/archive", web::post().to(archive_template))
            .route("/templates/{template_id}/streak", web::get().to(get_streak))
            .route("/instances", web::get().to(list_instances))
            .route("/instances/generate", web::post().to(generate_instances))
            .route("/instances/pending-review", web::get().to(list_pending_review))
            .route("/instances/{instance_id}/complete", web::post().to(complete_instance))
            .route("/instances/{instance_id}/adjust", web::post().to(adjust_award))
            .route("/instances/{instance_id}/tip", web::post().to(tip_instance))
            .route("/instances/{instance_id}/reject", web::post().to(reject_instance)),
    );
}

#[derive(Debug, Deserialize)]
struct ListTemplatesQuery {
    #[serde(default)]
    include_archived: bool,
}

#[derive(Debug, Deserialize)]
struct ListInstancesQuery {
    child_id: Uuid,
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct GenerateQuery {
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct StreakQuery {
    child_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct AdjustBody {
    delta: i64,
}

#[derive(Debug, Deserialize)]
struct TipBody {
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct RejectBody {
    reason: Option<String>,
}

fn parse_id(raw: &str, label: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        HttpResponse::BadRequest().json(ApiError {
            error: "invalid_id".to_string(),
            message: format!("Invalid {} ID format", label),
        })
    })
}

fn template_error_response(err: ChoreTemplateError, action: &str) -> HttpResponse {
    match err {
        ChoreTemplateError::NotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Chore template not found".to_string(),
        }),
        ChoreTemplateError::Validation(message) => HttpResponse::BadRequest().json(ApiError {
            error: "validation_error".to_string(),
            message,
        }),
        other => {
            log::error!("Error {} chore template: {:?}", action, other);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Failed to {} chore template", action),
            })
        }
    }
}

fn instance_error_response(err: ChoreError, action: &str) -> HttpResponse {
    match err {
        ChoreError::NotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Chore instance not found".to_string(),
        }),
        ChoreError::TemplateNotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Chore template not found".to_string(),
        }),
        ChoreError::InvalidState(message) => HttpResponse::Conflict().json(ApiError {
            error: "invalid_state".to_string(),
            message,
        }),
        ChoreError::InvalidAdjustment => HttpResponse::BadRequest().json(ApiError {
            error: "validation_error".to_string(),
            message: "Adjustment must be +1 or -1".to_string(),
        }),
        other => {
            log::error!("Error {} chore instance: {:?}", action, other);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Failed to {} chore instance", action),
            })
        }
    }
}

async fn list_templates(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListTemplatesQuery>,
) -> Result<HttpResponse> {
    let family_id = match parse_id(&path.into_inner(), "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_templates::list_templates(&state.db, &family_id, query.include_archived).await {
        Ok(templates) => Ok(HttpResponse::Ok().json(ApiSuccess::new(templates))),
        Err(err) => Ok(template_error_response(err, "list")),
    }
}

async fn create_template(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CreateChoreTemplateRequest>,
) -> Result<HttpResponse> {
    let family_id = match parse_id(&path.into_inner(), "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_templates::create_template(&state.db, &family_id, &body.into_inner()).await {
        Ok(template) => Ok(HttpResponse::Created().json(ApiSuccess::new(template))),
        Err(err) => Ok(template_error_response(err, "create")),
    }
}

async fn get_template(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (_, template_id) = path.into_inner();
    let template_id = match parse_id(&template_id, "template") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_templates::get_template(&state.db, &template_id).await {
        Ok(Some(template)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(template))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Chore template not found".to_string(),
        })),
        Err(err) => Ok(template_error_response(err, "fetch")),
    }
}

async fn update_template(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateChoreTemplateRequest>,
) -> Result<HttpResponse> {
    let (_, template_id) = path.into_inner();
    let template_id = match parse_id(&template_id, "template") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_templates::update_template(&state.db, &template_id, &body.into_inner()).await {
        Ok(template) => Ok(HttpResponse::Ok().json(ApiSuccess::new(template))),
        Err(err) => Ok(template_error_response(err, "update")),
    }
}

async fn activate_template(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (_, template_id) = path.into_inner();
    let template_id = match parse_id(&template_id, "template") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_templates::activate_template(&state.db, &template_id).await {
        Ok(template) => Ok(HttpResponse::Ok().json(ApiSuccess::new(template))),
        Err(err) => Ok(template_error_response(err, "activate")),
    }
}

async fn deactivate_template(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (_, template_id) = path.into_inner();
    let template_id = match parse_id(&template_id, "template") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_templates::deactivate_template(&state.db, &template_id).await {
        Ok(template) => Ok(HttpResponse::Ok().json(ApiSuccess::new(template))),
        Err(err) => Ok(template_error_response(err, "deactivate")),
    }
}

async fn archive_template(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (_, template_id) = path.into_inner();
    let template_id = match parse_id(&template_id, "template") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_templates::archive_template(&state.db, &template_id).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(err) => Ok(template_error_response(err, "archive")),
    }
}

async fn get_streak(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    query: web::Query<StreakQuery>,
) -> Result<HttpResponse> {
    let (_, template_id) = path.into_inner();
    let template_id = match parse_id(&template_id, "template") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let today = Utc::now().date_naive();
    match chore_instances::streak_count(&state.db, &template_id, &query.child_id, today).await {
        Ok(streak) => Ok(HttpResponse::Ok().json(ApiSuccess::new(streak))),
        Err(err) => Ok(instance_error_response(err, "compute streak for")),
    }
}

async fn list_instances(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListInstancesQuery>,
) -> Result<HttpResponse> {
    let family_id = match parse_id(&path.into_inner(), "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    match chore_instances::list_for_child(&state.db, &family_id, &query.child_id, date).await {
        Ok(instances) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instances))),
        Err(err) => Ok(instance_error_response(err, "list")),
    }
}

async fn generate_instances(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<GenerateQuery>,
) -> Result<HttpResponse> {
    let family_id = match parse_id(&path.into_inner(), "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    match chore_instances::generate_instances(&state.db, &family_id, date).await {
        Ok(created) => Ok(HttpResponse::Ok().json(ApiSuccess::new(created))),
        Err(err) => Ok(instance_error_response(err, "generate")),
    }
}

async fn list_pending_review(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let family_id = match parse_id(&path.into_inner(), "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_instances::list_pending_review(&state.db, &family_id).await {
        Ok(instances) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instances))),
        Err(err) => Ok(instance_error_response(err, "list")),
    }
}

async fn complete_instance(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<CompleteChoreRequest>,
) -> Result<HttpResponse> {
    let (_, instance_id) = path.into_inner();
    let instance_id = match parse_id(&instance_id, "instance") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_instances::complete_instance(&state.db, &instance_id, &body.into_inner()).await {
        Ok(instance) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instance))),
        Err(err) => Ok(instance_error_response(err, "complete")),
    }
}

async fn adjust_award(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    actor: web::Query<ActorQuery>,
    body: web::Json<AdjustBody>,
) -> Result<HttpResponse> {
    let (_, instance_id) = path.into_inner();
    let instance_id = match parse_id(&instance_id, "instance") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_instances::adjust_award(&state.db, &instance_id, body.delta, &actor.actor).await {
        Ok(instance) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instance))),
        Err(err) => Ok(instance_error_response(err, "adjust")),
    }
}

async fn tip_instance(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    actor: web::Query<ActorQuery>,
    body: web::Json<TipBody>,
) -> Result<HttpResponse> {
    let (_, instance_id) = path.into_inner();
    let instance_id = match parse_id(&instance_id, "instance") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_instances::tip_instance(&state.db, &instance_id, body.amount, &actor.actor).await {
        Ok(transaction) => Ok(HttpResponse::Created().json(ApiSuccess::new(transaction))),
        Err(err) => Ok(instance_error_response(err, "tip")),
    }
}

async fn reject_instance(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    actor: web::Query<ActorQuery>,
    body: web::Json<RejectBody>,
) -> Result<HttpResponse> {
    let (_, instance_id) = path.into_inner();
    let instance_id = match parse_id(&instance_id, "instance") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match chore_instances::reject_instance(
        &state.db,
        &instance_id,
        &actor.actor,
        body.reason.as_deref(),
    )
    .await
    {
        Ok(instance) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instance))),
        Err(err) => Ok(instance_error_response(err, "reject")),
    }
}
