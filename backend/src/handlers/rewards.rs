use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::handlers::ActorQuery;
use crate::models::AppState;
use crate::services::reward_templates::{self, RewardTemplateError};
use crate::services::rewards::{self, RewardError};
use shared::{
    AddMemoriesRequest, ApiError, ApiSuccess, ApproveRewardRequest, CreateRewardTemplateRequest,
    RejectRewardRequest, RequestRewardRequest, RewardStatus, UpdateRewardTemplateRequest,
};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/rewards")
            .route("/templates", web::get().to(list_templates))
            .route("/templates", web::post().to(create_template))
            .route("/templates/{template_id}", web::get().to(get_template))
            .route("/templates/{template_id}", web::put().to(update_template))
            .route("/templates/{template_id}/deactivate", web::post().to(deactivate_template))
            .route("/templates/{template_id}/request", web::post().to(request_reward))
            .route("/instances", web::get().to(list_child_rewards))
            .route("/instances/pending", web::get().to(list_pending_approval))
            .route("/instances/{instance_id}", web::get().to(get_instance))
            .route("/instances/{instance_id}/approve", web::post().to(approve_reward))
            .route("/instances/{instance_id}/reject", web::post().to(reject_reward))
            .route("/instances/{instance_id}/fulfill", web::post().to(fulfill_reward))
            .route("/instances/{instance_id}/memories", web::post().to(add_memories)),
    );
}

#[derive(Debug, Deserialize)]
struct ListTemplatesQuery {
    #[serde(default)]
    include_inactive: bool,
}

#[derive(Debug, Deserialize)]
struct ListInstancesQuery {
    child_id: Uuid,
    status: Option<RewardStatus>,
}

fn parse_id(raw: &str, label: &str) -> Result<Uuid, HttpResponse> {
    Uuid::parse_str(raw).map_err(|_| {
        HttpResponse::BadRequest().json(ApiError {
            error: "invalid_id".to_string(),
            message: format!("Invalid {} ID format", label),
        })
    })
}

fn template_error_response(err: RewardTemplateError, action: &str) -> HttpResponse {
    match err {
        RewardTemplateError::NotFound => HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Reward template not found".to_string(),
        }),
        RewardTemplateError::Validation(message) => HttpResponse::BadRequest().json(ApiError {
            error: "validation_error".to_string(),
            message,
        }),
        other => {
            log::error!("Error {} reward template: {:?}", action, other);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Failed to {} reward template", action),
            })
        }
    }
}

fn reward_error_response(err: RewardError, action: &str) -> HttpResponse {
    match err {
        RewardError::NotFound | RewardError::TemplateNotFound => {
            HttpResponse::NotFound().json(ApiError {
                error: "not_found".to_string(),
                message: err.to_string(),
            })
        }
        RewardError::NotAvailable | RewardError::OutOfStock | RewardError::Expired => {
            HttpResponse::Conflict().json(ApiError {
                error: "not_available".to_string(),
                message: err.to_string(),
            })
        }
        RewardError::InvalidState(message) => HttpResponse::Conflict().json(ApiError {
            error: "invalid_state".to_string(),
            message,
        }),
        other => {
            log::error!("Error {} reward: {:?}", action, other);
            HttpResponse::InternalServerError().json(ApiError {
                error: "internal_error".to_string(),
                message: format!("Failed to {} reward", action),
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

    match reward_templates::list_templates(&state.db, &family_id, !query.include_inactive).await {
        Ok(templates) => Ok(HttpResponse::Ok().json(ApiSuccess::new(templates))),
        Err(err) => Ok(template_error_response(err, "list")),
    }
}

async fn create_template(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CreateRewardTemplateRequest>,
) -> Result<HttpResponse> {
    let family_id = match parse_id(&path.into_inner(), "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match reward_templates::create_template(&state.db, &family_id, &body.into_inner()).await {
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

    match reward_templates::get_template(&state.db, &template_id).await {
        Ok(Some(template)) => Ok(HttpResponse::Ok().json(ApiSuccess::new(template))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiError {
            error: "not_found".to_string(),
            message: "Reward template not found".to_string(),
        })),
        Err(err) => Ok(template_error_response(err, "fetch")),
    }
}

async fn update_template(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateRewardTemplateRequest>,
) -> Result<HttpResponse> {
    let (_, template_id) = path.into_inner();
    let template_id = match parse_id(&template_id, "template") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match reward_templates::update_template(&state.db, &template_id, &body.into_inner()).await {
        Ok(template) => Ok(HttpResponse::Ok().json(ApiSuccess::new(template))),
        Err(err) => Ok(template_error_response(err, "update")),
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

    match reward_templates::deactivate_template(&state.db, &template_id).await {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(err) => Ok(template_error_response(err, "deactivate")),
    }
}

async fn request_reward(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    actor: web::Query<ActorQuery>,
    body: web::Json<RequestRewardRequest>,
) -> Result<HttpResponse> {
    let (family_id, template_id) = path.into_inner();
    let family_id = match parse_id(&family_id, "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let template_id = match parse_id(&template_id, "template") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    // The requesting actor is the child redeeming the reward.
    match rewards::request_reward(
        &state.db,
        &family_id,
        &actor.actor,
        &template_id,
        &body.into_inner(),
    )
    .await
    {
        Ok(instance) => Ok(HttpResponse::Created().json(ApiSuccess::new(instance))),
        Err(err) => Ok(reward_error_response(err, "request")),
    }
}

async fn list_child_rewards(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<ListInstancesQuery>,
) -> Result<HttpResponse> {
    let family_id = match parse_id(&path.into_inner(), "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match rewards::list_child_rewards(&state.db, &family_id, &query.child_id, query.status).await {
        Ok(instances) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instances))),
        Err(err) => Ok(reward_error_response(err, "list")),
    }
}

async fn list_pending_approval(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let family_id = match parse_id(&path.into_inner(), "family") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match rewards::list_pending_approval(&state.db, &family_id).await {
        Ok(instances) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instances))),
        Err(err) => Ok(reward_error_response(err, "list")),
    }
}

async fn get_instance(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse> {
    let (_, instance_id) = path.into_inner();
    let instance_id = match parse_id(&instance_id, "instance") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match rewards::get_instance(&state.db, &instance_id).await {
        Ok(instance) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instance))),
        Err(err) => Ok(reward_error_response(err, "fetch")),
    }
}

async fn approve_reward(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    actor: web::Query<ActorQuery>,
    body: web::Json<ApproveRewardRequest>,
) -> Result<HttpResponse> {
    let (_, instance_id) = path.into_inner();
    let instance_id = match parse_id(&instance_id, "instance") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match rewards::approve_reward(
        &state.db,
        &state.feed,
        &instance_id,
        &actor.actor,
        &body.into_inner(),
        state.config.default_timezone,
    )
    .await
    {
        Ok(instance) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instance))),
        Err(err) => Ok(reward_error_response(err, "approve")),
    }
}

async fn reject_reward(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    actor: web::Query<ActorQuery>,
    body: web::Json<RejectRewardRequest>,
) -> Result<HttpResponse> {
    let (_, instance_id) = path.into_inner();
    let instance_id = match parse_id(&instance_id, "instance") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match rewards::reject_reward(&state.db, &instance_id, &actor.actor, &body.reason).await {
        Ok(instance) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instance))),
        Err(err) => Ok(reward_error_response(err, "reject")),
    }
}

async fn fulfill_reward(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    actor: web::Query<ActorQuery>,
) -> Result<HttpResponse> {
    let (_, instance_id) = path.into_inner();
    let instance_id = match parse_id(&instance_id, "instance") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match rewards::fulfill_reward(&state.db, &state.feed, &instance_id, &actor.actor).await {
        Ok(instance) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instance))),
        Err(err) => Ok(reward_error_response(err, "fulfill")),
    }
}

async fn add_memories(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<AddMemoriesRequest>,
) -> Result<HttpResponse> {
    let (_, instance_id) = path.into_inner();
    let instance_id = match parse_id(&instance_id, "instance") {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };

    match rewards::add_memories(&state.db, &instance_id, &body.into_inner()).await {
        Ok(instance) => Ok(HttpResponse::Ok().json(ApiSuccess::new(instance))),
        Err(err) => Ok(reward_error_response(err, "add memories to")),
    }
}
