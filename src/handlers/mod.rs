/// HTTP request handlers
use crate::domain::{AstronautInput, MissionInput, SpaceshipInput};
use crate::errors::ApiError;
use crate::services::{AstronautService, MissionService, SpaceshipService};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub astronaut_service: Arc<AstronautService>,
    pub spaceship_service: Arc<SpaceshipService>,
    pub mission_service: Arc<MissionService>,
    pub default_list_limit: i64,
}

/// Successful response wrapper
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub ok: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self { ok: true, data }
    }
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub now: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct PageParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn created(id: i64) -> impl IntoResponse {
    (
        StatusCode::CREATED,
        Json(serde_json::json!(SuccessResponse::new(
            serde_json::json!({ "id": id })
        ))),
    )
}

/// Health check handler
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        now: Utc::now(),
    })
}

/// Create an astronaut
pub async fn create_astronaut(
    State(state): State<AppState>,
    Json(input): Json<AstronautInput>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.astronaut_service.create(input).await?;
    Ok(created(id))
}

/// Astronaut detail, age included
pub async fn get_astronaut(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let detail = state.astronaut_service.get(id).await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(detail))))
}

/// Edit an astronaut
pub async fn update_astronaut(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<AstronautInput>,
) -> Result<Json<Value>, ApiError> {
    state.astronaut_service.update(id, input).await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({ "id": id })
    ))))
}

/// List astronauts, ordered by last then first name
pub async fn list_astronauts(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let astronauts = state.astronaut_service.list().await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({ "astronauts": astronauts })
    ))))
}

/// Create a spaceship
pub async fn create_spaceship(
    State(state): State<AppState>,
    Json(input): Json<SpaceshipInput>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.spaceship_service.create(input).await?;
    Ok(created(id))
}

/// Spaceship detail
pub async fn get_spaceship(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let spaceship = state.spaceship_service.get(id).await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(spaceship))))
}

/// Edit a spaceship
pub async fn update_spaceship(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<SpaceshipInput>,
) -> Result<Json<Value>, ApiError> {
    state.spaceship_service.update(id, input).await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({ "id": id })
    ))))
}

/// List all spaceships
pub async fn list_spaceships(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let spaceships = state.spaceship_service.list(false).await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({ "spaceships": spaceships })
    ))))
}

/// Choice list for mission forms: spaceships currently flagged available.
/// Advisory only; the save-time validator is authoritative.
pub async fn list_available_spaceships(
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let spaceships = state.spaceship_service.list(true).await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({ "spaceships": spaceships })
    ))))
}

/// Create a mission through the consistency validator
pub async fn create_mission(
    State(state): State<AppState>,
    Json(input): Json<MissionInput>,
) -> Result<impl IntoResponse, ApiError> {
    let id = state.mission_service.create(input).await?;
    Ok(created(id))
}

/// Mission detail with resolved crew
pub async fn get_mission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let detail = state.mission_service.get(id).await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(detail))))
}

/// Edit a mission through the consistency validator
pub async fn update_mission(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<MissionInput>,
) -> Result<Json<Value>, ApiError> {
    let id = state.mission_service.update(id, input).await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({ "id": id })
    ))))
}

/// List missions, most recent launch first
pub async fn list_missions(
    Query(params): Query<PageParams>,
    State(state): State<AppState>,
) -> Result<Json<Value>, ApiError> {
    let limit = params.limit.unwrap_or(state.default_list_limit).max(1);
    let offset = params.offset.unwrap_or(0).max(0);
    let missions = state.mission_service.list(limit, offset).await?;
    Ok(Json(serde_json::json!(SuccessResponse::new(
        serde_json::json!({ "missions": missions })
    ))))
}
