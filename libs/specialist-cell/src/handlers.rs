use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared_models::booking::Specialist;
use shared_models::error::AppError;
use shared_utils::actor::CurrentActor;
use shared_utils::validation::validate_request;

use crate::models::{CreateSpecialistRequest, SpecialistResponse, SpecialistSearch};
use crate::router::SpecialistCellState;

#[derive(Debug, Deserialize)]
pub struct SpecializationQuery {
    #[serde(default)]
    pub specialization: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkAddressQuery {
    pub address_id: Option<Uuid>,
}

fn to_responses(specialists: Vec<Specialist>) -> Json<Vec<SpecialistResponse>> {
    Json(specialists.into_iter().map(SpecialistResponse::from).collect())
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn create_specialist(
    State(state): State<SpecialistCellState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateSpecialistRequest>,
) -> Result<(StatusCode, Json<SpecialistResponse>), AppError> {
    validate_request(&request)?;
    let specialist = state.specialists.create_specialist(request, &actor).await?;
    Ok((StatusCode::CREATED, Json(specialist.into())))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn get_specialist(
    State(state): State<SpecialistCellState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SpecialistResponse>, AppError> {
    Ok(Json(state.specialists.get_specialist(id).await?.into()))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn list_specialists(
    State(state): State<SpecialistCellState>,
) -> Result<Json<Vec<SpecialistResponse>>, AppError> {
    Ok(to_responses(state.specialists.list_specialists().await?))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn list_active_specialists(
    State(state): State<SpecialistCellState>,
) -> Result<Json<Vec<SpecialistResponse>>, AppError> {
    Ok(to_responses(state.specialists.list_active_specialists().await?))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn search_specialists(
    State(state): State<SpecialistCellState>,
    Query(criteria): Query<SpecialistSearch>,
) -> Result<Json<Vec<SpecialistResponse>>, AppError> {
    Ok(to_responses(state.specialists.search(criteria).await?))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn get_specialist_by_user(
    State(state): State<SpecialistCellState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SpecialistResponse>, AppError> {
    Ok(Json(state.specialists.get_specialist_by_user(user_id).await?.into()))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn check_user_is_specialist(
    State(state): State<SpecialistCellState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<bool>, AppError> {
    Ok(Json(state.specialists.is_user_specialist(user_id).await?))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn update_specialist(
    State(state): State<SpecialistCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateSpecialistRequest>,
) -> Result<Json<SpecialistResponse>, AppError> {
    validate_request(&request)?;
    Ok(Json(state.specialists.update_specialist(id, request, &actor).await?.into()))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn update_specialization(
    State(state): State<SpecialistCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Query(query): Query<SpecializationQuery>,
) -> Result<Json<SpecialistResponse>, AppError> {
    let specialist = state
        .specialists
        .update_specialization(id, &query.specialization, &actor)
        .await?;
    Ok(Json(specialist.into()))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn update_work_address(
    State(state): State<SpecialistCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Query(query): Query<WorkAddressQuery>,
) -> Result<Json<SpecialistResponse>, AppError> {
    let specialist = state
        .specialists
        .update_work_address(id, query.address_id, &actor)
        .await?;
    Ok(Json(specialist.into()))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn enable_appointments(
    State(state): State<SpecialistCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<SpecialistResponse>, AppError> {
    Ok(Json(state.specialists.enable_appointments(id, &actor).await?.into()))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn disable_appointments(
    State(state): State<SpecialistCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<SpecialistResponse>, AppError> {
    Ok(Json(state.specialists.disable_appointments(id, &actor).await?.into()))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn assign_service(
    State(state): State<SpecialistCellState>,
    CurrentActor(actor): CurrentActor,
    Path((id, service_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SpecialistResponse>, AppError> {
    Ok(Json(state.specialists.assign_service(id, service_id, &actor).await?.into()))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn remove_service(
    State(state): State<SpecialistCellState>,
    CurrentActor(actor): CurrentActor,
    Path((id, service_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SpecialistResponse>, AppError> {
    Ok(Json(state.specialists.remove_service(id, service_id, &actor).await?.into()))
}

#[axum::debug_handler(state = SpecialistCellState)]
pub async fn delete_specialist(
    State(state): State<SpecialistCellState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.specialists.delete_specialist(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
