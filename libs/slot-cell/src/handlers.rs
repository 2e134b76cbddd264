use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use shared_models::booking::AvailableSlot;
use shared_models::error::AppError;
use shared_utils::actor::CurrentActor;

use crate::models::{ConflictQuery, CreateMultipleSlotsRequest, CreateSlotRequest, SlotResponse, TimeRangeQuery};
use crate::router::SlotCellState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialistSlotsQuery {
    #[serde(default)]
    pub available_only: bool,
}

fn to_responses(slots: Vec<AvailableSlot>) -> Json<Vec<SlotResponse>> {
    Json(slots.into_iter().map(SlotResponse::from).collect())
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn create_slot(
    State(state): State<SlotCellState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateSlotRequest>,
) -> Result<(StatusCode, Json<SlotResponse>), AppError> {
    let slot = state.slots.create_slot(request, &actor).await?;
    Ok((StatusCode::CREATED, Json(slot.into())))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn create_multiple_slots(
    State(state): State<SlotCellState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateMultipleSlotsRequest>,
) -> Result<(StatusCode, Json<Vec<SlotResponse>>), AppError> {
    let slots = state.slots.create_multiple_slots(request, &actor).await?;
    Ok((StatusCode::CREATED, to_responses(slots)))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn get_slot(
    State(state): State<SlotCellState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SlotResponse>, AppError> {
    Ok(Json(state.slots.get_slot(id).await?.into()))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn list_slots(State(state): State<SlotCellState>) -> Result<Json<Vec<SlotResponse>>, AppError> {
    Ok(to_responses(state.slots.list_slots().await?))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn slots_by_specialist(
    State(state): State<SlotCellState>,
    Path(specialist_id): Path<Uuid>,
    Query(query): Query<SpecialistSlotsQuery>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    let slots = if query.available_only {
        state.slots.available_slots_by_specialist(specialist_id).await?
    } else {
        state.slots.slots_by_specialist(specialist_id).await?
    };
    Ok(to_responses(slots))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn available_slots_by_specialist(
    State(state): State<SlotCellState>,
    Path(specialist_id): Path<Uuid>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    Ok(to_responses(
        state.slots.available_slots_by_specialist(specialist_id).await?,
    ))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn available_slots_by_date(
    State(state): State<SlotCellState>,
    Path((specialist_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    Ok(to_responses(
        state
            .slots
            .available_slots_by_specialist_and_date(specialist_id, date)
            .await?,
    ))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn slots_by_range(
    State(state): State<SlotCellState>,
    Path(specialist_id): Path<Uuid>,
    Query(range): Query<TimeRangeQuery>,
) -> Result<Json<Vec<SlotResponse>>, AppError> {
    Ok(to_responses(
        state
            .slots
            .slots_by_specialist_and_range(specialist_id, range.start, range.end)
            .await?,
    ))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn check_conflicts(
    State(state): State<SlotCellState>,
    Query(query): Query<ConflictQuery>,
) -> Result<Json<bool>, AppError> {
    let conflicting = state
        .slots
        .is_slot_conflicting(query.specialist_id, query.start, query.end, query.exclude_slot_id)
        .await?;
    Ok(Json(conflicting))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn mark_slot_as_booked(
    State(state): State<SlotCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<SlotResponse>, AppError> {
    Ok(Json(state.slots.mark_slot_as_booked(id, &actor).await?.into()))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn mark_slot_as_available(
    State(state): State<SlotCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<SlotResponse>, AppError> {
    Ok(Json(state.slots.mark_slot_as_available(id, &actor).await?.into()))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn check_slot_availability(
    State(state): State<SlotCellState>,
    Path(id): Path<Uuid>,
) -> Result<Json<bool>, AppError> {
    Ok(Json(state.slots.is_slot_available(id).await?))
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn delete_slot(
    State(state): State<SlotCellState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.slots.delete_slot(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler(state = SlotCellState)]
pub async fn delete_slots_by_range(
    State(state): State<SlotCellState>,
    Path(specialist_id): Path<Uuid>,
    Query(range): Query<TimeRangeQuery>,
) -> Result<StatusCode, AppError> {
    state
        .slots
        .delete_slots_by_range(specialist_id, range.start, range.end)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
