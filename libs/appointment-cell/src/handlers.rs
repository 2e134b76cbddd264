use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_models::booking::{Appointment, AppointmentStatus};
use shared_models::error::AppError;
use shared_utils::actor::CurrentActor;
use shared_utils::validation::validate_request;

use crate::models::{AppointmentResponse, CreateAppointmentRequest, StatusFilter, StatusUpdate, UpdateNotesRequest};
use crate::router::AppointmentCellState;

fn to_responses(appointments: Vec<Appointment>) -> Json<Vec<AppointmentResponse>> {
    Json(appointments.into_iter().map(AppointmentResponse::from).collect())
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn create_appointment(
    State(state): State<AppointmentCellState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentResponse>), AppError> {
    validate_request(&request)?;
    let appointment = state.appointments.create_appointment(request, &actor).await?;
    Ok((StatusCode::CREATED, Json(appointment.into())))
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn get_appointment(
    State(state): State<AppointmentCellState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, AppError> {
    Ok(Json(state.appointments.get_appointment(id).await?.into()))
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn list_appointments(
    State(state): State<AppointmentCellState>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    let appointments = match filter.status {
        Some(status) => state.appointments.appointments_by_status(status).await?,
        None => state.appointments.list_appointments().await?,
    };
    Ok(to_responses(appointments))
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn appointments_by_user(
    State(state): State<AppointmentCellState>,
    Path(user_id): Path<Uuid>,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    let mut appointments = state.appointments.appointments_by_user(user_id).await?;
    if let Some(status) = filter.status {
        appointments.retain(|appointment| appointment.status == status);
    }
    Ok(to_responses(appointments))
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn appointments_by_status(
    State(state): State<AppointmentCellState>,
    Path(status): Path<AppointmentStatus>,
) -> Result<Json<Vec<AppointmentResponse>>, AppError> {
    Ok(to_responses(state.appointments.appointments_by_status(status).await?))
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn update_appointment_status(
    State(state): State<AppointmentCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Query(update): Query<StatusUpdate>,
) -> Result<Json<AppointmentResponse>, AppError> {
    let appointment = state
        .appointments
        .update_appointment_status(id, update.status, &actor)
        .await?;
    Ok(Json(appointment.into()))
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn update_appointment_notes(
    State(state): State<AppointmentCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateNotesRequest>,
) -> Result<Json<AppointmentResponse>, AppError> {
    validate_request(&request)?;
    let appointment = state
        .appointments
        .update_appointment_notes(id, request.notes, &actor)
        .await?;
    Ok(Json(appointment.into()))
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn confirm_appointment(
    State(state): State<AppointmentCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, AppError> {
    Ok(Json(state.appointments.confirm_appointment(id, &actor).await?.into()))
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn start_appointment(
    State(state): State<AppointmentCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, AppError> {
    Ok(Json(state.appointments.start_appointment(id, &actor).await?.into()))
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn complete_appointment(
    State(state): State<AppointmentCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, AppError> {
    Ok(Json(state.appointments.complete_appointment(id, &actor).await?.into()))
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn mark_no_show(
    State(state): State<AppointmentCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentResponse>, AppError> {
    Ok(Json(state.appointments.mark_no_show(id, &actor).await?.into()))
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn cancel_appointment(
    State(state): State<AppointmentCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.appointments.cancel_appointment(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn delete_appointment(
    State(state): State<AppointmentCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.appointments.delete_appointment(id, &actor).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler(state = AppointmentCellState)]
pub async fn check_slot_availability(
    State(state): State<AppointmentCellState>,
    Path(slot_id): Path<Uuid>,
) -> Result<Json<bool>, AppError> {
    Ok(Json(state.appointments.is_slot_available(slot_id).await?))
}
