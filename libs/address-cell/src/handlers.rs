use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::actor::CurrentActor;
use shared_utils::validation::validate_request;

use crate::models::{AddressResponse, CreateAddressRequest};
use crate::router::AddressCellState;

#[axum::debug_handler(state = AddressCellState)]
pub async fn create_address(
    State(state): State<AddressCellState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateAddressRequest>,
) -> Result<(StatusCode, Json<AddressResponse>), AppError> {
    validate_request(&request)?;
    let address = state.addresses.create_address(request, &actor).await?;
    Ok((StatusCode::CREATED, Json(address.into())))
}

#[axum::debug_handler(state = AddressCellState)]
pub async fn get_address(
    State(state): State<AddressCellState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AddressResponse>, AppError> {
    Ok(Json(state.addresses.get_address(id).await?.into()))
}

#[axum::debug_handler(state = AddressCellState)]
pub async fn list_addresses(
    State(state): State<AddressCellState>,
) -> Result<Json<Vec<AddressResponse>>, AppError> {
    let addresses = state.addresses.list_addresses().await?;
    Ok(Json(addresses.into_iter().map(AddressResponse::from).collect()))
}

#[axum::debug_handler(state = AddressCellState)]
pub async fn update_address(
    State(state): State<AddressCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateAddressRequest>,
) -> Result<Json<AddressResponse>, AppError> {
    validate_request(&request)?;
    Ok(Json(state.addresses.update_address(id, request, &actor).await?.into()))
}

#[axum::debug_handler(state = AddressCellState)]
pub async fn delete_address(
    State(state): State<AddressCellState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.addresses.delete_address(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
