use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::actor::CurrentActor;
use shared_utils::validation::validate_request;

use crate::models::{ChangePasswordRequest, CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::router::UserCellState;

#[axum::debug_handler(state = UserCellState)]
pub async fn create_user(
    State(state): State<UserCellState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    info!("REST request to create user with email: {}", request.email);
    validate_request(&request)?;

    let user = state.users.create_user(request, &actor).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[axum::debug_handler(state = UserCellState)]
pub async fn get_user(
    State(state): State<UserCellState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state.users.get_user(id).await?;
    Ok(Json(user.into()))
}

#[axum::debug_handler(state = UserCellState)]
pub async fn list_users(State(state): State<UserCellState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.users.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[axum::debug_handler(state = UserCellState)]
pub async fn update_user(
    State(state): State<UserCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    info!("REST request to update user with id: {}", id);
    validate_request(&request)?;

    let user = state.users.update_user(id, request, &actor).await?;
    Ok(Json(user.into()))
}

#[axum::debug_handler(state = UserCellState)]
pub async fn change_password(
    State(state): State<UserCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    info!("REST request to change password for user: {}", id);
    validate_request(&request)?;

    state
        .users
        .change_password(id, &request.current_password, &request.new_password, &actor)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler(state = UserCellState)]
pub async fn delete_user(
    State(state): State<UserCellState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    info!("REST request to delete user with id: {}", id);
    state.users.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
