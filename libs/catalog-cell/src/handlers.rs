use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use shared_models::booking::OfferedService;
use shared_models::error::AppError;
use shared_utils::actor::CurrentActor;
use shared_utils::validation::validate_request;

use crate::models::{CreateServiceRequest, ServiceResponse, ServiceSearch};
use crate::router::CatalogCellState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Deserialize)]
pub struct PriceQuery {
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct NameQuery {
    #[serde(default)]
    pub name: String,
}

fn to_responses(services: Vec<OfferedService>) -> Json<Vec<ServiceResponse>> {
    Json(services.into_iter().map(ServiceResponse::from).collect())
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn create_service(
    State(state): State<CatalogCellState>,
    CurrentActor(actor): CurrentActor,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<ServiceResponse>), AppError> {
    validate_request(&request)?;
    let service = state.catalog.create_service(request, &actor).await?;
    Ok((StatusCode::CREATED, Json(service.into())))
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn get_service(
    State(state): State<CatalogCellState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceResponse>, AppError> {
    Ok(Json(state.catalog.get_service(id).await?.into()))
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn list_services(
    State(state): State<CatalogCellState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    let services = if query.active_only {
        state.catalog.list_active_services().await?
    } else {
        state.catalog.list_services().await?
    };
    Ok(to_responses(services))
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn list_active_services(
    State(state): State<CatalogCellState>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    Ok(to_responses(state.catalog.list_active_services().await?))
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn list_services_by_specialist(
    State(state): State<CatalogCellState>,
    Path(specialist_id): Path<Uuid>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    Ok(to_responses(
        state.catalog.list_services_by_specialist(specialist_id).await?,
    ))
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn search_services(
    State(state): State<CatalogCellState>,
    Query(criteria): Query<ServiceSearch>,
) -> Result<Json<Vec<ServiceResponse>>, AppError> {
    Ok(to_responses(state.catalog.search(criteria).await?))
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn service_exists(
    State(state): State<CatalogCellState>,
    Query(query): Query<NameQuery>,
) -> Result<Json<bool>, AppError> {
    Ok(Json(state.catalog.exists_by_name(&query.name).await?))
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn update_service(
    State(state): State<CatalogCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<Json<ServiceResponse>, AppError> {
    validate_request(&request)?;
    Ok(Json(state.catalog.update_service(id, request, &actor).await?.into()))
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn update_service_price(
    State(state): State<CatalogCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<ServiceResponse>, AppError> {
    Ok(Json(
        state.catalog.update_service_price(id, query.price, &actor).await?.into(),
    ))
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn activate_service(
    State(state): State<CatalogCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceResponse>, AppError> {
    Ok(Json(state.catalog.activate_service(id, &actor).await?.into()))
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn deactivate_service(
    State(state): State<CatalogCellState>,
    CurrentActor(actor): CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<Json<ServiceResponse>, AppError> {
    Ok(Json(state.catalog.deactivate_service(id, &actor).await?.into()))
}

#[axum::debug_handler(state = CatalogCellState)]
pub async fn delete_service(
    State(state): State<CatalogCellState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_service(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
