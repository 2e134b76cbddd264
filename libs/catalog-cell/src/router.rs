use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, patch},
    Router,
};

use shared_config::AppConfig;
use shared_database::BookingStore;

use crate::handlers;
use crate::services::CatalogService;

#[derive(Clone)]
pub struct CatalogCellState {
    pub catalog: Arc<CatalogService>,
    pub config: Arc<AppConfig>,
}

impl CatalogCellState {
    pub fn new(store: Arc<dyn BookingStore>, config: Arc<AppConfig>) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(store)),
            config,
        }
    }
}

impl FromRef<CatalogCellState> for Arc<AppConfig> {
    fn from_ref(state: &CatalogCellState) -> Self {
        state.config.clone()
    }
}

pub fn catalog_routes(state: CatalogCellState) -> Router {
    Router::new()
        .route("/", get(handlers::list_services).post(handlers::create_service))
        .route("/active", get(handlers::list_active_services))
        .route("/search", get(handlers::search_services))
        .route("/exists", get(handlers::service_exists))
        .route("/specialist/{specialist_id}", get(handlers::list_services_by_specialist))
        .route(
            "/{id}",
            get(handlers::get_service)
                .put(handlers::update_service)
                .delete(handlers::delete_service),
        )
        .route("/{id}/price", patch(handlers::update_service_price))
        .route("/{id}/activate", patch(handlers::activate_service))
        .route("/{id}/deactivate", patch(handlers::deactivate_service))
        .with_state(state)
}
