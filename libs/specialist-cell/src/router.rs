use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_database::BookingStore;

use crate::handlers;
use crate::services::SpecialistService;

#[derive(Clone)]
pub struct SpecialistCellState {
    pub specialists: Arc<SpecialistService>,
    pub config: Arc<AppConfig>,
}

impl SpecialistCellState {
    pub fn new(store: Arc<dyn BookingStore>, config: Arc<AppConfig>) -> Self {
        Self {
            specialists: Arc::new(SpecialistService::new(store)),
            config,
        }
    }
}

impl FromRef<SpecialistCellState> for Arc<AppConfig> {
    fn from_ref(state: &SpecialistCellState) -> Self {
        state.config.clone()
    }
}

pub fn specialist_routes(state: SpecialistCellState) -> Router {
    Router::new()
        .route("/", get(handlers::list_specialists).post(handlers::create_specialist))
        .route("/active", get(handlers::list_active_specialists))
        .route("/search", get(handlers::search_specialists))
        .route("/user/{user_id}", get(handlers::get_specialist_by_user))
        .route("/check-user/{user_id}", get(handlers::check_user_is_specialist))
        .route(
            "/{id}",
            get(handlers::get_specialist)
                .put(handlers::update_specialist)
                .delete(handlers::delete_specialist),
        )
        .route("/{id}/specialization", patch(handlers::update_specialization))
        .route("/{id}/address", patch(handlers::update_work_address))
        .route("/{id}/enable", patch(handlers::enable_appointments))
        .route("/{id}/disable", patch(handlers::disable_appointments))
        .route(
            "/{id}/services/{service_id}",
            post(handlers::assign_service).delete(handlers::remove_service),
        )
        .with_state(state)
}
