use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, patch, post},
    Router,
};

use shared_config::AppConfig;
use shared_database::{BookingStore, RetryPolicy};

use crate::handlers;
use crate::services::SlotService;

#[derive(Clone)]
pub struct SlotCellState {
    pub slots: Arc<SlotService>,
    pub config: Arc<AppConfig>,
}

impl SlotCellState {
    pub fn new(store: Arc<dyn BookingStore>, config: Arc<AppConfig>) -> Self {
        let retry = RetryPolicy::from_config(&config);
        Self {
            slots: Arc::new(SlotService::new(store, retry)),
            config,
        }
    }
}

impl FromRef<SlotCellState> for Arc<AppConfig> {
    fn from_ref(state: &SlotCellState) -> Self {
        state.config.clone()
    }
}

pub fn slot_routes(state: SlotCellState) -> Router {
    Router::new()
        .route("/", get(handlers::list_slots).post(handlers::create_slot))
        .route("/multiple", post(handlers::create_multiple_slots))
        .route("/conflicts", get(handlers::check_conflicts))
        .route("/specialist/{specialist_id}", get(handlers::slots_by_specialist))
        .route(
            "/specialist/{specialist_id}/available",
            get(handlers::available_slots_by_specialist),
        )
        .route(
            "/specialist/{specialist_id}/date/{date}",
            get(handlers::available_slots_by_date),
        )
        .route(
            "/specialist/{specialist_id}/range",
            get(handlers::slots_by_range).delete(handlers::delete_slots_by_range),
        )
        .route("/{id}", get(handlers::get_slot).delete(handlers::delete_slot))
        .route("/{id}/book", patch(handlers::mark_slot_as_booked))
        .route("/{id}/release", patch(handlers::mark_slot_as_available))
        .route("/{id}/check-availability", get(handlers::check_slot_availability))
        .with_state(state)
}
