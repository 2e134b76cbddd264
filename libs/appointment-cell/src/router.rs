use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, patch},
    Router,
};

use shared_config::AppConfig;
use shared_database::{BookingStore, RetryPolicy};
use slot_cell::SlotService;

use crate::handlers;
use crate::services::AppointmentService;

#[derive(Clone)]
pub struct AppointmentCellState {
    pub appointments: Arc<AppointmentService>,
    pub config: Arc<AppConfig>,
}

impl AppointmentCellState {
    pub fn new(store: Arc<dyn BookingStore>, config: Arc<AppConfig>) -> Self {
        let slots = Arc::new(SlotService::new(store.clone(), RetryPolicy::from_config(&config)));
        Self {
            appointments: Arc::new(AppointmentService::new(store, slots)),
            config,
        }
    }
}

impl FromRef<AppointmentCellState> for Arc<AppConfig> {
    fn from_ref(state: &AppointmentCellState) -> Self {
        state.config.clone()
    }
}

pub fn appointment_routes(state: AppointmentCellState) -> Router {
    Router::new()
        .route("/", get(handlers::list_appointments).post(handlers::create_appointment))
        .route("/user/{user_id}", get(handlers::appointments_by_user))
        .route("/status/{status}", get(handlers::appointments_by_status))
        .route("/slot/{slot_id}/check", get(handlers::check_slot_availability))
        .route(
            "/{id}",
            get(handlers::get_appointment).delete(handlers::delete_appointment),
        )
        .route("/{id}/status", patch(handlers::update_appointment_status))
        .route("/{id}/notes", patch(handlers::update_appointment_notes))
        .route("/{id}/confirm", patch(handlers::confirm_appointment))
        .route("/{id}/start", patch(handlers::start_appointment))
        .route("/{id}/complete", patch(handlers::complete_appointment))
        .route("/{id}/no-show", patch(handlers::mark_no_show))
        .route("/{id}/cancel", patch(handlers::cancel_appointment))
        .with_state(state)
}
