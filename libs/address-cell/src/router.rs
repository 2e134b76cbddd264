use std::sync::Arc;

use axum::{extract::FromRef, routing::get, Router};

use shared_config::AppConfig;
use shared_database::BookingStore;

use crate::handlers;
use crate::services::AddressService;

#[derive(Clone)]
pub struct AddressCellState {
    pub addresses: Arc<AddressService>,
    pub config: Arc<AppConfig>,
}

impl AddressCellState {
    pub fn new(store: Arc<dyn BookingStore>, config: Arc<AppConfig>) -> Self {
        Self {
            addresses: Arc::new(AddressService::new(store)),
            config,
        }
    }
}

impl FromRef<AddressCellState> for Arc<AppConfig> {
    fn from_ref(state: &AddressCellState) -> Self {
        state.config.clone()
    }
}

pub fn address_routes(state: AddressCellState) -> Router {
    Router::new()
        .route("/", get(handlers::list_addresses).post(handlers::create_address))
        .route(
            "/{id}",
            get(handlers::get_address)
                .put(handlers::update_address)
                .delete(handlers::delete_address),
        )
        .with_state(state)
}
