use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, patch},
    Router,
};

use shared_config::AppConfig;
use shared_database::BookingStore;

use crate::handlers;
use crate::services::UserService;

#[derive(Clone)]
pub struct UserCellState {
    pub users: Arc<UserService>,
    pub config: Arc<AppConfig>,
}

impl UserCellState {
    pub fn new(store: Arc<dyn BookingStore>, config: Arc<AppConfig>) -> Self {
        Self {
            users: Arc::new(UserService::new(store)),
            config,
        }
    }
}

impl FromRef<UserCellState> for Arc<AppConfig> {
    fn from_ref(state: &UserCellState) -> Self {
        state.config.clone()
    }
}

pub fn user_routes(state: UserCellState) -> Router {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route("/{id}/password", patch(handlers::change_password))
        .with_state(state)
}
