use std::sync::Arc;

use axum::{routing::get, Router};

use address_cell::{address_routes, AddressCellState};
use appointment_cell::{appointment_routes, AppointmentCellState};
use catalog_cell::{catalog_routes, CatalogCellState};
use shared_config::AppConfig;
use shared_database::BookingStore;
use slot_cell::{slot_routes, SlotCellState};
use specialist_cell::{specialist_routes, SpecialistCellState};
use user_cell::{user_routes, UserCellState};

pub fn create_router(store: Arc<dyn BookingStore>, config: Arc<AppConfig>) -> Router {
    let api = Router::new()
        .nest("/users", user_routes(UserCellState::new(store.clone(), config.clone())))
        .nest("/addresses", address_routes(AddressCellState::new(store.clone(), config.clone())))
        .nest(
            "/specialists",
            specialist_routes(SpecialistCellState::new(store.clone(), config.clone())),
        )
        .nest("/services", catalog_routes(CatalogCellState::new(store.clone(), config.clone())))
        .nest("/slots", slot_routes(SlotCellState::new(store.clone(), config.clone())))
        .nest(
            "/appointments",
            appointment_routes(AppointmentCellState::new(store, config)),
        );

    Router::new()
        .route("/", get(|| async { "Booking API is running!" }))
        .nest("/api", api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http::{Request, StatusCode};
    use shared_database::InMemoryStore;
    use tower::ServiceExt;

    #[tokio::test]
    async fn cells_are_mounted_under_api() {
        let app = create_router(Arc::new(InMemoryStore::new()), Arc::new(AppConfig::default()));

        for uri in ["/", "/api/users", "/api/services/active", "/api/slots", "/api/appointments"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }
}
