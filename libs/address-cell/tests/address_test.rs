use std::sync::Arc;

use assert_matches::assert_matches;
use axum::body::{to_bytes, Body};
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use address_cell::models::{AddressError, CreateAddressRequest};
use address_cell::{address_routes, AddressCellState, AddressService};
use shared_database::{InMemoryStore, SpecialistRepository};
use shared_models::actor::Actor;
use shared_models::booking::{Audit, Specialist};
use shared_utils::test_utils::TestConfig;

fn warsaw() -> CreateAddressRequest {
    CreateAddressRequest {
        country: "Poland".to_string(),
        city: "Warsaw".to_string(),
        street: Some("Marszalkowska".to_string()),
        postal_code: Some("00-950".to_string()),
        building_number: Some("10A".to_string()),
    }
}

#[tokio::test]
async fn address_crud_round() {
    let addresses = AddressService::new(Arc::new(InMemoryStore::new()));
    let actor = Actor::user("clerk", None);

    let created = addresses.create_address(warsaw(), &actor).await.unwrap();
    assert_eq!(created.audit.created_by, "clerk");

    let mut moved = warsaw();
    moved.city = "Krakow".to_string();
    let updated = addresses.update_address(created.id, moved, &Actor::system()).await.unwrap();
    assert_eq!(updated.city, "Krakow");
    assert_eq!(updated.audit.updated_by, "system");

    addresses.delete_address(created.id).await.unwrap();
    assert_matches!(addresses.get_address(created.id).await, Err(AddressError::NotFound(_)));
    assert_matches!(addresses.delete_address(created.id).await, Err(AddressError::NotFound(_)));
}

#[tokio::test]
async fn deleting_address_clears_specialist_work_address() {
    let store = Arc::new(InMemoryStore::new());
    let addresses = AddressService::new(store.clone());
    let address = addresses.create_address(warsaw(), &Actor::system()).await.unwrap();

    let specialist = store
        .insert_specialist(Specialist {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            specialization: "Dentist".to_string(),
            work_address_id: Some(address.id),
            accepting_appointments: true,
            service_ids: Vec::new(),
            audit: Audit::new(&Actor::system()),
        })
        .await
        .unwrap();

    addresses.delete_address(address.id).await.unwrap();

    let reloaded = store.find_specialist(specialist.id).await.unwrap().unwrap();
    assert_eq!(reloaded.work_address_id, None);
}

#[tokio::test]
async fn postal_code_format_is_validated() {
    let app = address_routes(AddressCellState::new(
        Arc::new(InMemoryStore::new()),
        TestConfig::default().to_arc(),
    ));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "country": "PL", "city": "Lodz", "postalCode": "90210" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["fieldErrors"]["postalCode"], "Postal code must be in format XX-XXX or empty");
    assert!(body["fieldErrors"].get("country").is_none());
}
