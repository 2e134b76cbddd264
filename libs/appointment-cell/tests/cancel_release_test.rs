use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::{AppointmentError, AppointmentService};
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::{RetryPolicy, StoreError, SupabaseStore};
use shared_models::actor::Actor;
use shared_models::booking::AppointmentStatus;
use slot_cell::{SlotError, SlotService};

fn service_for(server: &MockServer) -> AppointmentService {
    let config = AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        ..AppConfig::default()
    };
    let store = Arc::new(SupabaseStore::new(Arc::new(SupabaseClient::new(&config))));
    let slots = Arc::new(SlotService::new(store.clone(), RetryPolicy::new(1, Duration::from_millis(1))));
    AppointmentService::new(store, slots)
}

fn audit_columns(row: &mut Value) {
    row["created_at"] = json!("2029-12-01T00:00:00Z");
    row["updated_at"] = json!("2029-12-01T00:00:00Z");
    row["created_by"] = json!("system");
    row["updated_by"] = json!("system");
}

fn appointment_row(id: Uuid, slot_id: Uuid, specialist_id: Uuid, status: &str) -> Value {
    let mut row = json!({
        "id": id,
        "user_id": Uuid::new_v4(),
        "slot_id": slot_id,
        "service_id": Uuid::new_v4(),
        "specialist_id": specialist_id,
        "status": status,
        "notes": null
    });
    audit_columns(&mut row);
    row
}

fn slot_row(id: Uuid, specialist_id: Uuid, booked: bool, version: i64) -> Value {
    let mut row = json!({
        "id": id,
        "specialist_id": specialist_id,
        "start_time": "2030-01-01T10:00:00Z",
        "end_time": "2030-01-01T10:30:00Z",
        "booked": booked,
        "version": version
    });
    audit_columns(&mut row);
    row
}

#[tokio::test]
async fn failed_release_leaves_appointment_status_unwritten() {
    let server = MockServer::start().await;
    let (appointment_id, slot_id, specialist_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row(
            appointment_id,
            slot_id,
            specialist_id,
            "NO_SHOW",
        )]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![slot_row(slot_id, specialist_id, true, 3)]))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "message": "upstream unavailable" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = service_for(&server)
        .cancel_appointment(appointment_id, &Actor::system())
        .await;

    assert_matches!(result, Err(AppointmentError::Slot(SlotError::Store(StoreError::Backend(_)))));
}

#[tokio::test]
async fn no_show_cancel_frees_slot_then_writes_status() {
    let server = MockServer::start().await;
    let (appointment_id, slot_id, specialist_id) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row(
            appointment_id,
            slot_id,
            specialist_id,
            "NO_SHOW",
        )]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![slot_row(slot_id, specialist_id, true, 3)]))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .and(query_param("version", "eq.3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![slot_row(slot_id, specialist_id, false, 4)]))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![appointment_row(
            appointment_id,
            slot_id,
            specialist_id,
            "CANCELLED",
        )]))
        .expect(1)
        .mount(&server)
        .await;

    let cancelled = service_for(&server)
        .cancel_appointment(appointment_id, &Actor::system())
        .await
        .unwrap();

    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);
}
