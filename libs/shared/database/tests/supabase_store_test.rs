use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::{
    SlotRepository, SpecialistRepository, StoreError, SupabaseStore, UserRepository,
};
use shared_models::actor::Actor;
use shared_models::booking::{Audit, AvailableSlot, Role, User};
use shared_models::error::AppError;

fn store_for(server: &MockServer) -> SupabaseStore {
    let config = AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        ..AppConfig::default()
    };
    SupabaseStore::new(Arc::new(SupabaseClient::new(&config)))
}

fn slot_row(id: Uuid, specialist_id: Uuid, version: i64) -> serde_json::Value {
    json!({
        "id": id,
        "specialist_id": specialist_id,
        "start_time": "2030-01-01T10:00:00Z",
        "end_time": "2030-01-01T10:30:00Z",
        "booked": false,
        "version": version,
        "created_at": "2029-12-01T00:00:00Z",
        "updated_at": "2029-12-01T00:00:00Z",
        "created_by": "system",
        "updated_by": "system"
    })
}

#[tokio::test]
async fn find_slot_reads_row_with_audit_columns() {
    let server = MockServer::start().await;
    let slot_id = Uuid::new_v4();
    let specialist_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .and(header("apikey", "test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![slot_row(slot_id, specialist_id, 4)]))
        .mount(&server)
        .await;

    let slot = store_for(&server).find_slot(slot_id).await.unwrap().unwrap();
    assert_eq!(slot.specialist_id, specialist_id);
    assert_eq!(slot.version, 4);
    assert_eq!(slot.audit.created_by, "system");
    assert_eq!(slot.duration_minutes(), 30);
}

#[tokio::test]
async fn stale_slot_update_is_a_version_conflict() {
    let server = MockServer::start().await;
    let slot_id = Uuid::new_v4();
    let specialist_id = Uuid::new_v4();

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .and(query_param("version", "eq.2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": slot_id }])))
        .mount(&server)
        .await;

    let mut slot: AvailableSlot = serde_json::from_value(slot_row(slot_id, specialist_id, 2)).unwrap();
    slot.booked = true;

    let result = store_for(&server).update_slot(slot, 2).await;
    assert_matches!(result, Err(StoreError::VersionConflict { expected: 2, .. }));
}

#[tokio::test]
async fn successful_slot_update_sends_bumped_version() {
    let server = MockServer::start().await;
    let slot_id = Uuid::new_v4();
    let specialist_id = Uuid::new_v4();

    let mut updated = slot_row(slot_id, specialist_id, 1);
    updated["booked"] = json!(true);

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .and(query_param("version", "eq.0"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(vec![updated]))
        .mount(&server)
        .await;

    let mut slot: AvailableSlot = serde_json::from_value(slot_row(slot_id, specialist_id, 0)).unwrap();
    slot.booked = true;

    let saved = store_for(&server).update_slot(slot, 0).await.unwrap();
    assert!(saved.booked);
    assert_eq!(saved.version, 1);
}

#[tokio::test]
async fn conflict_status_maps_to_unique_violation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"users_email_key\""
        })))
        .mount(&server)
        .await;

    let user = User {
        id: Uuid::new_v4(),
        email: "taken@example.com".to_string(),
        password_hash: "hash".to_string(),
        firstname: "Ann".to_string(),
        lastname: "Lee".to_string(),
        phone: None,
        roles: vec![Role::User],
        enabled: true,
        audit: Audit::new(&Actor::system()),
    };

    let result = store_for(&server).insert_user(user).await;
    assert_matches!(result, Err(StoreError::UniqueViolation(body)) if body.contains("users_email_key"));
}

#[tokio::test]
async fn city_search_without_matching_address_skips_specialist_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/addresses"))
        .and(query_param("city", "eq.Gdansk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/specialists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let found = store_for(&server).find_specialists_by_city("Gdansk").await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn batch_delete_with_unknown_slot_deletes_nothing() {
    let server = MockServer::start().await;
    let known = Uuid::new_v4();
    let unknown = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": known }])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/slots"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let result = store_for(&server).delete_slots(&[known, unknown]).await;
    assert_matches!(result, Err(StoreError::NotFound { id, .. }) if id == unknown.to_string());
}

#[tokio::test]
async fn foreign_key_violation_is_not_reported_as_duplicate() {
    let server = MockServer::start().await;
    let slot_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/slots"))
        .and(query_param("id", format!("eq.{}", slot_id)))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23503",
            "message": "update or delete on table \"slots\" violates foreign key constraint \"appointments_slot_id_fkey\""
        })))
        .mount(&server)
        .await;

    let result = store_for(&server).delete_slot(slot_id).await;
    assert_matches!(&result, Err(StoreError::ReferenceViolation(body)) if body.contains("appointments_slot_id_fkey"));
    assert_matches!(result.map_err(AppError::from), Err(AppError::IllegalState(_)));
}
