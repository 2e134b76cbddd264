use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use shared_database::{
    AppointmentRepository, InMemoryStore, OfferedServiceRepository, SlotRepository,
    SpecialistRepository, StoreError,
};
use shared_models::actor::Actor;
use shared_models::booking::{
    Appointment, AppointmentStatus, Audit, AvailableSlot, OfferedService, Specialist,
};

fn specialist(user_id: Uuid) -> Specialist {
    Specialist {
        id: Uuid::new_v4(),
        user_id,
        specialization: "Physiotherapy".to_string(),
        work_address_id: None,
        accepting_appointments: true,
        service_ids: Vec::new(),
        audit: Audit::new(&Actor::system()),
    }
}

fn appointment(slot: &AvailableSlot, status: AppointmentStatus) -> Appointment {
    Appointment {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        slot_id: slot.id,
        service_id: Uuid::new_v4(),
        specialist_id: slot.specialist_id,
        status,
        notes: None,
        audit: Audit::new(&Actor::system()),
    }
}

fn slot_at(specialist_id: Uuid, offset_minutes: i64) -> AvailableSlot {
    let start = Utc::now() + Duration::days(1) + Duration::minutes(offset_minutes);
    AvailableSlot::new(specialist_id, start, start + Duration::minutes(30), &Actor::system())
}

#[tokio::test]
async fn one_specialist_per_user() {
    let store = InMemoryStore::new();
    let user_id = Uuid::new_v4();

    store.insert_specialist(specialist(user_id)).await.unwrap();
    let second = store.insert_specialist(specialist(user_id)).await;

    assert_matches!(second, Err(StoreError::UniqueViolation(_)));
}

#[tokio::test]
async fn slot_batch_with_duplicate_start_is_rejected_whole() {
    let store = InMemoryStore::new();
    let specialist_id = Uuid::new_v4();
    let first = slot_at(specialist_id, 0);
    let mut duplicate = slot_at(specialist_id, 60);
    duplicate.start_time = first.start_time;

    let result = store.insert_slots(vec![first, slot_at(specialist_id, 30), duplicate]).await;

    assert_matches!(result, Err(StoreError::UniqueViolation(_)));
    assert!(store.list_slots().await.unwrap().is_empty());
}

#[tokio::test]
async fn slot_update_checks_and_bumps_version() {
    let store = InMemoryStore::new();
    let slot = slot_at(Uuid::new_v4(), 0);
    store.insert_slots(vec![slot.clone()]).await.unwrap();

    let mut booked = slot.clone();
    booked.booked = true;
    let saved = store.update_slot(booked.clone(), 0).await.unwrap();
    assert_eq!(saved.version, 1);

    let stale = store.update_slot(booked, 0).await;
    assert_matches!(stale, Err(StoreError::VersionConflict { expected: 0, .. }));

    let missing = store.update_slot(slot_at(Uuid::new_v4(), 0), 0).await;
    assert_matches!(missing, Err(StoreError::NotFound { .. }));
}

#[tokio::test]
async fn only_one_active_appointment_per_slot() {
    let store = InMemoryStore::new();
    let slot = slot_at(Uuid::new_v4(), 0);

    let first = store
        .insert_appointment(appointment(&slot, AppointmentStatus::Booked))
        .await
        .unwrap();
    let clash = store
        .insert_appointment(appointment(&slot, AppointmentStatus::Booked))
        .await;
    assert_matches!(clash, Err(StoreError::UniqueViolation(_)));

    let mut cancelled = first.clone();
    cancelled.status = AppointmentStatus::Cancelled;
    store.update_appointment(cancelled).await.unwrap();

    store
        .insert_appointment(appointment(&slot, AppointmentStatus::Booked))
        .await
        .unwrap();
    assert!(store
        .slot_has_appointment_in(slot.id, &AppointmentStatus::ACTIVE)
        .await
        .unwrap());
}

#[tokio::test]
async fn deleting_specialist_removes_their_slots() {
    let store = InMemoryStore::new();
    let owner = store.insert_specialist(specialist(Uuid::new_v4())).await.unwrap();
    let other = Uuid::new_v4();

    store
        .insert_slots(vec![slot_at(owner.id, 0), slot_at(owner.id, 30), slot_at(other, 0)])
        .await
        .unwrap();
    store.delete_specialist(owner.id).await.unwrap();

    let remaining = store.list_slots().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].specialist_id, other);
}

#[tokio::test]
async fn batch_slot_delete_is_all_or_nothing() {
    let store = InMemoryStore::new();
    let slot = slot_at(Uuid::new_v4(), 0);
    store.insert_slots(vec![slot.clone()]).await.unwrap();

    let result = store.delete_slots(&[slot.id, Uuid::new_v4()]).await;

    assert_matches!(result, Err(StoreError::NotFound { .. }));
    assert!(store.slot_exists(slot.id).await.unwrap());
}

#[tokio::test]
async fn starting_between_is_inclusive_and_ordered() {
    let store = InMemoryStore::new();
    let specialist_id = Uuid::new_v4();
    let early = slot_at(specialist_id, 0);
    let late = slot_at(specialist_id, 60);
    store.insert_slots(vec![late.clone(), early.clone()]).await.unwrap();

    let found = store
        .find_slots_starting_between(specialist_id, early.start_time, late.start_time)
        .await
        .unwrap();

    assert_eq!(found.iter().map(|s| s.id).collect::<Vec<_>>(), vec![early.id, late.id]);
    assert!(!store.service_name_exists("Massage").await.unwrap());
}

#[tokio::test]
async fn deleting_slot_removes_its_appointment_history() {
    let store = InMemoryStore::new();
    let slot = slot_at(Uuid::new_v4(), 0);
    let neighbour = slot_at(slot.specialist_id, 30);
    store.insert_slots(vec![slot.clone(), neighbour.clone()]).await.unwrap();

    let cancelled = store
        .insert_appointment(appointment(&slot, AppointmentStatus::Cancelled))
        .await
        .unwrap();
    let kept = store
        .insert_appointment(appointment(&neighbour, AppointmentStatus::Booked))
        .await
        .unwrap();

    store.delete_slot(slot.id).await.unwrap();

    assert!(!store.appointment_exists(cancelled.id).await.unwrap());
    assert!(store.appointment_exists(kept.id).await.unwrap());
    assert!(!store
        .slot_has_appointment_in(slot.id, &[AppointmentStatus::Cancelled])
        .await
        .unwrap());
}

#[tokio::test]
async fn deleting_service_or_specialist_removes_their_appointments() {
    let store = InMemoryStore::new();
    let owner = store.insert_specialist(specialist(Uuid::new_v4())).await.unwrap();
    let first = slot_at(owner.id, 0);
    let second = slot_at(owner.id, 30);
    store.insert_slots(vec![first.clone(), second.clone()]).await.unwrap();

    let completed = store
        .insert_appointment(appointment(&first, AppointmentStatus::Completed))
        .await
        .unwrap();
    let no_show = store
        .insert_appointment(appointment(&second, AppointmentStatus::NoShow))
        .await
        .unwrap();

    store
        .insert_service(OfferedService {
            id: completed.service_id,
            name: "Massage".to_string(),
            description: None,
            price: Decimal::new(9000, 2),
            duration_minutes: 30,
            active: true,
            audit: Audit::new(&Actor::system()),
        })
        .await
        .unwrap();
    store.delete_service(completed.service_id).await.unwrap();
    assert!(!store.appointment_exists(completed.id).await.unwrap());
    assert!(store.appointment_exists(no_show.id).await.unwrap());

    store.delete_specialist(owner.id).await.unwrap();
    assert!(store.list_appointments().await.unwrap().is_empty());
    assert!(store.list_slots().await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_slot_delete_removes_appointment_history() {
    let store = InMemoryStore::new();
    let specialist_id = Uuid::new_v4();
    let slots = vec![slot_at(specialist_id, 0), slot_at(specialist_id, 30)];
    store.insert_slots(slots.clone()).await.unwrap();
    for slot in &slots {
        store
            .insert_appointment(appointment(slot, AppointmentStatus::Cancelled))
            .await
            .unwrap();
    }

    let ids: Vec<Uuid> = slots.iter().map(|s| s.id).collect();
    store.delete_slots(&ids).await.unwrap();

    assert!(store.list_appointments().await.unwrap().is_empty());
}
