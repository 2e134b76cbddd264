use std::sync::Arc;
use std::time::Duration as StdDuration;

use assert_matches::assert_matches;
use axum::body::{to_bytes, Body};
use chrono::{DateTime, Duration, Utc};
use http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use shared_database::{InMemoryStore, RetryPolicy, SlotRepository, SpecialistRepository};
use shared_models::actor::Actor;
use shared_models::booking::{Audit, Specialist};
use shared_utils::test_utils::{TestClock, TestConfig};
use slot_cell::{
    slot_routes, CreateMultipleSlotsRequest, CreateSlotRequest, SlotCellState, SlotError, SlotService,
};

async fn setup() -> (Arc<InMemoryStore>, Arc<SlotService>, Uuid) {
    let store = Arc::new(InMemoryStore::new());
    let specialist = store
        .insert_specialist(Specialist {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            specialization: "Dentist".to_string(),
            work_address_id: None,
            accepting_appointments: true,
            service_ids: Vec::new(),
            audit: Audit::new(&Actor::system()),
        })
        .await
        .unwrap();
    let slots = Arc::new(SlotService::new(
        store.clone(),
        RetryPolicy::new(3, StdDuration::from_millis(1)),
    ));
    (store, slots, specialist.id)
}

fn single(specialist_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> CreateSlotRequest {
    CreateSlotRequest {
        specialist_id,
        start_time: Some(start),
        end_time: Some(end),
    }
}

fn batch(specialist_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>, minutes: i64) -> CreateMultipleSlotsRequest {
    CreateMultipleSlotsRequest {
        specialist_id,
        start_time: start,
        end_time: end,
        duration_minutes: minutes,
    }
}

#[tokio::test]
async fn overlapping_slot_conflicts_but_touching_one_does_not() {
    let (_, slots, specialist_id) = setup().await;
    let actor = Actor::system();

    slots
        .create_slot(single(specialist_id, TestClock::tomorrow_at(10, 0), TestClock::tomorrow_at(10, 30)), &actor)
        .await
        .unwrap();

    assert_matches!(
        slots
            .create_slot(single(specialist_id, TestClock::tomorrow_at(10, 15), TestClock::tomorrow_at(10, 45)), &actor)
            .await,
        Err(SlotError::Conflict(m)) if m == "Time slot conflicts with existing slots"
    );

    let touching = slots
        .create_slot(single(specialist_id, TestClock::tomorrow_at(10, 30), TestClock::tomorrow_at(11, 0)), &actor)
        .await
        .unwrap();
    assert_eq!(touching.start_time, TestClock::tomorrow_at(10, 30));
    assert!(!touching.booked);
}

#[tokio::test]
async fn invalid_times_never_reach_the_store() {
    let (store, slots, specialist_id) = setup().await;
    let actor = Actor::system();
    let ten = TestClock::tomorrow_at(10, 0);

    assert_matches!(
        slots.create_slot(single(specialist_id, ten, ten), &actor).await,
        Err(SlotError::InvalidTimeRange(m)) if m == "Start time cannot equal end time"
    );
    assert_matches!(
        slots.create_slot(single(specialist_id, ten, ten - Duration::minutes(30)), &actor).await,
        Err(SlotError::InvalidTimeRange(m)) if m == "Start time cannot be after end time"
    );
    assert_matches!(
        slots
            .create_slot(single(specialist_id, TestClock::yesterday(), ten), &actor)
            .await,
        Err(SlotError::InvalidTimeRange(m)) if m == "Cannot create slots in the past"
    );
    assert!(store.list_slots().await.unwrap().is_empty());

    assert_matches!(
        slots
            .create_slot(single(Uuid::new_v4(), ten, ten + Duration::minutes(30)), &actor)
            .await,
        Err(SlotError::SpecialistNotFound(_))
    );
}

#[tokio::test]
async fn batch_skips_conflicts_and_fails_when_nothing_is_left() {
    let (_, slots, specialist_id) = setup().await;
    let actor = Actor::system();
    slots
        .create_slot(single(specialist_id, TestClock::tomorrow_at(10, 0), TestClock::tomorrow_at(10, 30)), &actor)
        .await
        .unwrap();

    let created = slots
        .create_multiple_slots(
            batch(specialist_id, TestClock::tomorrow_at(9, 0), TestClock::tomorrow_at(11, 10), 30),
            &actor,
        )
        .await
        .unwrap();
    let starts: Vec<_> = created.iter().map(|s| s.start_time).collect();
    assert_eq!(
        starts,
        vec![
            TestClock::tomorrow_at(9, 0),
            TestClock::tomorrow_at(9, 30),
            TestClock::tomorrow_at(10, 30),
        ]
    );

    assert_matches!(
        slots
            .create_multiple_slots(
                batch(specialist_id, TestClock::tomorrow_at(9, 0), TestClock::tomorrow_at(10, 0), 15),
                &actor,
            )
            .await,
        Err(SlotError::Conflict(m)) if m == "No slots could be created due to conflicts"
    );
    assert_matches!(
        slots
            .create_multiple_slots(
                batch(specialist_id, TestClock::tomorrow_at(12, 0), TestClock::tomorrow_at(13, 0), 0),
                &actor,
            )
            .await,
        Err(SlotError::InvalidTimeRange(m)) if m == "Duration must be positive"
    );
    assert_eq!(slots.slots_by_specialist(specialist_id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn concurrent_creation_for_one_specialist_admits_one_slot() {
    let (store, slots, specialist_id) = setup().await;
    let start = TestClock::tomorrow_at(14, 0);

    let mut handles = Vec::new();
    for offset in 0..4 {
        let slots = slots.clone();
        handles.push(tokio::spawn(async move {
            let begin = start + Duration::minutes(offset * 5);
            slots
                .create_slot(single(specialist_id, begin, begin + Duration::minutes(30)), &Actor::system())
                .await
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(store.find_slots_by_specialist(specialist_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn booked_flag_guards_booking_and_deletion() {
    let (_, slots, specialist_id) = setup().await;
    let actor = Actor::user("desk", None);
    let slot = slots
        .create_slot(single(specialist_id, TestClock::tomorrow_at(8, 0), TestClock::tomorrow_at(8, 30)), &actor)
        .await
        .unwrap();

    let booked = slots.mark_slot_as_booked(slot.id, &actor).await.unwrap();
    assert!(booked.booked);
    assert_eq!(booked.version, slot.version + 1);
    assert!(!slots.is_slot_available(slot.id).await.unwrap());

    assert_matches!(slots.mark_slot_as_booked(slot.id, &actor).await, Err(SlotError::AlreadyBooked));
    assert_matches!(slots.delete_slot(slot.id).await, Err(SlotError::BookedSlotDeletion));

    slots.mark_slot_as_available(slot.id, &actor).await.unwrap();
    let released = slots.mark_slot_as_available(slot.id, &actor).await.unwrap();
    assert!(!released.booked);

    slots.delete_slot(slot.id).await.unwrap();
    assert_matches!(slots.get_slot(slot.id).await, Err(SlotError::NotFound(_)));
}

#[tokio::test]
async fn range_delete_is_all_or_nothing() {
    let (_, slots, specialist_id) = setup().await;
    let actor = Actor::system();
    let created = slots
        .create_multiple_slots(
            batch(specialist_id, TestClock::tomorrow_at(9, 0), TestClock::tomorrow_at(11, 0), 30),
            &actor,
        )
        .await
        .unwrap();
    slots.mark_slot_as_booked(created[1].id, &actor).await.unwrap();

    let from = TestClock::tomorrow_at(9, 0);
    let to = TestClock::tomorrow_at(11, 0);
    assert_matches!(
        slots.delete_slots_by_range(specialist_id, from, to).await,
        Err(SlotError::BookedSlotsInRange)
    );
    assert_eq!(slots.slots_by_specialist(specialist_id).await.unwrap().len(), 4);

    let in_range = slots
        .slots_by_specialist_and_range(specialist_id, TestClock::tomorrow_at(10, 0), to)
        .await
        .unwrap();
    assert_eq!(in_range.len(), 2);
    assert_eq!(
        slots.delete_slots_by_range(specialist_id, TestClock::tomorrow_at(10, 0), to).await.unwrap(),
        2
    );
    assert_eq!(slots.slots_by_specialist(specialist_id).await.unwrap().len(), 2);

    assert_matches!(
        slots.slots_by_specialist_and_range(specialist_id, to, from).await,
        Err(SlotError::InvalidTimeRange(_))
    );
}

#[tokio::test]
async fn available_slots_on_a_day() {
    let (_, slots, specialist_id) = setup().await;
    let actor = Actor::system();
    let created = slots
        .create_multiple_slots(
            batch(specialist_id, TestClock::tomorrow_at(9, 0), TestClock::tomorrow_at(10, 0), 30),
            &actor,
        )
        .await
        .unwrap();
    slots.mark_slot_as_booked(created[0].id, &actor).await.unwrap();

    let day = TestClock::tomorrow_at(0, 0).date_naive();
    let free = slots
        .available_slots_by_specialist_and_date(specialist_id, day)
        .await
        .unwrap();
    assert_eq!(free.iter().map(|s| s.id).collect::<Vec<_>>(), vec![created[1].id]);

    let next_day = day + Duration::days(1);
    assert!(slots
        .available_slots_by_specialist_and_date(specialist_id, next_day)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn http_past_slot_is_a_400() {
    let (store, _, specialist_id) = setup().await;
    let app = slot_routes(SlotCellState::new(store, TestConfig::default().to_arc()));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "specialistId": specialist_id,
                        "startTime": TestClock::yesterday(),
                        "endTime": TestClock::tomorrow_at(10, 0),
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Cannot create slots in the past");
    assert_eq!(body["error"], "Bad Request");
}
