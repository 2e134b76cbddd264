use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{retry_on_conflict, BookingStore, RetryPolicy, StoreError};
use shared_models::actor::Actor;
use shared_models::booking::AvailableSlot;

use crate::models::{CreateMultipleSlotsRequest, CreateSlotRequest, SlotError};

/// Extra margin added to the end of the candidate window of a conflict check.
const CONFLICT_MARGIN_MINUTES: i64 = 1;

const SLOT_CONFLICT: &str = "Time slot conflicts with existing slots";
const START_AFTER_END: &str = "Start time cannot be after end time";

/// True when `[start, end)` overlaps any candidate other than `exclude`.
/// Touching endpoints are not a conflict.
pub fn conflicts_with(
    candidates: &[AvailableSlot],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> bool {
    candidates
        .iter()
        .filter(|slot| Some(slot.id) != exclude)
        .any(|slot| slot.overlaps(start, end))
}

/// Consecutive `[t, t + duration)` intervals from `start` while the interval
/// still ends at or before `end`.
pub fn partition_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    duration: Duration,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut intervals = Vec::new();
    if duration <= Duration::zero() {
        return intervals;
    }
    let mut current = start;
    while current + duration <= end {
        intervals.push((current, current + duration));
        current += duration;
    }
    intervals
}

fn validate_slot_times(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), SlotError> {
    let (Some(start), Some(end)) = (start, end) else {
        return Err(SlotError::invalid("Start time and end time cannot be null"));
    };
    if start > end {
        return Err(SlotError::invalid(START_AFTER_END));
    }
    if start == end {
        return Err(SlotError::invalid("Start time cannot equal end time"));
    }
    if start < now {
        return Err(SlotError::invalid("Cannot create slots in the past"));
    }
    Ok((start, end))
}

/// Slot Availability Engine: conflict detection, slot creation and the
/// structural booked flag.
pub struct SlotService {
    store: Arc<dyn BookingStore>,
    retry: RetryPolicy,
    /// One lock per specialist so a conflict check and its insert run
    /// without another creation for the same specialist in between. An
    /// entry lives only while some caller holds or awaits it.
    creation_locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SlotService {
    pub fn new(store: Arc<dyn BookingStore>, retry: RetryPolicy) -> Self {
        Self {
            store,
            retry,
            creation_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `critical` under the specialist's creation lock. Clones of the
    /// entry are only taken under the map lock, so a strong count of one
    /// there means no other caller can still reach it.
    async fn with_creation_lock<T, F, Fut>(&self, specialist_id: Uuid, critical: F) -> Result<T, SlotError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SlotError>>,
    {
        let lock = {
            let mut locks = self.creation_locks.lock().await;
            locks.entry(specialist_id).or_default().clone()
        };
        let result = {
            let _guard = lock.lock().await;
            critical().await
        };
        drop(lock);

        let mut locks = self.creation_locks.lock().await;
        if locks
            .get(&specialist_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&specialist_id);
        }
        result
    }

    /// Every slot that could overlap an interval ending at `end`.
    ///
    /// The lower bound reaches back to the epoch: a long slot that starts
    /// well before the interval can still overlap it.
    async fn conflict_candidates(
        &self,
        specialist_id: Uuid,
        end: DateTime<Utc>,
    ) -> Result<Vec<AvailableSlot>, SlotError> {
        Ok(self
            .store
            .find_slots_starting_between(
                specialist_id,
                DateTime::<Utc>::UNIX_EPOCH,
                end + Duration::minutes(CONFLICT_MARGIN_MINUTES),
            )
            .await?)
    }

    pub async fn is_slot_conflicting(
        &self,
        specialist_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_slot_id: Option<Uuid>,
    ) -> Result<bool, SlotError> {
        debug!(
            "Checking slot conflicts for specialist: {} from {} to {}",
            specialist_id, start, end
        );
        let candidates = self.conflict_candidates(specialist_id, end).await?;
        Ok(conflicts_with(&candidates, start, end, exclude_slot_id))
    }

    pub async fn create_slot(&self, request: CreateSlotRequest, actor: &Actor) -> Result<AvailableSlot, SlotError> {
        info!(
            "Creating slot for specialist: {} from {:?} to {:?}",
            request.specialist_id, request.start_time, request.end_time
        );
        let (start, end) = validate_slot_times(request.start_time, request.end_time, Utc::now())?;
        self.ensure_specialist(request.specialist_id).await?;

        let specialist_id = request.specialist_id;
        let saved = self
            .with_creation_lock(specialist_id, move || async move {
                if self.is_slot_conflicting(specialist_id, start, end, None).await? {
                    warn!("Rejecting slot {} - {} for specialist {}", start, end, specialist_id);
                    return Err(SlotError::Conflict(SLOT_CONFLICT.to_string()));
                }

                let slot = AvailableSlot::new(specialist_id, start, end, actor);
                let mut saved = self.insert_batch(vec![slot]).await?;
                saved.pop().ok_or_else(|| SlotError::Conflict(SLOT_CONFLICT.to_string()))
            })
            .await?;
        info!("Slot created successfully with id: {}", saved.id);
        Ok(saved)
    }

    /// Splits the window into fixed-length slots, skipping the ones that
    /// overlap stored slots. Fails only when nothing is left to create.
    pub async fn create_multiple_slots(
        &self,
        request: CreateMultipleSlotsRequest,
        actor: &Actor,
    ) -> Result<Vec<AvailableSlot>, SlotError> {
        info!(
            "Creating multiple slots for specialist: {} from {} to {} with duration: {} minutes",
            request.specialist_id, request.start_time, request.end_time, request.duration_minutes
        );
        if request.duration_minutes <= 0 {
            return Err(SlotError::invalid("Duration must be positive"));
        }
        if request.start_time > request.end_time {
            return Err(SlotError::invalid(START_AFTER_END));
        }
        if request.start_time < Utc::now() {
            return Err(SlotError::invalid("Cannot create slots in the past"));
        }
        self.ensure_specialist(request.specialist_id).await?;

        let specialist_id = request.specialist_id;
        let saved = self
            .with_creation_lock(specialist_id, move || async move {
                let existing = self
                    .conflict_candidates(specialist_id, request.end_time)
                    .await?;

                let mut slots = Vec::new();
                for (start, end) in partition_window(
                    request.start_time,
                    request.end_time,
                    Duration::minutes(request.duration_minutes),
                ) {
                    if conflicts_with(&existing, start, end, None) {
                        warn!("Skipping conflicting slot from {} to {}", start, end);
                        continue;
                    }
                    slots.push(AvailableSlot::new(specialist_id, start, end, actor));
                }

                if slots.is_empty() {
                    return Err(SlotError::Conflict(
                        "No slots could be created due to conflicts".to_string(),
                    ));
                }

                self.insert_batch(slots).await
            })
            .await?;
        info!("Created {} slots successfully", saved.len());
        Ok(saved)
    }

    pub async fn get_slot(&self, id: Uuid) -> Result<AvailableSlot, SlotError> {
        debug!("Fetching slot with id: {}", id);
        self.store.find_slot(id).await?.ok_or(SlotError::NotFound(id))
    }

    pub async fn list_slots(&self) -> Result<Vec<AvailableSlot>, SlotError> {
        debug!("Fetching all slots");
        Ok(self.store.list_slots().await?)
    }

    pub async fn slots_by_specialist(&self, specialist_id: Uuid) -> Result<Vec<AvailableSlot>, SlotError> {
        debug!("Fetching all slots for specialist: {}", specialist_id);
        self.ensure_specialist(specialist_id).await?;
        Ok(self.store.find_slots_by_specialist(specialist_id).await?)
    }

    pub async fn available_slots_by_specialist(&self, specialist_id: Uuid) -> Result<Vec<AvailableSlot>, SlotError> {
        debug!("Fetching available slots for specialist: {}", specialist_id);
        self.ensure_specialist(specialist_id).await?;
        Ok(self.store.find_unbooked_slots_by_specialist(specialist_id).await?)
    }

    /// Slots whose start lies within `[from, to]`.
    pub async fn slots_by_specialist_and_range(
        &self,
        specialist_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<AvailableSlot>, SlotError> {
        debug!("Fetching slots for specialist: {} between {} and {}", specialist_id, from, to);
        self.ensure_specialist(specialist_id).await?;
        if from > to {
            return Err(SlotError::invalid(START_AFTER_END));
        }
        Ok(self.store.find_slots_starting_between(specialist_id, from, to).await?)
    }

    /// Unbooked slots starting on the given UTC day.
    pub async fn available_slots_by_specialist_and_date(
        &self,
        specialist_id: Uuid,
        date: NaiveDate,
    ) -> Result<Vec<AvailableSlot>, SlotError> {
        debug!("Fetching available slots for specialist: {} on date: {}", specialist_id, date);
        self.ensure_specialist(specialist_id).await?;
        let start_of_day = date.and_time(NaiveTime::MIN).and_utc();
        let end_of_day = start_of_day + Duration::days(1) - Duration::nanoseconds(1);

        let slots = self
            .store
            .find_slots_starting_between(specialist_id, start_of_day, end_of_day)
            .await?;
        Ok(slots.into_iter().filter(|slot| !slot.booked).collect())
    }

    pub async fn mark_slot_as_booked(&self, id: Uuid, actor: &Actor) -> Result<AvailableSlot, SlotError> {
        info!("Marking slot as booked: {}", id);
        let updated = retry_on_conflict(self.retry, move || async move {
            let mut slot = self.get_slot(id).await?;
            if slot.booked {
                return Err(SlotError::AlreadyBooked);
            }
            let expected = slot.version;
            slot.booked = true;
            slot.audit.touch(actor);
            Ok(self.store.update_slot(slot, expected).await?)
        })
        .await?;
        info!("Slot marked as booked: {}", id);
        Ok(updated)
    }

    /// Idempotent.
    pub async fn mark_slot_as_available(&self, id: Uuid, actor: &Actor) -> Result<AvailableSlot, SlotError> {
        info!("Marking slot as available: {}", id);
        let updated = self.set_booked_flag(id, false, actor).await?;
        info!("Slot marked as available: {}", id);
        Ok(updated)
    }

    /// Writes the booked flag without checking its current value. Used by
    /// the appointment workflow, which owns the availability decision.
    pub async fn set_booked_flag(&self, id: Uuid, booked: bool, actor: &Actor) -> Result<AvailableSlot, SlotError> {
        debug!("Setting booked flag of slot {} to {}", id, booked);
        retry_on_conflict(self.retry, move || async move {
            let mut slot = self.get_slot(id).await?;
            let expected = slot.version;
            slot.booked = booked;
            slot.audit.touch(actor);
            Ok(self.store.update_slot(slot, expected).await?)
        })
        .await
    }

    /// Structural check on the booked flag.
    pub async fn is_slot_available(&self, id: Uuid) -> Result<bool, SlotError> {
        debug!("Checking availability for slot: {}", id);
        Ok(!self.get_slot(id).await?.booked)
    }

    pub async fn delete_slot(&self, id: Uuid) -> Result<(), SlotError> {
        info!("Deleting slot with id: {}", id);
        let slot = self.get_slot(id).await?;
        if slot.booked {
            return Err(SlotError::BookedSlotDeletion);
        }
        self.store.delete_slot(id).await?;
        info!("Slot deleted successfully: {}", id);
        Ok(())
    }

    /// Deletes every slot starting within `[from, to]`, or none of them if
    /// any is booked.
    pub async fn delete_slots_by_range(
        &self,
        specialist_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<usize, SlotError> {
        info!("Deleting slots for specialist: {} between {} and {}", specialist_id, from, to);
        if from > to {
            return Err(SlotError::invalid(START_AFTER_END));
        }
        let slots = self.store.find_slots_starting_between(specialist_id, from, to).await?;
        if slots.iter().any(|slot| slot.booked) {
            return Err(SlotError::BookedSlotsInRange);
        }

        let ids: Vec<Uuid> = slots.iter().map(|slot| slot.id).collect();
        if ids.is_empty() {
            return Ok(0);
        }
        self.store.delete_slots(&ids).await?;
        info!("Deleted {} slots for specialist: {}", ids.len(), specialist_id);
        Ok(ids.len())
    }

    async fn ensure_specialist(&self, specialist_id: Uuid) -> Result<(), SlotError> {
        if self.store.specialist_exists(specialist_id).await? {
            Ok(())
        } else {
            Err(SlotError::SpecialistNotFound(specialist_id))
        }
    }

    async fn insert_batch(&self, slots: Vec<AvailableSlot>) -> Result<Vec<AvailableSlot>, SlotError> {
        self.store.insert_slots(slots).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => SlotError::Conflict(SLOT_CONFLICT.to_string()),
            other => other.into(),
        })
    }
}
