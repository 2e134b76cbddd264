use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::{ConflictAware, StoreError};
use shared_models::booking::AvailableSlot;
use shared_models::error::AppError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSlotRequest {
    pub specialist_id: Uuid,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMultipleSlotsRequest {
    pub specialist_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRangeQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictQuery {
    pub specialist_id: Uuid,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub exclude_slot_id: Option<Uuid>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponse {
    pub id: Uuid,
    pub specialist_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub booked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AvailableSlot> for SlotResponse {
    fn from(slot: AvailableSlot) -> Self {
        Self {
            id: slot.id,
            specialist_id: slot.specialist_id,
            start_time: slot.start_time,
            end_time: slot.end_time,
            booked: slot.booked,
            created_at: slot.audit.created_at,
            updated_at: slot.audit.updated_at,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("Slot not found with id: {0}")]
    NotFound(Uuid),

    #[error("Specialist not found with id: {0}")]
    SpecialistNotFound(Uuid),

    #[error("{0}")]
    InvalidTimeRange(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Slot is already booked")]
    AlreadyBooked,

    #[error("Cannot delete booked slot")]
    BookedSlotDeletion,

    #[error("Cannot delete slots - some slots are booked")]
    BookedSlotsInRange,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SlotError {
    pub fn invalid(message: &str) -> Self {
        SlotError::InvalidTimeRange(message.to_string())
    }
}

impl ConflictAware for SlotError {
    fn is_version_conflict(&self) -> bool {
        matches!(self, SlotError::Store(store) if store.is_version_conflict())
    }
}

impl From<SlotError> for AppError {
    fn from(err: SlotError) -> Self {
        match err {
            SlotError::NotFound(_) | SlotError::SpecialistNotFound(_) => AppError::NotFound(err.to_string()),
            SlotError::InvalidTimeRange(_) => AppError::BadRequest(err.to_string()),
            SlotError::Conflict(_) => AppError::Conflict(err.to_string()),
            SlotError::AlreadyBooked | SlotError::BookedSlotDeletion | SlotError::BookedSlotsInRange => {
                AppError::IllegalState(err.to_string())
            }
            SlotError::Store(store) => store.into(),
        }
    }
}
