use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::booking::{Appointment, AppointmentStatus};
use shared_models::error::{AppError, FieldErrors};
use shared_utils::validation::{Validate, Validator};
use slot_cell::SlotError;

pub const MAX_NOTES_LENGTH: usize = 500;

const NOTES_TOO_LONG: &str = "Notes cannot exceed 500 characters";

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub user_id: Uuid,
    pub slot_id: Uuid,
    pub service_id: Uuid,
    pub notes: Option<String>,
}

impl Validate for CreateAppointmentRequest {
    fn validate(&self) -> FieldErrors {
        Validator::new()
            .max_length("notes", self.notes.as_deref(), MAX_NOTES_LENGTH, NOTES_TOO_LONG)
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNotesRequest {
    pub notes: Option<String>,
}

impl Validate for UpdateNotesRequest {
    fn validate(&self) -> FieldErrors {
        Validator::new()
            .max_length("notes", self.notes.as_deref(), MAX_NOTES_LENGTH, NOTES_TOO_LONG)
            .finish()
    }
}

/// Optional `?status=` filter on list endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusFilter {
    pub status: Option<AppointmentStatus>,
}

/// Required `?status=` of the generic status setter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: AppointmentStatus,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slot_id: Uuid,
    pub service_id: Uuid,
    pub specialist_id: Uuid,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Appointment> for AppointmentResponse {
    fn from(appointment: Appointment) -> Self {
        Self {
            id: appointment.id,
            user_id: appointment.user_id,
            slot_id: appointment.slot_id,
            service_id: appointment.service_id,
            specialist_id: appointment.specialist_id,
            status: appointment.status,
            notes: appointment.notes,
            created_at: appointment.audit.created_at,
            updated_at: appointment.audit.updated_at,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum AppointmentError {
    #[error("Appointment not found with id: {0}")]
    NotFound(Uuid),

    #[error("User not found with id: {0}")]
    UserNotFound(Uuid),

    #[error("Slot not found with id: {0}")]
    SlotNotFound(Uuid),

    #[error("Service not found with id: {0}")]
    ServiceNotFound(Uuid),

    #[error("Slot with id {0} is not available")]
    SlotNotAvailable(Uuid),

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Cannot cancel completed appointment")]
    CannotCancelCompleted,

    #[error("Cannot transition appointment from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error(transparent)]
    Slot(#[from] SlotError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound(_)
            | AppointmentError::UserNotFound(_)
            | AppointmentError::SlotNotFound(_)
            | AppointmentError::ServiceNotFound(_) => AppError::NotFound(err.to_string()),
            AppointmentError::SlotNotAvailable(_) => AppError::Conflict(err.to_string()),
            AppointmentError::AlreadyCancelled
            | AppointmentError::CannotCancelCompleted
            | AppointmentError::InvalidStatusTransition { .. } => AppError::IllegalState(err.to_string()),
            AppointmentError::Slot(slot) => slot.into(),
            AppointmentError::Store(store) => store.into(),
        }
    }
}
