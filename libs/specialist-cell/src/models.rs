use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::booking::Specialist;
use shared_models::error::{AppError, FieldErrors};
use shared_utils::validation::{Validate, Validator};

pub const MIN_SPECIALIZATION_LENGTH: usize = 2;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSpecialistRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub specialization: String,
    pub work_address_id: Option<Uuid>,
}

impl Validate for CreateSpecialistRequest {
    fn validate(&self) -> FieldErrors {
        Validator::new()
            .not_blank("specialization", &self.specialization, "Specialization is required")
            .length(
                "specialization",
                &self.specialization,
                MIN_SPECIALIZATION_LENGTH,
                100,
                "Specialization must be between 2 and 100 characters",
            )
            .finish()
    }
}

/// Search criteria; the first non-empty one wins, in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialistSearch {
    pub specialization: Option<String>,
    pub city: Option<String>,
    pub service_id: Option<Uuid>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecialistResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization: String,
    pub work_address_id: Option<Uuid>,
    pub accepting_appointments: bool,
    pub service_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Specialist> for SpecialistResponse {
    fn from(specialist: Specialist) -> Self {
        Self {
            id: specialist.id,
            user_id: specialist.user_id,
            specialization: specialist.specialization,
            work_address_id: specialist.work_address_id,
            accepting_appointments: specialist.accepting_appointments,
            service_ids: specialist.service_ids,
            created_at: specialist.audit.created_at,
            updated_at: specialist.audit.updated_at,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum SpecialistError {
    #[error("Specialist not found with id: {0}")]
    NotFound(Uuid),

    #[error("No specialist found for user with id: {0}")]
    NotFoundForUser(Uuid),

    #[error("User not found with id: {0}")]
    UserNotFound(Uuid),

    #[error("Address not found with id: {0}")]
    AddressNotFound(Uuid),

    #[error("Service not found with id: {0}")]
    ServiceNotFound(Uuid),

    #[error("User with id {0} is already a specialist")]
    AlreadySpecialist(Uuid),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Specialist is already accepting appointments")]
    AlreadyAccepting,

    #[error("Specialist is already not accepting appointments")]
    AlreadyNotAccepting,

    #[error("Cannot delete specialist with active appointments. Disable appointments instead.")]
    HasActiveAppointments,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SpecialistError> for AppError {
    fn from(err: SpecialistError) -> Self {
        match err {
            SpecialistError::NotFound(_)
            | SpecialistError::NotFoundForUser(_)
            | SpecialistError::UserNotFound(_)
            | SpecialistError::AddressNotFound(_)
            | SpecialistError::ServiceNotFound(_) => AppError::NotFound(err.to_string()),
            SpecialistError::AlreadySpecialist(_) => AppError::AlreadyExists(err.to_string()),
            SpecialistError::InvalidArgument(_) => AppError::BadRequest(err.to_string()),
            SpecialistError::AlreadyAccepting
            | SpecialistError::AlreadyNotAccepting
            | SpecialistError::HasActiveAppointments => AppError::IllegalState(err.to_string()),
            SpecialistError::Store(store) => store.into(),
        }
    }
}
