//! Entity-store traits.
//!
//! One trait per persisted entity; method names carry the entity so that a
//! `dyn BookingStore` resolves every call without ambiguity. Implementations
//! enforce the storage-level invariants: unique user email, unique service
//! name, one specialist per user, unique `(specialist_id, start_time)` per
//! slot, at most one BOOKED/CONFIRMED appointment per slot, and the slot
//! version check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use shared_models::booking::{
    Address, Appointment, AppointmentStatus, AvailableSlot, OfferedService, Specialist, User,
};
use shared_models::error::AppError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{entity} not found with id: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Referenced row is missing or still referenced: {0}")]
    ReferenceViolation(String),

    #[error("Stale write rejected for {entity} {id}: expected version {expected}")]
    VersionConflict {
        entity: &'static str,
        id: String,
        expected: i64,
    },

    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Failed to (de)serialize row: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_version_conflict(&self) -> bool {
        matches!(self, StoreError::VersionConflict { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => AppError::NotFound(err.to_string()),
            StoreError::UniqueViolation(_) => AppError::AlreadyExists(err.to_string()),
            StoreError::ReferenceViolation(_) => AppError::IllegalState(err.to_string()),
            StoreError::VersionConflict { .. } => AppError::Conflict(err.to_string()),
            StoreError::Backend(_) | StoreError::Serialization(_) => AppError::Database(err.to_string()),
        }
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn user_exists(&self, id: Uuid) -> StoreResult<bool>;
    /// Exact, case-sensitive match.
    async fn user_email_exists(&self, email: &str) -> StoreResult<bool>;
    async fn insert_user(&self, user: User) -> StoreResult<User>;
    async fn update_user(&self, user: User) -> StoreResult<User>;
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait AddressRepository: Send + Sync {
    async fn find_address(&self, id: Uuid) -> StoreResult<Option<Address>>;
    async fn list_addresses(&self) -> StoreResult<Vec<Address>>;
    async fn address_exists(&self, id: Uuid) -> StoreResult<bool>;
    async fn insert_address(&self, address: Address) -> StoreResult<Address>;
    async fn update_address(&self, address: Address) -> StoreResult<Address>;
    async fn delete_address(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait SpecialistRepository: Send + Sync {
    async fn find_specialist(&self, id: Uuid) -> StoreResult<Option<Specialist>>;
    async fn list_specialists(&self) -> StoreResult<Vec<Specialist>>;
    async fn specialist_exists(&self, id: Uuid) -> StoreResult<bool>;
    async fn find_specialist_by_user(&self, user_id: Uuid) -> StoreResult<Option<Specialist>>;
    async fn specialist_exists_for_user(&self, user_id: Uuid) -> StoreResult<bool>;
    async fn list_accepting_specialists(&self) -> StoreResult<Vec<Specialist>>;
    /// Case-insensitive substring match.
    async fn find_specialists_by_specialization(&self, fragment: &str) -> StoreResult<Vec<Specialist>>;
    /// Exact match on the city of the work address.
    async fn find_specialists_by_city(&self, city: &str) -> StoreResult<Vec<Specialist>>;
    /// Specialists offering the service and currently accepting appointments.
    async fn find_accepting_specialists_by_service(&self, service_id: Uuid) -> StoreResult<Vec<Specialist>>;
    async fn insert_specialist(&self, specialist: Specialist) -> StoreResult<Specialist>;
    async fn update_specialist(&self, specialist: Specialist) -> StoreResult<Specialist>;
    /// Also removes every slot owned by the specialist.
    async fn delete_specialist(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait OfferedServiceRepository: Send + Sync {
    async fn find_service(&self, id: Uuid) -> StoreResult<Option<OfferedService>>;
    async fn list_services(&self) -> StoreResult<Vec<OfferedService>>;
    async fn service_exists(&self, id: Uuid) -> StoreResult<bool>;
    async fn service_name_exists(&self, name: &str) -> StoreResult<bool>;
    async fn list_active_services(&self) -> StoreResult<Vec<OfferedService>>;
    async fn find_active_services_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<OfferedService>>;
    /// Inclusive on both bounds.
    async fn find_active_services_by_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> StoreResult<Vec<OfferedService>>;
    async fn find_active_services_by_duration(&self, duration_minutes: i32) -> StoreResult<Vec<OfferedService>>;
    async fn insert_service(&self, service: OfferedService) -> StoreResult<OfferedService>;
    async fn update_service(&self, service: OfferedService) -> StoreResult<OfferedService>;
    async fn delete_service(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait SlotRepository: Send + Sync {
    async fn find_slot(&self, id: Uuid) -> StoreResult<Option<AvailableSlot>>;
    async fn list_slots(&self) -> StoreResult<Vec<AvailableSlot>>;
    async fn slot_exists(&self, id: Uuid) -> StoreResult<bool>;
    async fn find_slots_by_specialist(&self, specialist_id: Uuid) -> StoreResult<Vec<AvailableSlot>>;
    async fn find_unbooked_slots_by_specialist(&self, specialist_id: Uuid) -> StoreResult<Vec<AvailableSlot>>;
    /// Slots whose start time lies in `[from, to]`, ordered by start time.
    async fn find_slots_starting_between(
        &self,
        specialist_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<AvailableSlot>>;
    /// All-or-nothing batch insert.
    async fn insert_slots(&self, slots: Vec<AvailableSlot>) -> StoreResult<Vec<AvailableSlot>>;
    /// Writes `slot` only if the stored version still equals
    /// `expected_version`; the stored copy gets `expected_version + 1`.
    async fn update_slot(&self, slot: AvailableSlot, expected_version: i64) -> StoreResult<AvailableSlot>;
    async fn delete_slot(&self, id: Uuid) -> StoreResult<()>;
    /// All-or-nothing batch delete.
    async fn delete_slots(&self, ids: &[Uuid]) -> StoreResult<()>;
}

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>>;
    async fn list_appointments(&self) -> StoreResult<Vec<Appointment>>;
    async fn appointment_exists(&self, id: Uuid) -> StoreResult<bool>;
    async fn find_appointments_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Appointment>>;
    async fn find_appointments_by_status(&self, status: AppointmentStatus) -> StoreResult<Vec<Appointment>>;
    async fn slot_has_appointment_in(&self, slot_id: Uuid, statuses: &[AppointmentStatus]) -> StoreResult<bool>;
    async fn specialist_has_appointment_in(
        &self,
        specialist_id: Uuid,
        statuses: &[AppointmentStatus],
    ) -> StoreResult<bool>;
    async fn service_has_appointment_in(&self, service_id: Uuid, statuses: &[AppointmentStatus]) -> StoreResult<bool>;
    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment>;
    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment>;
    async fn delete_appointment(&self, id: Uuid) -> StoreResult<()>;
}

/// Everything the cells need from persistence.
pub trait BookingStore:
    UserRepository
    + AddressRepository
    + SpecialistRepository
    + OfferedServiceRepository
    + SlotRepository
    + AppointmentRepository
{
}

impl<T> BookingStore for T where
    T: UserRepository
        + AddressRepository
        + SpecialistRepository
        + OfferedServiceRepository
        + SlotRepository
        + AppointmentRepository
{
}
