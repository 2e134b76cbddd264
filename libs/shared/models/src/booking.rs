use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::Actor;

// ==============================================================================
// AUDIT FIELDS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    pub updated_by: String,
}

impl Audit {
    pub fn new(actor: &Actor) -> Self {
        let now = Utc::now();
        let name = actor.audit_name();
        Self {
            created_at: now,
            updated_at: now,
            created_by: name.clone(),
            updated_by: name,
        }
    }

    pub fn touch(&mut self, actor: &Actor) {
        self.updated_at = Utc::now();
        self.updated_by = actor.audit_name();
    }
}

// ==============================================================================
// USERS & ADDRESSES
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Specialist,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Salted one-way hash, never the plaintext password.
    pub password_hash: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: Option<String>,
    pub roles: Vec<Role>,
    pub enabled: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub id: Uuid,
    pub country: String,
    pub city: String,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub building_number: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

// ==============================================================================
// SPECIALISTS & OFFERED SERVICES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specialist {
    pub id: Uuid,
    pub user_id: Uuid,
    pub specialization: String,
    pub work_address_id: Option<Uuid>,
    pub accepting_appointments: bool,
    #[serde(default)]
    pub service_ids: Vec<Uuid>,
    #[serde(flatten)]
    pub audit: Audit,
}

impl Specialist {
    pub fn offers(&self, service_id: Uuid) -> bool {
        self.service_ids.contains(&service_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferedService {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_minutes: i32,
    pub active: bool,
    #[serde(flatten)]
    pub audit: Audit,
}

// ==============================================================================
// SLOTS & APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub id: Uuid,
    pub specialist_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub booked: bool,
    /// Optimistic-lock counter, bumped by the store on every update.
    pub version: i64,
    #[serde(flatten)]
    pub audit: Audit,
}

impl AvailableSlot {
    pub fn new(
        specialist_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        actor: &Actor,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            specialist_id,
            start_time,
            end_time,
            booked: false,
            version: 0,
            audit: Audit::new(actor),
        }
    }

    /// Half-open interval overlap: touching endpoints do not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        intervals_overlap(start, end, self.start_time, self.end_time)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// `[start1, end1)` and `[start2, end2)` overlap iff `start1 < end2 && end1 > start2`.
pub fn intervals_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && end1 > start2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Booked,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Statuses under which an appointment still claims its slot.
    pub const ACTIVE: [AppointmentStatus; 2] = [AppointmentStatus::Booked, AppointmentStatus::Confirmed];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "BOOKED",
            AppointmentStatus::Confirmed => "CONFIRMED",
            AppointmentStatus::InProgress => "IN_PROGRESS",
            AppointmentStatus::Completed => "COMPLETED",
            AppointmentStatus::Cancelled => "CANCELLED",
            AppointmentStatus::NoShow => "NO_SHOW",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slot_id: Uuid,
    pub service_id: Uuid,
    /// Copied from the slot at booking time so specialist-level queries
    /// do not need a join.
    pub specialist_id: Uuid,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub audit: Audit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn touching_intervals_do_not_overlap() {
        let ten = Utc::now() + Duration::days(1);
        let half_past = ten + Duration::minutes(30);
        let eleven = ten + Duration::minutes(60);

        assert!(!intervals_overlap(half_past, eleven, ten, half_past));
        assert!(intervals_overlap(ten + Duration::minutes(15), ten + Duration::minutes(45), ten, half_past));
        assert!(intervals_overlap(ten, eleven, ten + Duration::minutes(10), ten + Duration::minutes(20)));
    }

    #[test]
    fn status_wire_format_is_screaming_snake_case() {
        let json = serde_json::to_string(&AppointmentStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let parsed: AppointmentStatus = serde_json::from_str("\"NO_SHOW\"").unwrap();
        assert_eq!(parsed, AppointmentStatus::NoShow);
        assert_eq!(AppointmentStatus::Cancelled.to_string(), "CANCELLED");
    }

    #[test]
    fn only_booked_and_confirmed_hold_a_slot() {
        assert!(AppointmentStatus::Booked.is_active());
        assert!(AppointmentStatus::Confirmed.is_active());
        assert!(!AppointmentStatus::InProgress.is_active());
        assert!(!AppointmentStatus::Cancelled.is_active());
        assert!(AppointmentStatus::NoShow.is_terminal());
        assert!(!AppointmentStatus::Booked.is_terminal());
    }

    #[test]
    fn audit_records_actor() {
        let actor = Actor::user("admin-1", None);
        let mut audit = Audit::new(&Actor::system());
        assert_eq!(audit.created_by, "system");
        audit.touch(&actor);
        assert_eq!(audit.updated_by, "admin-1");
        assert_eq!(audit.created_by, "system");
    }
}
