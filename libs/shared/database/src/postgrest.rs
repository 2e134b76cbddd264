//! Entity store backed by Supabase's PostgREST endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::booking::{
    Address, Appointment, AppointmentStatus, AvailableSlot, OfferedService, Specialist, User,
};

use crate::repository::{
    AddressRepository, AppointmentRepository, OfferedServiceRepository, SlotRepository,
    SpecialistRepository, StoreError, StoreResult, UserRepository,
};
use crate::supabase::{return_representation, SupabaseClient, SupabaseError};

const USERS: &str = "users";
const ADDRESSES: &str = "addresses";
const SPECIALISTS: &str = "specialists";
const SERVICES: &str = "services";
const SLOTS: &str = "slots";
const APPOINTMENTS: &str = "appointments";

/// Postgres `foreign_key_violation`.
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn postgres_code(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get("code")?.as_str().map(str::to_owned)
}

impl From<SupabaseError> for StoreError {
    fn from(err: SupabaseError) -> Self {
        match err {
            SupabaseError::Conflict { body, .. } if postgres_code(&body).as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                StoreError::ReferenceViolation(body)
            }
            SupabaseError::Conflict { body, .. } => StoreError::UniqueViolation(body),
            SupabaseError::Transport(e) if e.is_decode() => StoreError::Serialization(e.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

fn encode_ts(ts: DateTime<Utc>) -> String {
    urlencoding::encode(&ts.to_rfc3339()).into_owned()
}

fn id_list(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",")
}

fn status_list(statuses: &[AppointmentStatus]) -> String {
    statuses.iter().map(AppointmentStatus::as_str).collect::<Vec<_>>().join(",")
}

fn to_row<T: Serialize>(entity: &T) -> StoreResult<Value> {
    serde_json::to_value(entity).map_err(|e| StoreError::Serialization(e.to_string()))
}

pub struct SupabaseStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &str) -> StoreResult<Vec<T>> {
        let path = format!("/rest/v1/{}?{}", table, query);
        let rows: Vec<T> = self.supabase.request(Method::GET, &path, None, None).await?;
        Ok(rows)
    }

    async fn select_by_id<T: DeserializeOwned>(&self, table: &str, id: Uuid) -> StoreResult<Option<T>> {
        let rows: Vec<T> = self.select(table, &format!("id=eq.{}&limit=1", id)).await?;
        Ok(rows.into_iter().next())
    }

    async fn any_row(&self, table: &str, filter: &str) -> StoreResult<bool> {
        let rows: Vec<Value> = self.select(table, &format!("select=id&{}&limit=1", filter)).await?;
        Ok(!rows.is_empty())
    }

    async fn insert_rows<T: DeserializeOwned>(&self, table: &str, body: Value) -> StoreResult<Vec<T>> {
        let path = format!("/rest/v1/{}", table);
        let rows: Vec<T> = self
            .supabase
            .request_with_headers(Method::POST, &path, None, Some(body), Some(return_representation()))
            .await?;
        Ok(rows)
    }

    async fn insert_one<T: Serialize + DeserializeOwned>(&self, table: &str, entity: &T) -> StoreResult<T> {
        let rows: Vec<T> = self.insert_rows(table, to_row(entity)?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("Insert into {} returned no rows", table)))
    }

    async fn patch_rows<T: DeserializeOwned>(&self, table: &str, filter: &str, body: Value) -> StoreResult<Vec<T>> {
        let path = format!("/rest/v1/{}?{}", table, filter);
        let rows: Vec<T> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, None, Some(body), Some(return_representation()))
            .await?;
        Ok(rows)
    }

    async fn update_by_id<T: Serialize + DeserializeOwned>(
        &self,
        table: &str,
        entity_name: &'static str,
        id: Uuid,
        entity: &T,
    ) -> StoreResult<T> {
        let rows: Vec<T> = self.patch_rows(table, &format!("id=eq.{}", id), to_row(entity)?).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::not_found(entity_name, id))
    }

    async fn delete_by_id(&self, table: &str, entity_name: &'static str, id: Uuid) -> StoreResult<()> {
        let path = format!("/rest/v1/{}?id=eq.{}", table, id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, None, Some(return_representation()))
            .await?;
        if rows.is_empty() {
            return Err(StoreError::not_found(entity_name, id));
        }
        Ok(())
    }
}

// ==============================================================================
// USERS
// ==============================================================================

#[async_trait]
impl UserRepository for SupabaseStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.select_by_id(USERS, id).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.select(USERS, "order=created_at.asc").await
    }

    async fn user_exists(&self, id: Uuid) -> StoreResult<bool> {
        self.any_row(USERS, &format!("id=eq.{}", id)).await
    }

    async fn user_email_exists(&self, email: &str) -> StoreResult<bool> {
        self.any_row(USERS, &format!("email=eq.{}", urlencoding::encode(email))).await
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        self.insert_one(USERS, &user).await
    }

    async fn update_user(&self, user: User) -> StoreResult<User> {
        self.update_by_id(USERS, "User", user.id, &user).await
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.delete_by_id(USERS, "User", id).await
    }
}

// ==============================================================================
// ADDRESSES
// ==============================================================================

#[async_trait]
impl AddressRepository for SupabaseStore {
    async fn find_address(&self, id: Uuid) -> StoreResult<Option<Address>> {
        self.select_by_id(ADDRESSES, id).await
    }

    async fn list_addresses(&self) -> StoreResult<Vec<Address>> {
        self.select(ADDRESSES, "order=created_at.asc").await
    }

    async fn address_exists(&self, id: Uuid) -> StoreResult<bool> {
        self.any_row(ADDRESSES, &format!("id=eq.{}", id)).await
    }

    async fn insert_address(&self, address: Address) -> StoreResult<Address> {
        self.insert_one(ADDRESSES, &address).await
    }

    async fn update_address(&self, address: Address) -> StoreResult<Address> {
        self.update_by_id(ADDRESSES, "Address", address.id, &address).await
    }

    async fn delete_address(&self, id: Uuid) -> StoreResult<()> {
        self.delete_by_id(ADDRESSES, "Address", id).await
    }
}

// ==============================================================================
// SPECIALISTS
// ==============================================================================

#[async_trait]
impl SpecialistRepository for SupabaseStore {
    async fn find_specialist(&self, id: Uuid) -> StoreResult<Option<Specialist>> {
        self.select_by_id(SPECIALISTS, id).await
    }

    async fn list_specialists(&self) -> StoreResult<Vec<Specialist>> {
        self.select(SPECIALISTS, "order=created_at.asc").await
    }

    async fn specialist_exists(&self, id: Uuid) -> StoreResult<bool> {
        self.any_row(SPECIALISTS, &format!("id=eq.{}", id)).await
    }

    async fn find_specialist_by_user(&self, user_id: Uuid) -> StoreResult<Option<Specialist>> {
        let rows: Vec<Specialist> = self
            .select(SPECIALISTS, &format!("user_id=eq.{}&limit=1", user_id))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn specialist_exists_for_user(&self, user_id: Uuid) -> StoreResult<bool> {
        self.any_row(SPECIALISTS, &format!("user_id=eq.{}", user_id)).await
    }

    async fn list_accepting_specialists(&self) -> StoreResult<Vec<Specialist>> {
        self.select(SPECIALISTS, "accepting_appointments=is.true&order=created_at.asc")
            .await
    }

    async fn find_specialists_by_specialization(&self, fragment: &str) -> StoreResult<Vec<Specialist>> {
        let pattern = urlencoding::encode(&format!("*{}*", fragment)).into_owned();
        self.select(
            SPECIALISTS,
            &format!("specialization=ilike.{}&order=created_at.asc", pattern),
        )
        .await
    }

    async fn find_specialists_by_city(&self, city: &str) -> StoreResult<Vec<Specialist>> {
        let addresses: Vec<Value> = self
            .select(ADDRESSES, &format!("select=id&city=eq.{}", urlencoding::encode(city)))
            .await?;
        let address_ids: Vec<&str> = addresses
            .iter()
            .filter_map(|row| row.get("id").and_then(Value::as_str))
            .collect();
        if address_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select(
            SPECIALISTS,
            &format!("work_address_id=in.({})&order=created_at.asc", address_ids.join(",")),
        )
        .await
    }

    async fn find_accepting_specialists_by_service(&self, service_id: Uuid) -> StoreResult<Vec<Specialist>> {
        let contains = urlencoding::encode(&format!("{{{}}}", service_id)).into_owned();
        self.select(
            SPECIALISTS,
            &format!(
                "service_ids=cs.{}&accepting_appointments=is.true&order=created_at.asc",
                contains
            ),
        )
        .await
    }

    async fn insert_specialist(&self, specialist: Specialist) -> StoreResult<Specialist> {
        self.insert_one(SPECIALISTS, &specialist).await
    }

    async fn update_specialist(&self, specialist: Specialist) -> StoreResult<Specialist> {
        self.update_by_id(SPECIALISTS, "Specialist", specialist.id, &specialist)
            .await
    }

    async fn delete_specialist(&self, id: Uuid) -> StoreResult<()> {
        let path = format!("/rest/v1/{}?specialist_id=eq.{}", SLOTS, id);
        self.supabase.execute(Method::DELETE, &path, None, None).await?;
        debug!("Removed slots with specialist {}", id);
        self.delete_by_id(SPECIALISTS, "Specialist", id).await
    }
}

// ==============================================================================
// OFFERED SERVICES
// ==============================================================================

#[async_trait]
impl OfferedServiceRepository for SupabaseStore {
    async fn find_service(&self, id: Uuid) -> StoreResult<Option<OfferedService>> {
        self.select_by_id(SERVICES, id).await
    }

    async fn list_services(&self) -> StoreResult<Vec<OfferedService>> {
        self.select(SERVICES, "order=created_at.asc").await
    }

    async fn service_exists(&self, id: Uuid) -> StoreResult<bool> {
        self.any_row(SERVICES, &format!("id=eq.{}", id)).await
    }

    async fn service_name_exists(&self, name: &str) -> StoreResult<bool> {
        self.any_row(SERVICES, &format!("name=eq.{}", urlencoding::encode(name))).await
    }

    async fn list_active_services(&self) -> StoreResult<Vec<OfferedService>> {
        self.select(SERVICES, "active=is.true&order=created_at.asc").await
    }

    async fn find_active_services_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<OfferedService>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select(
            SERVICES,
            &format!("id=in.({})&active=is.true&order=created_at.asc", id_list(ids)),
        )
        .await
    }

    async fn find_active_services_by_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> StoreResult<Vec<OfferedService>> {
        self.select(
            SERVICES,
            &format!(
                "active=is.true&price=gte.{}&price=lte.{}&order=created_at.asc",
                min, max
            ),
        )
        .await
    }

    async fn find_active_services_by_duration(&self, duration_minutes: i32) -> StoreResult<Vec<OfferedService>> {
        self.select(
            SERVICES,
            &format!(
                "active=is.true&duration_minutes=eq.{}&order=created_at.asc",
                duration_minutes
            ),
        )
        .await
    }

    async fn insert_service(&self, service: OfferedService) -> StoreResult<OfferedService> {
        self.insert_one(SERVICES, &service).await
    }

    async fn update_service(&self, service: OfferedService) -> StoreResult<OfferedService> {
        self.update_by_id(SERVICES, "Service", service.id, &service).await
    }

    async fn delete_service(&self, id: Uuid) -> StoreResult<()> {
        self.delete_by_id(SERVICES, "Service", id).await?;

        // uuid[] columns carry no foreign key, so detach by hand.
        let contains = urlencoding::encode(&format!("{{{}}}", id)).into_owned();
        let offering: Vec<Specialist> = self
            .select(SPECIALISTS, &format!("service_ids=cs.{}", contains))
            .await?;
        for mut specialist in offering {
            specialist.service_ids.retain(|service_id| *service_id != id);
            let body = serde_json::json!({ "service_ids": specialist.service_ids });
            if let Err(e) = self
                .patch_rows::<Value>(SPECIALISTS, &format!("id=eq.{}", specialist.id), body)
                .await
            {
                warn!("Failed to detach service {} from specialist {}: {}", id, specialist.id, e);
            }
        }
        Ok(())
    }
}

// ==============================================================================
// SLOTS
// ==============================================================================

#[async_trait]
impl SlotRepository for SupabaseStore {
    async fn find_slot(&self, id: Uuid) -> StoreResult<Option<AvailableSlot>> {
        self.select_by_id(SLOTS, id).await
    }

    async fn list_slots(&self) -> StoreResult<Vec<AvailableSlot>> {
        self.select(SLOTS, "order=start_time.asc").await
    }

    async fn slot_exists(&self, id: Uuid) -> StoreResult<bool> {
        self.any_row(SLOTS, &format!("id=eq.{}", id)).await
    }

    async fn find_slots_by_specialist(&self, specialist_id: Uuid) -> StoreResult<Vec<AvailableSlot>> {
        self.select(
            SLOTS,
            &format!("specialist_id=eq.{}&order=start_time.asc", specialist_id),
        )
        .await
    }

    async fn find_unbooked_slots_by_specialist(&self, specialist_id: Uuid) -> StoreResult<Vec<AvailableSlot>> {
        self.select(
            SLOTS,
            &format!(
                "specialist_id=eq.{}&booked=is.false&order=start_time.asc",
                specialist_id
            ),
        )
        .await
    }

    async fn find_slots_starting_between(
        &self,
        specialist_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<AvailableSlot>> {
        self.select(
            SLOTS,
            &format!(
                "specialist_id=eq.{}&start_time=gte.{}&start_time=lte.{}&order=start_time.asc",
                specialist_id,
                encode_ts(from),
                encode_ts(to)
            ),
        )
        .await
    }

    async fn insert_slots(&self, slots: Vec<AvailableSlot>) -> StoreResult<Vec<AvailableSlot>> {
        if slots.is_empty() {
            return Ok(Vec::new());
        }
        let body = serde_json::to_value(&slots).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.insert_rows(SLOTS, body).await
    }

    async fn update_slot(&self, mut slot: AvailableSlot, expected_version: i64) -> StoreResult<AvailableSlot> {
        slot.version = expected_version + 1;
        let filter = format!("id=eq.{}&version=eq.{}", slot.id, expected_version);
        let rows: Vec<AvailableSlot> = self.patch_rows(SLOTS, &filter, to_row(&slot)?).await?;

        match rows.into_iter().next() {
            Some(updated) => Ok(updated),
            None if self.slot_exists(slot.id).await? => Err(StoreError::VersionConflict {
                entity: "AvailableSlot",
                id: slot.id.to_string(),
                expected: expected_version,
            }),
            None => Err(StoreError::not_found("AvailableSlot", slot.id)),
        }
    }

    async fn delete_slot(&self, id: Uuid) -> StoreResult<()> {
        self.delete_by_id(SLOTS, "AvailableSlot", id).await
    }

    async fn delete_slots(&self, ids: &[Uuid]) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let present: Vec<Value> = self
            .select(SLOTS, &format!("select=id&id=in.({})", id_list(ids)))
            .await?;
        if let Some(missing) = ids.iter().find(|id| {
            let id = id.to_string();
            !present
                .iter()
                .any(|row| row.get("id").and_then(Value::as_str) == Some(id.as_str()))
        }) {
            return Err(StoreError::not_found("AvailableSlot", *missing));
        }

        let path = format!("/rest/v1/{}?id=in.({})", SLOTS, id_list(ids));
        self.supabase.execute(Method::DELETE, &path, None, None).await?;
        Ok(())
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[async_trait]
impl AppointmentRepository for SupabaseStore {
    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        self.select_by_id(APPOINTMENTS, id).await
    }

    async fn list_appointments(&self) -> StoreResult<Vec<Appointment>> {
        self.select(APPOINTMENTS, "order=created_at.asc").await
    }

    async fn appointment_exists(&self, id: Uuid) -> StoreResult<bool> {
        self.any_row(APPOINTMENTS, &format!("id=eq.{}", id)).await
    }

    async fn find_appointments_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Appointment>> {
        self.select(
            APPOINTMENTS,
            &format!("user_id=eq.{}&order=created_at.asc", user_id),
        )
        .await
    }

    async fn find_appointments_by_status(&self, status: AppointmentStatus) -> StoreResult<Vec<Appointment>> {
        self.select(
            APPOINTMENTS,
            &format!("status=eq.{}&order=created_at.asc", status),
        )
        .await
    }

    async fn slot_has_appointment_in(&self, slot_id: Uuid, statuses: &[AppointmentStatus]) -> StoreResult<bool> {
        if statuses.is_empty() {
            return Ok(false);
        }
        self.any_row(
            APPOINTMENTS,
            &format!("slot_id=eq.{}&status=in.({})", slot_id, status_list(statuses)),
        )
        .await
    }

    async fn specialist_has_appointment_in(
        &self,
        specialist_id: Uuid,
        statuses: &[AppointmentStatus],
    ) -> StoreResult<bool> {
        if statuses.is_empty() {
            return Ok(false);
        }
        self.any_row(
            APPOINTMENTS,
            &format!(
                "specialist_id=eq.{}&status=in.({})",
                specialist_id,
                status_list(statuses)
            ),
        )
        .await
    }

    async fn service_has_appointment_in(&self, service_id: Uuid, statuses: &[AppointmentStatus]) -> StoreResult<bool> {
        if statuses.is_empty() {
            return Ok(false);
        }
        self.any_row(
            APPOINTMENTS,
            &format!("service_id=eq.{}&status=in.({})", service_id, status_list(statuses)),
        )
        .await
    }

    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        self.insert_one(APPOINTMENTS, &appointment).await
    }

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        self.update_by_id(APPOINTMENTS, "Appointment", appointment.id, &appointment)
            .await
    }

    async fn delete_appointment(&self, id: Uuid) -> StoreResult<()> {
        self.delete_by_id(APPOINTMENTS, "Appointment", id).await
    }
}
