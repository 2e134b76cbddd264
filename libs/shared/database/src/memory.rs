//! Process-local store used for development and tests.
//!
//! All maps live behind one lock so that multi-entity checks (unique active
//! appointment per slot, cascading deletes) are atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::booking::{
    Address, Appointment, AppointmentStatus, AvailableSlot, OfferedService, Specialist, User,
};

use crate::repository::{
    AddressRepository, AppointmentRepository, OfferedServiceRepository, SlotRepository,
    SpecialistRepository, StoreError, StoreResult, UserRepository,
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    addresses: HashMap<Uuid, Address>,
    specialists: HashMap<Uuid, Specialist>,
    services: HashMap<Uuid, OfferedService>,
    slots: HashMap<Uuid, AvailableSlot>,
    appointments: HashMap<Uuid, Appointment>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_created<T, F>(mut rows: Vec<T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    rows.sort_by_key(|row| key(row));
    rows
}

fn sorted_slots(mut slots: Vec<AvailableSlot>) -> Vec<AvailableSlot> {
    slots.sort_by_key(|slot| slot.start_time);
    slots
}

/// Same effect as `ON DELETE CASCADE` on the appointment foreign keys.
fn drop_appointments<F>(state: &mut MemoryState, referencing: F) -> usize
where
    F: Fn(&Appointment) -> bool,
{
    let before = state.appointments.len();
    state.appointments.retain(|_, appointment| !referencing(appointment));
    before - state.appointments.len()
}

/// Removes a specialist's slots and every appointment held with them.
fn drop_specialist_rows(state: &mut MemoryState, specialist_id: Uuid) {
    let before = state.slots.len();
    state.slots.retain(|_, slot| slot.specialist_id != specialist_id);
    let slots = before - state.slots.len();
    let appointments = drop_appointments(state, |a| a.specialist_id == specialist_id);
    debug!(
        "Removed {} slots and {} appointments with specialist {}",
        slots, appointments, specialist_id
    );
}

// ==============================================================================
// USERS
// ==============================================================================

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(sorted_by_created(state.users.values().cloned().collect(), |u| u.audit.created_at))
    }

    async fn user_exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.read().await.users.contains_key(&id))
    }

    async fn user_email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.state.read().await.users.values().any(|u| u.email == email))
    }

    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation(format!("users.email = {}", user.email)));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, user: User) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user.id) {
            return Err(StoreError::not_found("User", user.id));
        }
        if state.users.values().any(|u| u.id != user.id && u.email == user.email) {
            return Err(StoreError::UniqueViolation(format!("users.email = {}", user.email)));
        }
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Err(StoreError::not_found("User", id));
        }
        let owned: Vec<Uuid> = state
            .specialists
            .values()
            .filter(|s| s.user_id == id)
            .map(|s| s.id)
            .collect();
        for specialist_id in owned {
            state.specialists.remove(&specialist_id);
            drop_specialist_rows(&mut state, specialist_id);
        }
        let removed = drop_appointments(&mut state, |a| a.user_id == id);
        debug!("Removed {} appointments of user {}", removed, id);
        Ok(())
    }
}

// ==============================================================================
// ADDRESSES
// ==============================================================================

#[async_trait]
impl AddressRepository for InMemoryStore {
    async fn find_address(&self, id: Uuid) -> StoreResult<Option<Address>> {
        Ok(self.state.read().await.addresses.get(&id).cloned())
    }

    async fn list_addresses(&self) -> StoreResult<Vec<Address>> {
        let state = self.state.read().await;
        Ok(sorted_by_created(state.addresses.values().cloned().collect(), |a| a.audit.created_at))
    }

    async fn address_exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.read().await.addresses.contains_key(&id))
    }

    async fn insert_address(&self, address: Address) -> StoreResult<Address> {
        let mut state = self.state.write().await;
        state.addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn update_address(&self, address: Address) -> StoreResult<Address> {
        let mut state = self.state.write().await;
        if !state.addresses.contains_key(&address.id) {
            return Err(StoreError::not_found("Address", address.id));
        }
        state.addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn delete_address(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.addresses.remove(&id).is_none() {
            return Err(StoreError::not_found("Address", id));
        }
        for specialist in state.specialists.values_mut() {
            if specialist.work_address_id == Some(id) {
                specialist.work_address_id = None;
            }
        }
        Ok(())
    }
}

// ==============================================================================
// SPECIALISTS
// ==============================================================================

#[async_trait]
impl SpecialistRepository for InMemoryStore {
    async fn find_specialist(&self, id: Uuid) -> StoreResult<Option<Specialist>> {
        Ok(self.state.read().await.specialists.get(&id).cloned())
    }

    async fn list_specialists(&self) -> StoreResult<Vec<Specialist>> {
        let state = self.state.read().await;
        Ok(sorted_by_created(state.specialists.values().cloned().collect(), |s| s.audit.created_at))
    }

    async fn specialist_exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.read().await.specialists.contains_key(&id))
    }

    async fn find_specialist_by_user(&self, user_id: Uuid) -> StoreResult<Option<Specialist>> {
        let state = self.state.read().await;
        Ok(state.specialists.values().find(|s| s.user_id == user_id).cloned())
    }

    async fn specialist_exists_for_user(&self, user_id: Uuid) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state.specialists.values().any(|s| s.user_id == user_id))
    }

    async fn list_accepting_specialists(&self) -> StoreResult<Vec<Specialist>> {
        let state = self.state.read().await;
        let rows: Vec<Specialist> = state
            .specialists
            .values()
            .filter(|s| s.accepting_appointments)
            .cloned()
            .collect();
        Ok(sorted_by_created(rows, |s| s.audit.created_at))
    }

    async fn find_specialists_by_specialization(&self, fragment: &str) -> StoreResult<Vec<Specialist>> {
        let needle = fragment.to_lowercase();
        let state = self.state.read().await;
        let rows: Vec<Specialist> = state
            .specialists
            .values()
            .filter(|s| s.specialization.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        Ok(sorted_by_created(rows, |s| s.audit.created_at))
    }

    async fn find_specialists_by_city(&self, city: &str) -> StoreResult<Vec<Specialist>> {
        let state = self.state.read().await;
        let rows: Vec<Specialist> = state
            .specialists
            .values()
            .filter(|s| {
                s.work_address_id
                    .and_then(|address_id| state.addresses.get(&address_id))
                    .is_some_and(|address| address.city == city)
            })
            .cloned()
            .collect();
        Ok(sorted_by_created(rows, |s| s.audit.created_at))
    }

    async fn find_accepting_specialists_by_service(&self, service_id: Uuid) -> StoreResult<Vec<Specialist>> {
        let state = self.state.read().await;
        let rows: Vec<Specialist> = state
            .specialists
            .values()
            .filter(|s| s.accepting_appointments && s.offers(service_id))
            .cloned()
            .collect();
        Ok(sorted_by_created(rows, |s| s.audit.created_at))
    }

    async fn insert_specialist(&self, specialist: Specialist) -> StoreResult<Specialist> {
        let mut state = self.state.write().await;
        if state.specialists.values().any(|s| s.user_id == specialist.user_id) {
            return Err(StoreError::UniqueViolation(format!(
                "specialists.user_id = {}",
                specialist.user_id
            )));
        }
        state.specialists.insert(specialist.id, specialist.clone());
        Ok(specialist)
    }

    async fn update_specialist(&self, specialist: Specialist) -> StoreResult<Specialist> {
        let mut state = self.state.write().await;
        if !state.specialists.contains_key(&specialist.id) {
            return Err(StoreError::not_found("Specialist", specialist.id));
        }
        if state
            .specialists
            .values()
            .any(|s| s.id != specialist.id && s.user_id == specialist.user_id)
        {
            return Err(StoreError::UniqueViolation(format!(
                "specialists.user_id = {}",
                specialist.user_id
            )));
        }
        state.specialists.insert(specialist.id, specialist.clone());
        Ok(specialist)
    }

    async fn delete_specialist(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.specialists.remove(&id).is_none() {
            return Err(StoreError::not_found("Specialist", id));
        }
        drop_specialist_rows(&mut state, id);
        Ok(())
    }
}

// ==============================================================================
// OFFERED SERVICES
// ==============================================================================

#[async_trait]
impl OfferedServiceRepository for InMemoryStore {
    async fn find_service(&self, id: Uuid) -> StoreResult<Option<OfferedService>> {
        Ok(self.state.read().await.services.get(&id).cloned())
    }

    async fn list_services(&self) -> StoreResult<Vec<OfferedService>> {
        let state = self.state.read().await;
        Ok(sorted_by_created(state.services.values().cloned().collect(), |s| s.audit.created_at))
    }

    async fn service_exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.read().await.services.contains_key(&id))
    }

    async fn service_name_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.state.read().await.services.values().any(|s| s.name == name))
    }

    async fn list_active_services(&self) -> StoreResult<Vec<OfferedService>> {
        let state = self.state.read().await;
        let rows: Vec<OfferedService> = state.services.values().filter(|s| s.active).cloned().collect();
        Ok(sorted_by_created(rows, |s| s.audit.created_at))
    }

    async fn find_active_services_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<OfferedService>> {
        let state = self.state.read().await;
        let rows: Vec<OfferedService> = ids
            .iter()
            .filter_map(|id| state.services.get(id))
            .filter(|s| s.active)
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn find_active_services_by_price_range(
        &self,
        min: Decimal,
        max: Decimal,
    ) -> StoreResult<Vec<OfferedService>> {
        let state = self.state.read().await;
        let rows: Vec<OfferedService> = state
            .services
            .values()
            .filter(|s| s.active && s.price >= min && s.price <= max)
            .cloned()
            .collect();
        Ok(sorted_by_created(rows, |s| s.audit.created_at))
    }

    async fn find_active_services_by_duration(&self, duration_minutes: i32) -> StoreResult<Vec<OfferedService>> {
        let state = self.state.read().await;
        let rows: Vec<OfferedService> = state
            .services
            .values()
            .filter(|s| s.active && s.duration_minutes == duration_minutes)
            .cloned()
            .collect();
        Ok(sorted_by_created(rows, |s| s.audit.created_at))
    }

    async fn insert_service(&self, service: OfferedService) -> StoreResult<OfferedService> {
        let mut state = self.state.write().await;
        if state.services.values().any(|s| s.name == service.name) {
            return Err(StoreError::UniqueViolation(format!("services.name = {}", service.name)));
        }
        state.services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn update_service(&self, service: OfferedService) -> StoreResult<OfferedService> {
        let mut state = self.state.write().await;
        if !state.services.contains_key(&service.id) {
            return Err(StoreError::not_found("Service", service.id));
        }
        if state
            .services
            .values()
            .any(|s| s.id != service.id && s.name == service.name)
        {
            return Err(StoreError::UniqueViolation(format!("services.name = {}", service.name)));
        }
        state.services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn delete_service(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.services.remove(&id).is_none() {
            return Err(StoreError::not_found("Service", id));
        }
        for specialist in state.specialists.values_mut() {
            specialist.service_ids.retain(|service_id| *service_id != id);
        }
        let removed = drop_appointments(&mut state, |a| a.service_id == id);
        debug!("Removed {} appointments for service {}", removed, id);
        Ok(())
    }
}

// ==============================================================================
// SLOTS
// ==============================================================================

#[async_trait]
impl SlotRepository for InMemoryStore {
    async fn find_slot(&self, id: Uuid) -> StoreResult<Option<AvailableSlot>> {
        Ok(self.state.read().await.slots.get(&id).cloned())
    }

    async fn list_slots(&self) -> StoreResult<Vec<AvailableSlot>> {
        let state = self.state.read().await;
        Ok(sorted_slots(state.slots.values().cloned().collect()))
    }

    async fn slot_exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.read().await.slots.contains_key(&id))
    }

    async fn find_slots_by_specialist(&self, specialist_id: Uuid) -> StoreResult<Vec<AvailableSlot>> {
        let state = self.state.read().await;
        let rows: Vec<AvailableSlot> = state
            .slots
            .values()
            .filter(|s| s.specialist_id == specialist_id)
            .cloned()
            .collect();
        Ok(sorted_slots(rows))
    }

    async fn find_unbooked_slots_by_specialist(&self, specialist_id: Uuid) -> StoreResult<Vec<AvailableSlot>> {
        let state = self.state.read().await;
        let rows: Vec<AvailableSlot> = state
            .slots
            .values()
            .filter(|s| s.specialist_id == specialist_id && !s.booked)
            .cloned()
            .collect();
        Ok(sorted_slots(rows))
    }

    async fn find_slots_starting_between(
        &self,
        specialist_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> StoreResult<Vec<AvailableSlot>> {
        let state = self.state.read().await;
        let rows: Vec<AvailableSlot> = state
            .slots
            .values()
            .filter(|s| s.specialist_id == specialist_id && s.start_time >= from && s.start_time <= to)
            .cloned()
            .collect();
        Ok(sorted_slots(rows))
    }

    async fn insert_slots(&self, slots: Vec<AvailableSlot>) -> StoreResult<Vec<AvailableSlot>> {
        let mut state = self.state.write().await;
        for (index, slot) in slots.iter().enumerate() {
            let clashes_stored = state
                .slots
                .values()
                .any(|s| s.specialist_id == slot.specialist_id && s.start_time == slot.start_time);
            let clashes_batch = slots[..index]
                .iter()
                .any(|s| s.specialist_id == slot.specialist_id && s.start_time == slot.start_time);
            if clashes_stored || clashes_batch {
                return Err(StoreError::UniqueViolation(format!(
                    "slots(specialist_id, start_time) = ({}, {})",
                    slot.specialist_id, slot.start_time
                )));
            }
        }
        for slot in &slots {
            state.slots.insert(slot.id, slot.clone());
        }
        Ok(slots)
    }

    async fn update_slot(&self, mut slot: AvailableSlot, expected_version: i64) -> StoreResult<AvailableSlot> {
        let mut state = self.state.write().await;
        let stored_version = state
            .slots
            .get(&slot.id)
            .map(|stored| stored.version)
            .ok_or_else(|| StoreError::not_found("AvailableSlot", slot.id))?;
        if stored_version != expected_version {
            return Err(StoreError::VersionConflict {
                entity: "AvailableSlot",
                id: slot.id.to_string(),
                expected: expected_version,
            });
        }
        if state.slots.values().any(|s| {
            s.id != slot.id && s.specialist_id == slot.specialist_id && s.start_time == slot.start_time
        }) {
            return Err(StoreError::UniqueViolation(format!(
                "slots(specialist_id, start_time) = ({}, {})",
                slot.specialist_id, slot.start_time
            )));
        }
        slot.version = expected_version + 1;
        state.slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    async fn delete_slot(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if state.slots.remove(&id).is_none() {
            return Err(StoreError::not_found("AvailableSlot", id));
        }
        drop_appointments(&mut state, |a| a.slot_id == id);
        Ok(())
    }

    async fn delete_slots(&self, ids: &[Uuid]) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(missing) = ids.iter().find(|id| !state.slots.contains_key(id)) {
            return Err(StoreError::not_found("AvailableSlot", *missing));
        }
        for id in ids {
            state.slots.remove(id);
        }
        drop_appointments(&mut state, |a| ids.contains(&a.slot_id));
        Ok(())
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

fn active_claim_exists(state: &MemoryState, appointment: &Appointment) -> bool {
    appointment.status.is_active()
        && state.appointments.values().any(|a| {
            a.id != appointment.id && a.slot_id == appointment.slot_id && a.status.is_active()
        })
}

#[async_trait]
impl AppointmentRepository for InMemoryStore {
    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(self.state.read().await.appointments.get(&id).cloned())
    }

    async fn list_appointments(&self) -> StoreResult<Vec<Appointment>> {
        let state = self.state.read().await;
        Ok(sorted_by_created(state.appointments.values().cloned().collect(), |a| a.audit.created_at))
    }

    async fn appointment_exists(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.state.read().await.appointments.contains_key(&id))
    }

    async fn find_appointments_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Appointment>> {
        let state = self.state.read().await;
        let rows: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_by_created(rows, |a| a.audit.created_at))
    }

    async fn find_appointments_by_status(&self, status: AppointmentStatus) -> StoreResult<Vec<Appointment>> {
        let state = self.state.read().await;
        let rows: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| a.status == status)
            .cloned()
            .collect();
        Ok(sorted_by_created(rows, |a| a.audit.created_at))
    }

    async fn slot_has_appointment_in(&self, slot_id: Uuid, statuses: &[AppointmentStatus]) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .appointments
            .values()
            .any(|a| a.slot_id == slot_id && statuses.contains(&a.status)))
    }

    async fn specialist_has_appointment_in(
        &self,
        specialist_id: Uuid,
        statuses: &[AppointmentStatus],
    ) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .appointments
            .values()
            .any(|a| a.specialist_id == specialist_id && statuses.contains(&a.status)))
    }

    async fn service_has_appointment_in(&self, service_id: Uuid, statuses: &[AppointmentStatus]) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .appointments
            .values()
            .any(|a| a.service_id == service_id && statuses.contains(&a.status)))
    }

    async fn insert_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let mut state = self.state.write().await;
        if active_claim_exists(&state, &appointment) {
            return Err(StoreError::UniqueViolation(format!(
                "appointments(slot_id) active = {}",
                appointment.slot_id
            )));
        }
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let mut state = self.state.write().await;
        if !state.appointments.contains_key(&appointment.id) {
            return Err(StoreError::not_found("Appointment", appointment.id));
        }
        if active_claim_exists(&state, &appointment) {
            return Err(StoreError::UniqueViolation(format!(
                "appointments(slot_id) active = {}",
                appointment.slot_id
            )));
        }
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn delete_appointment(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state
            .appointments
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found("Appointment", id))
    }
}
