use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_database::{BookingStore, StoreError};
use shared_models::actor::Actor;
use shared_models::booking::{Appointment, AppointmentStatus, Audit};
use slot_cell::{SlotError, SlotService};

use crate::models::{AppointmentError, CreateAppointmentRequest};
use crate::services::lifecycle::AppointmentLifecycleService;

/// Appointment Lifecycle Engine.
///
/// Availability is decided by appointment status alone: a slot is taken
/// while an appointment on it is BOOKED or CONFIRMED. The slot's booked flag
/// is kept in step on booking, cancellation and deletion.
pub struct AppointmentService {
    store: Arc<dyn BookingStore>,
    slots: Arc<SlotService>,
    lifecycle: AppointmentLifecycleService,
}

impl AppointmentService {
    pub fn new(store: Arc<dyn BookingStore>, slots: Arc<SlotService>) -> Self {
        Self {
            store,
            slots,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    pub async fn create_appointment(
        &self,
        request: CreateAppointmentRequest,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        info!(
            "Creating appointment for user: {}, slot: {}, service: {}",
            request.user_id, request.slot_id, request.service_id
        );

        if self.slot_is_claimed(request.slot_id).await? {
            warn!("Slot {} already has an active appointment", request.slot_id);
            return Err(AppointmentError::SlotNotAvailable(request.slot_id));
        }

        if !self.store.user_exists(request.user_id).await? {
            return Err(AppointmentError::UserNotFound(request.user_id));
        }
        let slot = self
            .store
            .find_slot(request.slot_id)
            .await?
            .ok_or(AppointmentError::SlotNotFound(request.slot_id))?;
        if !self.store.service_exists(request.service_id).await? {
            return Err(AppointmentError::ServiceNotFound(request.service_id));
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            slot_id: slot.id,
            service_id: request.service_id,
            specialist_id: slot.specialist_id,
            status: AppointmentStatus::Booked,
            notes: request.notes,
            audit: Audit::new(actor),
        };

        let saved = self
            .store
            .insert_appointment(appointment)
            .await
            .map_err(|e| match e {
                StoreError::UniqueViolation(_) => AppointmentError::SlotNotAvailable(slot.id),
                other => other.into(),
            })?;

        if let Err(err) = self.slots.set_booked_flag(slot.id, true, actor).await {
            warn!("Could not mark slot {} as booked, rolling back appointment {}", slot.id, saved.id);
            if let Err(cleanup) = self.store.delete_appointment(saved.id).await {
                error!("Failed to roll back appointment {}: {}", saved.id, cleanup);
            }
            return Err(err.into());
        }

        info!("Appointment created successfully with id: {}", saved.id);
        Ok(saved)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        debug!("Fetching appointment with id: {}", id);
        self.store
            .find_appointment(id)
            .await?
            .ok_or(AppointmentError::NotFound(id))
    }

    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching all appointments");
        Ok(self.store.list_appointments().await?)
    }

    pub async fn appointments_by_user(&self, user_id: Uuid) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching appointments for user: {}", user_id);
        if !self.store.user_exists(user_id).await? {
            return Err(AppointmentError::UserNotFound(user_id));
        }
        Ok(self.store.find_appointments_by_user(user_id).await?)
    }

    pub async fn appointments_by_status(
        &self,
        status: AppointmentStatus,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        debug!("Fetching appointments with status: {}", status);
        Ok(self.store.find_appointments_by_status(status).await?)
    }

    /// Generic status setter. Every change goes through the transition
    /// table except a move to CANCELLED, which takes the cancellation path
    /// so the slot is released.
    pub async fn update_appointment_status(
        &self,
        id: Uuid,
        new_status: AppointmentStatus,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        info!("Updating appointment status: {} to {}", id, new_status);
        if new_status == AppointmentStatus::Cancelled {
            return self.cancel_appointment(id, actor).await;
        }
        self.transition(id, new_status, actor).await
    }

    pub async fn confirm_appointment(&self, id: Uuid, actor: &Actor) -> Result<Appointment, AppointmentError> {
        info!("Confirming appointment: {}", id);
        self.transition(id, AppointmentStatus::Confirmed, actor).await
    }

    pub async fn start_appointment(&self, id: Uuid, actor: &Actor) -> Result<Appointment, AppointmentError> {
        info!("Starting appointment: {}", id);
        self.transition(id, AppointmentStatus::InProgress, actor).await
    }

    pub async fn complete_appointment(&self, id: Uuid, actor: &Actor) -> Result<Appointment, AppointmentError> {
        info!("Completing appointment: {}", id);
        self.transition(id, AppointmentStatus::Completed, actor).await
    }

    pub async fn mark_no_show(&self, id: Uuid, actor: &Actor) -> Result<Appointment, AppointmentError> {
        info!("Marking appointment as no-show: {}", id);
        self.transition(id, AppointmentStatus::NoShow, actor).await
    }

    pub async fn update_appointment_notes(
        &self,
        id: Uuid,
        notes: Option<String>,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        info!("Updating notes for appointment: {}", id);
        let mut appointment = self.get_appointment(id).await?;
        appointment.notes = notes;
        appointment.audit.touch(actor);

        let updated = self.store.update_appointment(appointment).await?;
        info!("Appointment notes updated successfully: {}", id);
        Ok(updated)
    }

    /// Only CANCELLED and COMPLETED appointments refuse cancellation; every
    /// other status, NO_SHOW included, moves to CANCELLED. The slot is
    /// released before the status is written, so a failed release leaves the
    /// appointment untouched.
    pub async fn cancel_appointment(&self, id: Uuid, actor: &Actor) -> Result<Appointment, AppointmentError> {
        info!("Cancelling appointment: {}", id);
        let mut appointment = self.get_appointment(id).await?;

        match appointment.status {
            AppointmentStatus::Cancelled => return Err(AppointmentError::AlreadyCancelled),
            AppointmentStatus::Completed => return Err(AppointmentError::CannotCancelCompleted),
            _ => {}
        }

        self.release_slot(appointment.slot_id, actor).await?;

        let previous = appointment.status;
        appointment.status = AppointmentStatus::Cancelled;
        appointment.audit.touch(actor);
        let cancelled = self.store.update_appointment(appointment).await?;

        info!("Appointment {} cancelled from {}", id, previous);
        Ok(cancelled)
    }

    /// Deleting an active appointment also releases its slot.
    pub async fn delete_appointment(&self, id: Uuid, actor: &Actor) -> Result<(), AppointmentError> {
        info!("Deleting appointment with id: {}", id);
        let appointment = self.get_appointment(id).await?;

        self.store.delete_appointment(id).await?;
        if appointment.status.is_active() {
            self.release_slot(appointment.slot_id, actor).await?;
        }
        info!("Appointment deleted successfully with id: {}", id);
        Ok(())
    }

    /// True iff the slot exists and no BOOKED/CONFIRMED appointment holds it.
    pub async fn is_slot_available(&self, slot_id: Uuid) -> Result<bool, AppointmentError> {
        info!("Checking availability for slot: {}", slot_id);
        if !self.store.slot_exists(slot_id).await? {
            return Ok(false);
        }
        Ok(!self.slot_is_claimed(slot_id).await?)
    }

    async fn slot_is_claimed(&self, slot_id: Uuid) -> Result<bool, AppointmentError> {
        Ok(self
            .store
            .slot_has_appointment_in(slot_id, &AppointmentStatus::ACTIVE)
            .await?)
    }

    async fn transition(
        &self,
        id: Uuid,
        new_status: AppointmentStatus,
        actor: &Actor,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointment = self.get_appointment(id).await?;
        self.lifecycle
            .validate_status_transition(&appointment.status, &new_status)?;

        let previous = appointment.status;
        appointment.status = new_status;
        appointment.audit.touch(actor);

        let updated = self.store.update_appointment(appointment).await?;
        info!("Appointment {} moved from {} to {}", id, previous, new_status);
        Ok(updated)
    }

    /// A slot removed together with its specialist has nothing to release.
    async fn release_slot(&self, slot_id: Uuid, actor: &Actor) -> Result<(), AppointmentError> {
        match self.slots.set_booked_flag(slot_id, false, actor).await {
            Ok(_) => Ok(()),
            Err(SlotError::NotFound(_)) => {
                warn!("Slot {} no longer exists, nothing to release", slot_id);
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
