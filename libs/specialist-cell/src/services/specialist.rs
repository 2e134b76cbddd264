use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{BookingStore, StoreError};
use shared_models::actor::Actor;
use shared_models::booking::{AppointmentStatus, Audit, Specialist};

use crate::models::{CreateSpecialistRequest, SpecialistError, SpecialistSearch, MIN_SPECIALIZATION_LENGTH};

pub struct SpecialistService {
    store: Arc<dyn BookingStore>,
}

impl SpecialistService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn create_specialist(
        &self,
        request: CreateSpecialistRequest,
        actor: &Actor,
    ) -> Result<Specialist, SpecialistError> {
        info!(
            "Creating specialist for user: {} with specialization: {}",
            request.user_id, request.specialization
        );
        let specialization = normalize_specialization(&request.specialization)?;

        if self.is_user_specialist(request.user_id).await? {
            return Err(SpecialistError::AlreadySpecialist(request.user_id));
        }
        self.ensure_user(request.user_id).await?;
        self.ensure_address(request.work_address_id).await?;

        let user_id = request.user_id;
        let specialist = Specialist {
            id: Uuid::new_v4(),
            user_id,
            specialization,
            work_address_id: request.work_address_id,
            accepting_appointments: true,
            service_ids: Vec::new(),
            audit: Audit::new(actor),
        };

        let saved = self.store.insert_specialist(specialist).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => SpecialistError::AlreadySpecialist(user_id),
            other => other.into(),
        })?;
        info!("Specialist created successfully with id: {}", saved.id);
        Ok(saved)
    }

    pub async fn get_specialist(&self, id: Uuid) -> Result<Specialist, SpecialistError> {
        debug!("Fetching specialist with id: {}", id);
        self.store
            .find_specialist(id)
            .await?
            .ok_or(SpecialistError::NotFound(id))
    }

    pub async fn list_specialists(&self) -> Result<Vec<Specialist>, SpecialistError> {
        debug!("Fetching all specialists");
        Ok(self.store.list_specialists().await?)
    }

    pub async fn list_active_specialists(&self) -> Result<Vec<Specialist>, SpecialistError> {
        debug!("Fetching active specialists");
        Ok(self.store.list_accepting_specialists().await?)
    }

    pub async fn get_specialist_by_user(&self, user_id: Uuid) -> Result<Specialist, SpecialistError> {
        debug!("Fetching specialist by user id: {}", user_id);
        self.store
            .find_specialist_by_user(user_id)
            .await?
            .ok_or(SpecialistError::NotFoundForUser(user_id))
    }

    pub async fn is_user_specialist(&self, user_id: Uuid) -> Result<bool, SpecialistError> {
        debug!("Checking if user: {} is already a specialist", user_id);
        Ok(self.store.specialist_exists_for_user(user_id).await?)
    }

    pub async fn search(&self, criteria: SpecialistSearch) -> Result<Vec<Specialist>, SpecialistError> {
        debug!("Searching specialists: {:?}", criteria);
        let specialization = criteria.specialization.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let city = criteria.city.as_deref().map(str::trim).filter(|c| !c.is_empty());

        let found = if let Some(fragment) = specialization {
            self.store.find_specialists_by_specialization(fragment).await?
        } else if let Some(city) = city {
            self.store.find_specialists_by_city(city).await?
        } else if let Some(service_id) = criteria.service_id {
            self.store.find_accepting_specialists_by_service(service_id).await?
        } else {
            self.store.list_accepting_specialists().await?
        };
        Ok(found)
    }

    pub async fn update_specialist(
        &self,
        id: Uuid,
        request: CreateSpecialistRequest,
        actor: &Actor,
    ) -> Result<Specialist, SpecialistError> {
        info!("Updating specialist with id: {}", id);
        let specialization = normalize_specialization(&request.specialization)?;
        let mut specialist = self.get_specialist(id).await?;

        if specialist.user_id != request.user_id && self.is_user_specialist(request.user_id).await? {
            return Err(SpecialistError::AlreadySpecialist(request.user_id));
        }
        self.ensure_user(request.user_id).await?;
        self.ensure_address(request.work_address_id).await?;

        specialist.user_id = request.user_id;
        specialist.specialization = specialization;
        specialist.work_address_id = request.work_address_id;
        specialist.audit.touch(actor);

        let updated = self.save(specialist).await?;
        info!("Specialist updated successfully with id: {}", updated.id);
        Ok(updated)
    }

    pub async fn update_specialization(
        &self,
        id: Uuid,
        specialization: &str,
        actor: &Actor,
    ) -> Result<Specialist, SpecialistError> {
        info!("Updating specialization for specialist: {} to: {}", id, specialization);
        let specialization = normalize_specialization(specialization)?;
        let mut specialist = self.get_specialist(id).await?;

        specialist.specialization = specialization;
        specialist.audit.touch(actor);
        self.save(specialist).await
    }

    /// `None` clears the work address.
    pub async fn update_work_address(
        &self,
        id: Uuid,
        address_id: Option<Uuid>,
        actor: &Actor,
    ) -> Result<Specialist, SpecialistError> {
        info!("Updating work address for specialist: {} to address: {:?}", id, address_id);
        let mut specialist = self.get_specialist(id).await?;
        self.ensure_address(address_id).await?;

        specialist.work_address_id = address_id;
        specialist.audit.touch(actor);
        self.save(specialist).await
    }

    pub async fn enable_appointments(&self, id: Uuid, actor: &Actor) -> Result<Specialist, SpecialistError> {
        info!("Enabling appointments for specialist: {}", id);
        let mut specialist = self.get_specialist(id).await?;
        if specialist.accepting_appointments {
            return Err(SpecialistError::AlreadyAccepting);
        }

        specialist.accepting_appointments = true;
        specialist.audit.touch(actor);
        self.save(specialist).await
    }

    pub async fn disable_appointments(&self, id: Uuid, actor: &Actor) -> Result<Specialist, SpecialistError> {
        info!("Disabling appointments for specialist: {}", id);
        let mut specialist = self.get_specialist(id).await?;
        if !specialist.accepting_appointments {
            return Err(SpecialistError::AlreadyNotAccepting);
        }

        specialist.accepting_appointments = false;
        specialist.audit.touch(actor);
        self.save(specialist).await
    }

    /// Idempotent: assigning an already offered service leaves the list unchanged.
    pub async fn assign_service(
        &self,
        id: Uuid,
        service_id: Uuid,
        actor: &Actor,
    ) -> Result<Specialist, SpecialistError> {
        info!("Assigning service: {} to specialist: {}", service_id, id);
        let mut specialist = self.get_specialist(id).await?;
        if !self.store.service_exists(service_id).await? {
            return Err(SpecialistError::ServiceNotFound(service_id));
        }
        if specialist.offers(service_id) {
            debug!("Specialist {} already offers service {}", id, service_id);
            return Ok(specialist);
        }

        specialist.service_ids.push(service_id);
        specialist.audit.touch(actor);
        self.save(specialist).await
    }

    pub async fn remove_service(
        &self,
        id: Uuid,
        service_id: Uuid,
        actor: &Actor,
    ) -> Result<Specialist, SpecialistError> {
        info!("Removing service: {} from specialist: {}", service_id, id);
        let mut specialist = self.get_specialist(id).await?;
        if !specialist.offers(service_id) {
            debug!("Specialist {} does not offer service {}", id, service_id);
            return Ok(specialist);
        }

        specialist.service_ids.retain(|s| *s != service_id);
        specialist.audit.touch(actor);
        self.save(specialist).await
    }

    /// Removes the specialist together with its slots.
    pub async fn delete_specialist(&self, id: Uuid) -> Result<(), SpecialistError> {
        info!("Deleting specialist with id: {}", id);
        if !self.store.specialist_exists(id).await? {
            return Err(SpecialistError::NotFound(id));
        }

        if self
            .store
            .specialist_has_appointment_in(id, &AppointmentStatus::ACTIVE)
            .await?
        {
            warn!("Refusing to delete specialist {} with active appointments", id);
            return Err(SpecialistError::HasActiveAppointments);
        }

        self.store.delete_specialist(id).await?;
        info!("Specialist deleted successfully: {}", id);
        Ok(())
    }

    async fn save(&self, specialist: Specialist) -> Result<Specialist, SpecialistError> {
        let user_id = specialist.user_id;
        self.store.update_specialist(specialist).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => SpecialistError::AlreadySpecialist(user_id),
            other => other.into(),
        })
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<(), SpecialistError> {
        if self.store.user_exists(user_id).await? {
            Ok(())
        } else {
            Err(SpecialistError::UserNotFound(user_id))
        }
    }

    async fn ensure_address(&self, address_id: Option<Uuid>) -> Result<(), SpecialistError> {
        match address_id {
            Some(id) if !self.store.address_exists(id).await? => Err(SpecialistError::AddressNotFound(id)),
            _ => Ok(()),
        }
    }
}

fn normalize_specialization(specialization: &str) -> Result<String, SpecialistError> {
    let trimmed = specialization.trim();
    if trimmed.is_empty() {
        return Err(SpecialistError::InvalidArgument(
            "Specialization cannot be empty".to_string(),
        ));
    }
    if trimmed.chars().count() < MIN_SPECIALIZATION_LENGTH {
        return Err(SpecialistError::InvalidArgument(
            "Specialization must be at least 2 characters long".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}
