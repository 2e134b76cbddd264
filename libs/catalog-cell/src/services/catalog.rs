use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{BookingStore, StoreError};
use shared_models::actor::Actor;
use shared_models::booking::{AppointmentStatus, Audit, OfferedService};

use crate::models::{CatalogError, CreateServiceRequest, ServiceSearch, MIN_DURATION_MINUTES};

const NEGATIVE_PRICE: &str = "Price must be greater than or equal to 0";

/// Fields of a create/update request that passed the domain guards.
struct CheckedService {
    name: String,
    description: Option<String>,
    price: Decimal,
    duration_minutes: i32,
}

fn check_request(request: CreateServiceRequest) -> Result<CheckedService, CatalogError> {
    if request.name.trim().is_empty() {
        return Err(CatalogError::invalid("Service name cannot be empty"));
    }
    let price = match request.price {
        Some(price) if price >= Decimal::ZERO => price,
        _ => return Err(CatalogError::invalid(NEGATIVE_PRICE)),
    };
    let duration_minutes = match request.duration_minutes {
        Some(duration) if duration >= MIN_DURATION_MINUTES => duration,
        _ => return Err(CatalogError::invalid("Duration must be at least 15 minutes")),
    };

    Ok(CheckedService {
        name: request.name,
        description: request.description,
        price,
        duration_minutes,
    })
}

pub struct CatalogService {
    store: Arc<dyn BookingStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn create_service(
        &self,
        request: CreateServiceRequest,
        actor: &Actor,
    ) -> Result<OfferedService, CatalogError> {
        info!("Creating service with name: {}", request.name);
        let checked = check_request(request)?;

        if self.store.service_name_exists(&checked.name).await? {
            return Err(CatalogError::NameTaken(checked.name));
        }

        let service = OfferedService {
            id: Uuid::new_v4(),
            name: checked.name,
            description: checked.description,
            price: checked.price,
            duration_minutes: checked.duration_minutes,
            active: true,
            audit: Audit::new(actor),
        };

        let saved = self.save_new(service).await?;
        info!("Service created successfully with id: {}", saved.id);
        Ok(saved)
    }

    pub async fn get_service(&self, id: Uuid) -> Result<OfferedService, CatalogError> {
        debug!("Fetching service with id: {}", id);
        self.store.find_service(id).await?.ok_or(CatalogError::NotFound(id))
    }

    pub async fn list_services(&self) -> Result<Vec<OfferedService>, CatalogError> {
        debug!("Fetching all services");
        Ok(self.store.list_services().await?)
    }

    pub async fn list_active_services(&self) -> Result<Vec<OfferedService>, CatalogError> {
        debug!("Fetching active services");
        Ok(self.store.list_active_services().await?)
    }

    /// Active services the specialist offers.
    pub async fn list_services_by_specialist(&self, specialist_id: Uuid) -> Result<Vec<OfferedService>, CatalogError> {
        debug!("Fetching services for specialist: {}", specialist_id);
        let specialist = self
            .store
            .find_specialist(specialist_id)
            .await?
            .ok_or(CatalogError::SpecialistNotFound(specialist_id))?;
        Ok(self.store.find_active_services_by_ids(&specialist.service_ids).await?)
    }

    pub async fn update_service(
        &self,
        id: Uuid,
        request: CreateServiceRequest,
        actor: &Actor,
    ) -> Result<OfferedService, CatalogError> {
        info!("Updating service with id: {}", id);
        let checked = check_request(request)?;
        let mut service = self.get_service(id).await?;

        if service.name != checked.name && self.store.service_name_exists(&checked.name).await? {
            return Err(CatalogError::NameTaken(checked.name));
        }

        service.name = checked.name;
        service.description = checked.description;
        service.price = checked.price;
        service.duration_minutes = checked.duration_minutes;
        service.audit.touch(actor);

        let updated = self.save(service).await?;
        info!("Service updated successfully with id: {}", updated.id);
        Ok(updated)
    }

    pub async fn update_service_price(
        &self,
        id: Uuid,
        new_price: Decimal,
        actor: &Actor,
    ) -> Result<OfferedService, CatalogError> {
        info!("Updating price for service: {} to: {}", id, new_price);
        if new_price < Decimal::ZERO {
            return Err(CatalogError::invalid(NEGATIVE_PRICE));
        }
        let mut service = self.get_service(id).await?;

        let old_price = service.price;
        service.price = new_price;
        service.audit.touch(actor);

        let updated = self.save(service).await?;
        info!("Service price updated from {} to {} for id: {}", old_price, new_price, id);
        Ok(updated)
    }

    pub async fn activate_service(&self, id: Uuid, actor: &Actor) -> Result<OfferedService, CatalogError> {
        info!("Activating service with id: {}", id);
        let mut service = self.get_service(id).await?;
        if service.active {
            return Err(CatalogError::AlreadyActive);
        }

        service.active = true;
        service.audit.touch(actor);
        self.save(service).await
    }

    pub async fn deactivate_service(&self, id: Uuid, actor: &Actor) -> Result<OfferedService, CatalogError> {
        info!("Deactivating service with id: {}", id);
        let mut service = self.get_service(id).await?;
        if !service.active {
            return Err(CatalogError::AlreadyInactive);
        }

        service.active = false;
        service.audit.touch(actor);
        self.save(service).await
    }

    /// Also detaches the service from every specialist offering it.
    pub async fn delete_service(&self, id: Uuid) -> Result<(), CatalogError> {
        info!("Deleting service with id: {}", id);
        if !self.store.service_exists(id).await? {
            return Err(CatalogError::NotFound(id));
        }

        if self
            .store
            .service_has_appointment_in(id, &AppointmentStatus::ACTIVE)
            .await?
        {
            warn!("Refusing to delete service {} with active appointments", id);
            return Err(CatalogError::HasActiveAppointments);
        }

        self.store.delete_service(id).await?;
        info!("Service deleted successfully: {}", id);
        Ok(())
    }

    pub async fn exists_by_name(&self, name: &str) -> Result<bool, CatalogError> {
        debug!("Checking if service exists with name: {}", name);
        Ok(self.store.service_name_exists(name).await?)
    }

    pub async fn search(&self, criteria: ServiceSearch) -> Result<Vec<OfferedService>, CatalogError> {
        debug!("Searching services: {:?}", criteria);
        match criteria {
            ServiceSearch {
                min_price: Some(min),
                max_price: Some(max),
                ..
            } => self.services_by_price_range(min, max).await,
            ServiceSearch {
                duration: Some(duration),
                ..
            } => self.services_by_duration(duration).await,
            _ => self.list_active_services().await,
        }
    }

    /// Active services priced within `[min_price, max_price]`.
    pub async fn services_by_price_range(
        &self,
        min_price: Decimal,
        max_price: Decimal,
    ) -> Result<Vec<OfferedService>, CatalogError> {
        debug!("Fetching services with price between {} and {}", min_price, max_price);
        if min_price > max_price {
            return Err(CatalogError::invalid(
                "Minimum price cannot be greater than maximum price",
            ));
        }
        Ok(self
            .store
            .find_active_services_by_price_range(min_price, max_price)
            .await?)
    }

    pub async fn services_by_duration(&self, duration_minutes: i32) -> Result<Vec<OfferedService>, CatalogError> {
        debug!("Fetching services with duration: {} minutes", duration_minutes);
        if duration_minutes <= 0 {
            return Err(CatalogError::invalid("Duration must be positive"));
        }
        Ok(self.store.find_active_services_by_duration(duration_minutes).await?)
    }

    async fn save_new(&self, service: OfferedService) -> Result<OfferedService, CatalogError> {
        let name = service.name.clone();
        self.store.insert_service(service).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => CatalogError::NameTaken(name),
            other => other.into(),
        })
    }

    async fn save(&self, service: OfferedService) -> Result<OfferedService, CatalogError> {
        let name = service.name.clone();
        self.store.update_service(service).await.map_err(|e| match e {
            StoreError::UniqueViolation(_) => CatalogError::NameTaken(name),
            other => other.into(),
        })
    }
}
