use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_database::BookingStore;
use shared_models::actor::Actor;
use shared_models::booking::{Address, Audit};

use crate::models::{AddressError, CreateAddressRequest};

pub struct AddressService {
    store: Arc<dyn BookingStore>,
}

impl AddressService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn create_address(
        &self,
        request: CreateAddressRequest,
        actor: &Actor,
    ) -> Result<Address, AddressError> {
        info!("Creating address for country: {} and city: {}", request.country, request.city);

        let address = Address {
            id: Uuid::new_v4(),
            country: request.country,
            city: request.city,
            street: request.street,
            postal_code: request.postal_code,
            building_number: request.building_number,
            audit: Audit::new(actor),
        };

        let saved = self.store.insert_address(address).await?;
        info!("Address created with id: {}", saved.id);
        Ok(saved)
    }

    pub async fn get_address(&self, id: Uuid) -> Result<Address, AddressError> {
        debug!("Fetching address with id: {}", id);
        self.store.find_address(id).await?.ok_or(AddressError::NotFound(id))
    }

    pub async fn list_addresses(&self) -> Result<Vec<Address>, AddressError> {
        Ok(self.store.list_addresses().await?)
    }

    pub async fn update_address(
        &self,
        id: Uuid,
        request: CreateAddressRequest,
        actor: &Actor,
    ) -> Result<Address, AddressError> {
        info!("Updating address with id: {}", id);
        let mut address = self.get_address(id).await?;

        address.country = request.country;
        address.city = request.city;
        address.street = request.street;
        address.postal_code = request.postal_code;
        address.building_number = request.building_number;
        address.audit.touch(actor);

        Ok(self.store.update_address(address).await?)
    }

    /// Specialists working at the address lose their work address.
    pub async fn delete_address(&self, id: Uuid) -> Result<(), AddressError> {
        info!("Deleting address with id: {}", id);
        if !self.store.address_exists(id).await? {
            return Err(AddressError::NotFound(id));
        }
        self.store.delete_address(id).await?;
        Ok(())
    }
}
