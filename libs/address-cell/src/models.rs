use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::booking::Address;
use shared_models::error::{AppError, FieldErrors};
use shared_utils::validation::{is_valid_postal_code, Validate, Validator};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub building_number: Option<String>,
}

impl Validate for CreateAddressRequest {
    fn validate(&self) -> FieldErrors {
        Validator::new()
            .not_blank("country", &self.country, "Country is required")
            .length("country", &self.country, 2, 100, "Country must be between 2 and 100 characters")
            .not_blank("city", &self.city, "City is required")
            .length("city", &self.city, 2, 100, "City must be between 2 and 100 characters")
            .max_length("street", self.street.as_deref(), 200, "Street cannot exceed 200 characters")
            .optional_pattern(
                "postalCode",
                self.postal_code.as_deref(),
                is_valid_postal_code,
                "Postal code must be in format XX-XXX or empty",
            )
            .max_length(
                "buildingNumber",
                self.building_number.as_deref(),
                20,
                "Building number cannot exceed 20 characters",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressResponse {
    pub id: Uuid,
    pub country: String,
    pub city: String,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    pub building_number: Option<String>,
}

impl From<Address> for AddressResponse {
    fn from(address: Address) -> Self {
        Self {
            id: address.id,
            country: address.country,
            city: address.city,
            street: address.street,
            postal_code: address.postal_code,
            building_number: address.building_number,
        }
    }
}

#[derive(Debug, Error)]
pub enum AddressError {
    #[error("Address not found with id: {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AddressError> for AppError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::NotFound(_) => AppError::NotFound(err.to_string()),
            AddressError::Store(store) => store.into(),
        }
    }
}
