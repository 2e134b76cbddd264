use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::booking::OfferedService;
use shared_models::error::{AppError, FieldErrors};
use shared_utils::validation::{Validate, Validator};

pub const MIN_DURATION_MINUTES: i32 = 15;
pub const MAX_DURATION_MINUTES: i32 = 480;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub duration_minutes: Option<i32>,
}

impl Validate for CreateServiceRequest {
    fn validate(&self) -> FieldErrors {
        let mut validator = Validator::new();
        validator
            .not_blank("name", &self.name, "Service name is required")
            .length("name", &self.name, 2, 100, "Service name must be between 2 and 100 characters")
            .max_length("description", self.description.as_deref(), 500, "Description cannot exceed 500 characters");

        match self.price {
            None => {
                validator.check("price", false, "Price is required");
            }
            Some(price) => {
                validator
                    .check("price", price >= Decimal::ZERO, "Price must be greater than or equal to 0")
                    .decimal_digits(
                        "price",
                        price,
                        8,
                        2,
                        "Price must have at most 8 digits before decimal and 2 after",
                    );
            }
        }

        match self.duration_minutes {
            None => {
                validator.check("durationMinutes", false, "Duration is required");
            }
            Some(duration) => {
                validator
                    .check(
                        "durationMinutes",
                        duration >= MIN_DURATION_MINUTES,
                        "Duration must be at least 15 minutes",
                    )
                    .check(
                        "durationMinutes",
                        duration <= MAX_DURATION_MINUTES,
                        "Duration cannot exceed 8 hours (480 minutes)",
                    );
            }
        }

        validator.finish()
    }
}

/// `minPrice`+`maxPrice` win over `duration`; no criteria lists active services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSearch {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub duration: Option<i32>,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub duration_minutes: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OfferedService> for ServiceResponse {
    fn from(service: OfferedService) -> Self {
        Self {
            id: service.id,
            name: service.name,
            description: service.description,
            price: service.price,
            duration_minutes: service.duration_minutes,
            active: service.active,
            created_at: service.audit.created_at,
            updated_at: service.audit.updated_at,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Service not found with id: {0}")]
    NotFound(Uuid),

    #[error("Specialist not found with id: {0}")]
    SpecialistNotFound(Uuid),

    #[error("Service with name '{0}' already exists")]
    NameTaken(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("Service is already active")]
    AlreadyActive,

    #[error("Service is already inactive")]
    AlreadyInactive,

    #[error("Cannot delete service with active appointments. Deactivate service instead.")]
    HasActiveAppointments,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CatalogError {
    pub fn invalid(message: &str) -> Self {
        CatalogError::InvalidArgument(message.to_string())
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) | CatalogError::SpecialistNotFound(_) => AppError::NotFound(err.to_string()),
            CatalogError::NameTaken(_) => AppError::AlreadyExists(err.to_string()),
            CatalogError::InvalidArgument(_) => AppError::BadRequest(err.to_string()),
            CatalogError::AlreadyActive | CatalogError::AlreadyInactive | CatalogError::HasActiveAppointments => {
                AppError::IllegalState(err.to_string())
            }
            CatalogError::Store(store) => store.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn haircut(price: Option<Decimal>, duration: Option<i32>) -> CreateServiceRequest {
        CreateServiceRequest {
            name: "Haircut".to_string(),
            description: None,
            price,
            duration_minutes: duration,
        }
    }

    #[test]
    fn price_and_duration_rules() {
        assert!(haircut(Some(Decimal::new(4999, 2)), Some(30)).validate().is_empty());

        let errors = haircut(Some(Decimal::new(-1, 0)), Some(10)).validate();
        assert_eq!(errors["price"], "Price must be greater than or equal to 0");
        assert_eq!(errors["durationMinutes"], "Duration must be at least 15 minutes");

        let errors = haircut(None, Some(481)).validate();
        assert_eq!(errors["price"], "Price is required");
        assert_eq!(errors["durationMinutes"], "Duration cannot exceed 8 hours (480 minutes)");

        let errors = haircut(Some(Decimal::new(1, 3)), None).validate();
        assert!(errors["price"].starts_with("Price must have at most"));
        assert_eq!(errors["durationMinutes"], "Duration is required");
    }
}
