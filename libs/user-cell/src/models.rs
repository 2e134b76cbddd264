use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::booking::{Role, User};
use shared_models::error::{AppError, FieldErrors};
use shared_utils::validation::{is_valid_phone, Validate, Validator};

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

fn validate_profile(
    validator: &mut Validator,
    email: &str,
    firstname: &str,
    lastname: &str,
    phone: Option<&str>,
) {
    validator
        .not_blank("email", email, "Email cannot be blank")
        .email("email", email, "Email should be valid")
        .not_blank("firstname", firstname, "First name cannot be blank")
        .max_length("firstname", Some(firstname), 50, "First name cannot exceed 50 characters")
        .not_blank("lastname", lastname, "Last name cannot be blank")
        .max_length("lastname", Some(lastname), 50, "Last name cannot exceed 50 characters")
        .optional_pattern("phone", phone, is_valid_phone, "Phone number should be valid");
}

impl Validate for CreateUserRequest {
    fn validate(&self) -> FieldErrors {
        let mut validator = Validator::new();
        validate_profile(
            &mut validator,
            &self.email,
            &self.firstname,
            &self.lastname,
            self.phone.as_deref(),
        );
        validator
            .not_blank("password", &self.password, "Password cannot be blank")
            .check(
                "password",
                self.password.chars().count() >= 8,
                "Password must be at least 8 characters long",
            )
            .finish()
    }
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> FieldErrors {
        let mut validator = Validator::new();
        validate_profile(
            &mut validator,
            &self.email,
            &self.firstname,
            &self.lastname,
            self.phone.as_deref(),
        );
        validator.finish()
    }
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> FieldErrors {
        Validator::new()
            .not_blank("currentPassword", &self.current_password, "Current password cannot be blank")
            .check(
                "newPassword",
                self.new_password.chars().count() >= 8,
                "New password must be at least 8 characters long",
            )
            .finish()
    }
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub phone: Option<String>,
    pub roles: Vec<Role>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            firstname: user.firstname,
            lastname: user.lastname,
            phone: user.phone,
            roles: user.roles,
            enabled: user.enabled,
            created_at: user.audit.created_at,
            updated_at: user.audit.updated_at,
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found with id: {0}")]
    NotFound(Uuid),

    #[error("User with email {0} already exists")]
    EmailTaken(String),

    #[error("Email {0} is already taken by another user")]
    EmailTakenByOther(String),

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<argon2::password_hash::Error> for UserError {
    fn from(err: argon2::password_hash::Error) -> Self {
        UserError::Hashing(err.to_string())
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => AppError::NotFound(err.to_string()),
            UserError::EmailTaken(_) | UserError::EmailTakenByOther(_) => AppError::AlreadyExists(err.to_string()),
            UserError::IncorrectPassword => AppError::BadRequest(err.to_string()),
            UserError::Hashing(_) => AppError::Internal(err.to_string()),
            UserError::Store(store) => store.into(),
        }
    }
}
