use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

const GENERIC_INTERNAL_MESSAGE: &str = "Internal server error occurred";

pub type FieldErrors = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Validation error: {message}")]
    ValidationError {
        message: String,
        field_errors: FieldErrors,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub timestamp: String,
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::AlreadyExists(_) | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_)
            | AppError::IllegalState(_)
            | AppError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand to a client. Storage and internal failures are
    /// reduced to a generic text.
    pub fn public_message(&self) -> String {
        match self {
            AppError::NotFound(msg)
            | AppError::AlreadyExists(msg)
            | AppError::Conflict(msg)
            | AppError::BadRequest(msg)
            | AppError::IllegalState(msg) => msg.clone(),
            AppError::ValidationError { message, .. } => message.clone(),
            AppError::Database(_) | AppError::Internal(_) => GENERIC_INTERNAL_MESSAGE.to_string(),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let status = self.status_code();
        let (error, field_errors) = match self {
            AppError::ValidationError { field_errors, .. } => {
                ("Validation Failed".to_string(), Some(field_errors.clone()))
            }
            _ => (
                status.canonical_reason().unwrap_or("Error").to_string(),
                None,
            ),
        };

        ErrorBody {
            timestamp: Utc::now().to_rfc3339(),
            status: status.as_u16(),
            error,
            message: self.public_message(),
            field_errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        tracing::error!("Error: {}: {}", status, self);

        (status, Json(self.to_body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_taxonomy_to_status_codes() {
        assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::AlreadyExists("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::BadRequest("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::IllegalState("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let body = AppError::Database("relation \"users\" does not exist".into()).to_body();
        assert_eq!(body.status, 500);
        assert_eq!(body.message, GENERIC_INTERNAL_MESSAGE);
        assert_eq!(body.error, "Internal Server Error");
    }

    #[test]
    fn validation_body_carries_field_errors() {
        let mut fields = FieldErrors::new();
        fields.insert("email".into(), "Email should be valid".into());
        let body = AppError::ValidationError {
            message: "Invalid input data".into(),
            field_errors: fields,
        }
        .to_body();

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["error"], "Validation Failed");
        assert_eq!(json["fieldErrors"]["email"], "Email should be valid");
    }

    #[test]
    fn plain_errors_omit_field_errors() {
        let json = serde_json::to_value(AppError::NotFound("Slot not found".into()).to_body()).unwrap();
        assert_eq!(json["error"], "Not Found");
        assert_eq!(json["message"], "Slot not found");
        assert!(json.get("fieldErrors").is_none());
    }
}
