//! Request payload validation.
//!
//! Request types implement [`Validate`] by running a [`Validator`] over their
//! fields; handlers call [`validate_request`] before touching a service.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;

use shared_models::error::{AppError, FieldErrors};

pub const INVALID_INPUT_MESSAGE: &str = "Invalid input data";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("valid regex"));

static POSTAL_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}-\d{3}$").expect("valid regex"));

pub trait Validate {
    fn validate(&self) -> FieldErrors;
}

pub fn validate_request<T: Validate>(request: &T) -> Result<(), AppError> {
    let field_errors = request.validate();
    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError {
            message: INVALID_INPUT_MESSAGE.to_string(),
            field_errors,
        })
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email) && email.len() <= 254
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub fn is_valid_postal_code(code: &str) -> bool {
    POSTAL_CODE_RE.is_match(code)
}

/// Collects the first failure per field.
#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, field: &str, ok: bool, message: &str) -> &mut Self {
        if !ok {
            self.errors
                .entry(field.to_string())
                .or_insert_with(|| message.to_string());
        }
        self
    }

    pub fn not_blank(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        self.check(field, !value.trim().is_empty(), message)
    }

    /// Length in characters, inclusive bounds.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize, message: &str) -> &mut Self {
        let len = value.chars().count();
        self.check(field, len >= min && len <= max, message)
    }

    pub fn max_length(&mut self, field: &str, value: Option<&str>, max: usize, message: &str) -> &mut Self {
        let len = value.map(|v| v.chars().count()).unwrap_or(0);
        self.check(field, len <= max, message)
    }

    pub fn email(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        self.check(field, value.trim().is_empty() || is_valid_email(value), message)
    }

    /// Absent and empty values pass.
    pub fn optional_pattern(
        &mut self,
        field: &str,
        value: Option<&str>,
        matcher: fn(&str) -> bool,
        message: &str,
    ) -> &mut Self {
        let ok = match value {
            Some(v) if !v.is_empty() => matcher(v),
            _ => true,
        };
        self.check(field, ok, message)
    }

    pub fn decimal_digits(
        &mut self,
        field: &str,
        value: Decimal,
        integer: u32,
        fraction: u32,
        message: &str,
    ) -> &mut Self {
        let integer_limit = Decimal::from(10u64.pow(integer));
        let ok = value.normalize().scale() <= fraction && value.abs().trunc() < integer_limit;
        self.check(field, ok, message)
    }

    pub fn finish(&mut self) -> FieldErrors {
        std::mem::take(&mut self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    struct Signup {
        email: String,
        phone: Option<String>,
    }

    impl Validate for Signup {
        fn validate(&self) -> FieldErrors {
            Validator::new()
                .not_blank("email", &self.email, "Email is required")
                .email("email", &self.email, "Email should be valid")
                .optional_pattern("phone", self.phone.as_deref(), is_valid_phone, "Phone number is invalid")
                .finish()
        }
    }

    #[test]
    fn first_failure_per_field_wins() {
        let errors = Signup {
            email: " ".to_string(),
            phone: Some("0123".to_string()),
        }
        .validate();

        assert_eq!(errors.get("email").map(String::as_str), Some("Email is required"));
        assert_eq!(errors.get("phone").map(String::as_str), Some("Phone number is invalid"));
    }

    #[test]
    fn validate_request_maps_to_validation_error() {
        let ok = Signup {
            email: "a@b.io".to_string(),
            phone: Some("+48123456789".to_string()),
        };
        assert!(validate_request(&ok).is_ok());

        let bad = Signup {
            email: "nope".to_string(),
            phone: None,
        };
        assert_matches!(
            validate_request(&bad),
            Err(AppError::ValidationError { message, field_errors })
                if message == INVALID_INPUT_MESSAGE && field_errors.contains_key("email")
        );
    }

    #[test]
    fn postal_codes_and_prices() {
        assert!(is_valid_postal_code("00-950"));
        assert!(!is_valid_postal_code("00950"));

        let errors = Validator::new()
            .decimal_digits("a", Decimal::new(12345, 2), 8, 2, "bad")
            .decimal_digits("b", Decimal::new(12345, 3), 8, 2, "bad")
            .decimal_digits("c", Decimal::new(1_000_000_000, 0), 8, 2, "bad")
            .finish();
        assert!(!errors.contains_key("a"));
        assert!(errors.contains_key("b"));
        assert!(errors.contains_key("c"));
    }
}
