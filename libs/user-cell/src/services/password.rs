use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::instrument;

/// Salted one-way password hashing (argon2id, PHC string format).
pub struct PasswordService;

impl PasswordService {
    #[instrument(skip(password))]
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    #[instrument(skip(password, hash))]
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
        let parsed_hash = PasswordHash::new(hash)?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifiable() {
        let first = PasswordService::hash_password("correct horse").unwrap();
        let second = PasswordService::hash_password("correct horse").unwrap();

        assert_ne!(first, second);
        assert!(!first.contains("correct horse"));
        assert!(PasswordService::verify_password("correct horse", &first).unwrap());
        assert!(!PasswordService::verify_password("wrong horse", &first).unwrap());
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(PasswordService::verify_password("x", "not-a-phc-string").is_err());
    }
}
