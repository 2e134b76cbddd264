use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use shared_models::auth::{JwtClaims, JwtHeader};

type HmacSha256 = Hmac<Sha256>;

/// Verifies an HS256 token and returns its claims.
pub fn validate_token(token: &str, jwt_secret: &str) -> Result<JwtClaims, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err("Invalid token format".to_string());
    }
    let (header_b64, claims_b64, signature_b64) = (parts[0], parts[1], parts[2]);

    let header: JwtHeader = decode_segment(header_b64).map_err(|e| {
        debug!("Failed to parse header: {}", e);
        "Invalid header format".to_string()
    })?;
    if header.alg != "HS256" {
        return Err(format!("Unsupported algorithm: {}", header.alg));
    }

    let signature = URL_SAFE_NO_PAD.decode(signature_b64).map_err(|e| {
        debug!("Failed to decode signature: {}", e);
        "Invalid signature encoding".to_string()
    })?;

    let mut mac = HmacSha256::new_from_slice(jwt_secret.as_bytes())
        .map_err(|_| "Failed to create HMAC".to_string())?;
    mac.update(format!("{}.{}", header_b64, claims_b64).as_bytes());
    if mac.verify_slice(&signature).is_err() {
        debug!("Token signature verification failed");
        return Err("Invalid token signature".to_string());
    }

    let claims: JwtClaims = decode_segment(claims_b64).map_err(|e| {
        debug!("Failed to parse claims: {}", e);
        "Invalid claims format".to_string()
    })?;

    if let Some(exp) = claims.exp {
        let now = chrono::Utc::now().timestamp().max(0) as u64;
        if exp < now {
            debug!("Token expired at {} (now: {})", exp, now);
            return Err("Token expired".to_string());
        }
    }

    debug!("Token validated successfully for subject: {}", claims.sub);
    Ok(claims)
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, String> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| e.to_string())?;
    serde_json::from_slice(&bytes).map_err(|e| e.to_string())
}
