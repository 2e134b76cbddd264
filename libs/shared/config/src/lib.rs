use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which entity store the API process talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Supabase,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "supabase" | "postgrest" => Ok(StoreBackend::Supabase),
            "memory" | "in_memory" | "in-memory" => Ok(StoreBackend::Memory),
            other => Err(format!("Unknown store backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub store_backend: StoreBackend,
    pub server_host: String,
    pub server_port: u16,
    pub booking_max_retries: u32,
    pub booking_retry_base_delay_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            store_backend: StoreBackend::Memory,
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            booking_max_retries: 3,
            booking_retry_base_delay_ms: 25,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, acting identity will default to system");
                    String::new()
                }),
            store_backend: parse_var("STORE_BACKEND", defaults.store_backend),
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            booking_max_retries: parse_var("BOOKING_MAX_RETRIES", defaults.booking_max_retries),
            booking_retry_base_delay_ms: parse_var(
                "BOOKING_RETRY_BASE_DELAY_MS",
                defaults.booking_retry_base_delay_ms,
            ),
        };

        if config.store_backend == StoreBackend::Supabase && !config.is_configured() {
            warn!("Supabase backend selected but not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_anon_key.is_empty()
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.booking_retry_base_delay_ms)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_store_backend_names() {
        assert_eq!("supabase".parse::<StoreBackend>(), Ok(StoreBackend::Supabase));
        assert_eq!(" Memory ".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("mysql".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn default_config_uses_memory_store() {
        let config = AppConfig::default();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(!config.is_configured());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.retry_base_delay(), Duration::from_millis(25));
    }
}
