use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

#[derive(Error, Debug)]
pub enum SupabaseError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict ({status}): {body}")]
    Conflict { status: u16, body: String },

    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid header value: {0}")]
    Header(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, auth_token: Option<&str>) -> Result<HeaderMap, SupabaseError> {
        let mut headers = HeaderMap::new();

        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.anon_key).map_err(|e| SupabaseError::Header(e.to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| SupabaseError::Header(e.to_string()))?,
            );
        }

        Ok(headers)
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, auth_token, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, SupabaseError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, auth_token, body, extra_headers).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// Issues a request whose response body is ignored (PostgREST answers
    /// deletes with `204 No Content`).
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(), SupabaseError> {
        self.send(method, path, auth_token, body, None).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        auth_token: Option<&str>,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<reqwest::Response, SupabaseError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers(auth_token)?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SupabaseError::Auth(error_text),
                StatusCode::NOT_FOUND => SupabaseError::NotFound(error_text),
                StatusCode::CONFLICT => SupabaseError::Conflict {
                    status: status.as_u16(),
                    body: error_text,
                },
                _ => SupabaseError::Api {
                    status: status.as_u16(),
                    body: error_text,
                },
            });
        }

        Ok(response)
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

/// `Prefer: return=representation`, so inserts and updates echo the rows.
pub fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}
