//! Resolves the acting identity of a request.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use http::request::Parts;
use tracing::debug;

use shared_config::AppConfig;
use shared_models::actor::Actor;

use crate::jwt::validate_token;

/// Extractor yielding the [`Actor`] a handler acts on behalf of.
///
/// A valid bearer token contributes its subject and email; anything else
/// (no header, bad signature, expired) falls back to [`Actor::system`].
/// The request is never rejected.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
    Arc<AppConfig>: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<AppConfig>::from_ref(state);
        Ok(CurrentActor(resolve_actor(&parts.headers, &config.supabase_jwt_secret)))
    }
}

pub fn resolve_actor(headers: &http::HeaderMap, jwt_secret: &str) -> Actor {
    let Some(Authorization(bearer)) = headers.typed_get::<Authorization<Bearer>>() else {
        return Actor::system();
    };

    match validate_token(bearer.token(), jwt_secret) {
        Ok(claims) => Actor::user(claims.sub, claims.email),
        Err(reason) => {
            debug!("Ignoring bearer token, acting as system: {}", reason);
            Actor::system()
        }
    }
}
