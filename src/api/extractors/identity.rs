use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::Span;

use crate::domain::models::identity::{Identity, Role};
use crate::state::AppState;

/// Caller identity asserted by the upstream auth gateway via the
/// `X-User-Id` and `X-User-Role` headers. The gateway strips these
/// headers from external traffic, so their presence is trusted here.
pub struct AuthIdentity(pub Identity);

impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
    Arc<AppState>: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .ok_or(StatusCode::UNAUTHORIZED)?
            .to_str()
            .map_err(|_| StatusCode::UNAUTHORIZED)?
            .to_string();

        if user_id.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let role_raw = parts
            .headers
            .get("X-User-Role")
            .ok_or(StatusCode::UNAUTHORIZED)?
            .to_str()
            .map_err(|_| StatusCode::BAD_REQUEST)?;

        let role = Role::from_str(role_raw).map_err(|_| StatusCode::BAD_REQUEST)?;

        Span::current().record("user_id", &user_id);

        Ok(AuthIdentity(Identity { user_id, role }))
    }
}
