//! Bearer-token authentication.
//!
//! [`Auth`] never rejects on its own: a missing or invalid token just yields
//! an anonymous caller. Handlers decide what they require.

mod jwt;

pub use jwt::{Claims, JwtError, JwtKeys};

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::convert::Infallible;

use crate::app::AppState;
use crate::error::ApiError;

/// The authenticated caller, if any.
#[derive(Debug, Clone, Default)]
pub struct Auth(pub Option<Claims>);

impl Auth {
    fn bearer(parts: &Parts) -> Option<&str> {
        let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
        header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.0.as_ref()
    }

    /// Any logged-in user.
    pub fn require_login(&self) -> Result<&Claims, ApiError> {
        self.claims().ok_or_else(ApiError::unauthorized)
    }

    pub fn require_admin(&self) -> Result<&Claims, ApiError> {
        match self.claims() {
            Some(claims) if claims.is_admin => Ok(claims),
            _ => Err(ApiError::unauthorized()),
        }
    }

    /// The user named `username`, or an admin.
    pub fn require_self_or_admin(&self, username: &str) -> Result<&Claims, ApiError> {
        match self.claims() {
            Some(claims) if claims.is_admin || claims.username == username => Ok(claims),
            _ => Err(ApiError::unauthorized()),
        }
    }
}

impl FromRequestParts<AppState> for Auth {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = Self::bearer(parts) else {
            return Ok(Self(None));
        };
        match state.keys.validate(token) {
            Ok(claims) => Ok(Self(Some(claims))),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring invalid bearer token");
                Ok(Self(None))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn auth(username: &str, is_admin: bool) -> Auth {
        Auth(Some(Claims::new(username, is_admin, Duration::hours(1))))
    }

    #[test]
    fn anonymous_is_rejected_everywhere() {
        let anon = Auth::default();
        assert!(anon.require_login().is_err());
        assert!(anon.require_admin().is_err());
        assert!(anon.require_self_or_admin("u1").is_err());
    }

    #[test]
    fn users_may_act_on_themselves_only() {
        let u1 = auth("u1", false);
        assert!(u1.require_login().is_ok());
        assert!(u1.require_admin().is_err());
        assert!(u1.require_self_or_admin("u1").is_ok());
        assert!(u1.require_self_or_admin("u2").is_err());
    }

    #[test]
    fn admins_may_act_on_anyone() {
        let admin = auth("admin", true);
        assert!(admin.require_admin().is_ok());
        assert!(admin.require_self_or_admin("u2").is_ok());
    }
}
