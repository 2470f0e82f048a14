use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::AppError, models::Trip};

/// Header carrying the caller identity set by the fronting proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub uuid: String,
}

#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<AuthenticatedUser>);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Middleware-provided identities win over the raw header.
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(Self(Some(user.clone())));
        }

        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        Ok(Self(header.map(|uuid| AuthenticatedUser {
            uuid: uuid.to_string(),
        })))
    }
}

impl CurrentUser {
    pub fn require_user(&self) -> Result<&AuthenticatedUser, AppError> {
        self.0.as_ref().ok_or(AppError::Unauthorized)
    }

    /// Write access: only the trip owner.
    pub fn require_owner(&self, trip: &Trip) -> Result<&AuthenticatedUser, AppError> {
        let user = self.require_user()?;
        if trip.is_owner(&user.uuid) {
            Ok(user)
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Read access: the owner or anyone the trip is shared with.
    pub fn require_viewer(&self, trip: &Trip) -> Result<&AuthenticatedUser, AppError> {
        let user = self.require_user()?;
        if trip.can_view(&user.uuid) {
            Ok(user)
        } else {
            Err(AppError::Forbidden)
        }
    }
}
