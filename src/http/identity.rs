//! Caller identity from the authenticating gateway
//!
//! The gateway sets `x-user-id` to the identity provider's user reference.
//! A user seen for the first time is created from `x-user-email`,
//! `x-user-name` and `x-user-image`.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tracing::info;

use super::error::ApiError;
use super::state::AppState;
use crate::store::{IdentityProfile, User};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_NAME_HEADER: &str = "x-user-name";
pub const USER_IMAGE_HEADER: &str = "x-user-image";

const DEFAULT_USER_NAME: &str = "Anonymous User";

/// The signed-in user
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// The signed-in user, who must be an admin
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

fn header(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let external_id = header(parts, USER_ID_HEADER).ok_or_else(ApiError::unauthorized)?;

        if let Some(user) = state.store.user_by_external_id(&external_id).await? {
            return Ok(CurrentUser(user));
        }

        let email = header(parts, USER_EMAIL_HEADER).ok_or_else(ApiError::unauthorized)?;
        let profile = IdentityProfile {
            external_id,
            name: header(parts, USER_NAME_HEADER).unwrap_or_else(|| DEFAULT_USER_NAME.to_string()),
            email,
            image_url: header(parts, USER_IMAGE_HEADER).unwrap_or_default(),
        };

        let user = state.store.upsert_identity_user(&profile).await?;
        info!(user_id = user.id, "User created on first access");

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(ApiError::forbidden());
        }

        Ok(AdminUser(user))
    }
}
