use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use super::super::error::ApiError;
use super::super::identity::CurrentUser;
use super::super::state::AppState;
use crate::notify::NotificationPreference;
use crate::store::IdentityProfile;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateNameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    pub email: String,
}

/// Identity provider event, e.g. `user.created`
#[derive(Debug, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: IdentityEventData,
}

#[derive(Debug, Deserialize)]
pub struct IdentityEventData {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<IdentityEmail>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdentityEmail {
    pub email_address: String,
}

impl IdentityEventData {
    fn display_name(&self) -> String {
        let full_name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        match self.username.as_deref().map(str::trim) {
            Some(username) if !username.is_empty() => username.to_string(),
            _ if !full_name.is_empty() => full_name,
            _ => "Anonymous User".to_string(),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /webhooks/identity
/// Materialize a user from a `user.created` event
pub async fn identity_webhook(
    State(state): State<AppState>,
    Json(event): Json<IdentityEvent>,
) -> Result<impl IntoResponse, ApiError> {
    if event.event_type != "user.created" {
        info!("Ignoring identity event: {}", event.event_type);
        return Ok(StatusCode::OK.into_response());
    }

    let email = event
        .data
        .email_addresses
        .first()
        .map(|e| e.email_address.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ApiError::bad_request("user must have an email address"))?;

    let profile = IdentityProfile {
        name: event.data.display_name(),
        email,
        image_url: event.data.image_url.clone().unwrap_or_default(),
        external_id: event.data.id,
    };

    let user = state.store.upsert_identity_user(&profile).await?;
    info!(user_id = user.id, "User materialized from identity event");

    Ok((StatusCode::CREATED, Json(user)).into_response())
}

/// GET /me
pub async fn get_me(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(user)
}

/// PUT /me/name
pub async fn update_name(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdateNameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.store.update_user_name(user.id, &req.name).await?;
    Ok(Json(user))
}

/// PUT /me/email
pub async fn update_email(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdateEmailRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.store.update_user_email(user.id, &req.email).await?;
    Ok(Json(user))
}

/// DELETE /me
/// Delete the account with its sessions, feedback and preferences
pub async fn delete_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_account(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /me/notifications
pub async fn get_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let stored = state.store.notification_preference(user.id).await?;
    Ok(Json(NotificationPreference::resolve(stored)))
}

/// PUT /me/notifications
pub async fn update_notifications(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(preference): Json<NotificationPreference>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .store
        .save_notification_preference(preference.into_stored(user.id))
        .await?;

    Ok(Json(preference))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
