use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::info;

use super::super::error::ApiError;
use super::super::identity::AdminUser;
use super::super::state::AppState;
use crate::store::{Role, TemplateDraft, TemplateId, UserId};

const USER_PAGE_SIZE: i64 = 10;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}

/// GET /admin/templates
/// Every template, including inactive ones
pub async fn list_all_templates(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.store.all_templates().await?))
}

/// POST /admin/templates
pub async fn create_template(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(draft): Json<TemplateDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let template = state.store.create_template(&draft).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// PUT /admin/templates/:id
pub async fn update_template(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<TemplateId>,
    Json(draft): Json<TemplateDraft>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.store.update_template(id, &draft).await?))
}

/// DELETE /admin/templates/:id
pub async fn delete_template(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<TemplateId>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_template(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/users?page=
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = state
        .store
        .list_users(query.page.unwrap_or(1), USER_PAGE_SIZE)
        .await?;

    Ok(Json(page))
}

/// PUT /admin/users/:id/role
pub async fn set_role(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<UserId>,
    Json(req): Json<SetRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if user_id == admin.id && req.role != Role::Admin {
        return Err(ApiError::bad_request("admins cannot remove their own admin role"));
    }

    let user = state.store.set_user_role(user_id, req.role).await?;
    info!(admin_id = admin.id, user_id, role = ?req.role, "Role changed");

    Ok(Json(user))
}

/// GET /admin/stats
pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.store.admin_stats().await?))
}
