use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};

use super::super::error::ApiError;
use super::super::identity::CurrentUser;
use super::super::state::AppState;
use crate::error::PitchError;
use crate::store::{Difficulty, TemplateFilter, TemplateId};

const DEFAULT_POPULAR_LIMIT: i64 = 4;
const MAX_POPULAR_LIMIT: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct ListTemplatesQuery {
    pub search: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub industry: Option<String>,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PopularQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TemplateFacets {
    pub difficulties: Vec<Difficulty>,
    pub industries: Vec<String>,
}

/// GET /templates?search=&difficulty=&industry=&page=
pub async fn list_templates(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = TemplateFilter {
        search: query.search,
        difficulty: query.difficulty,
        industry: query.industry,
    };

    let page = state
        .store
        .list_templates(&filter, query.page.unwrap_or(1))
        .await?;

    Ok(Json(page))
}

/// GET /templates/popular?limit=
pub async fn popular_templates(
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_POPULAR_LIMIT)
        .clamp(1, MAX_POPULAR_LIMIT);

    Ok(Json(state.store.popular_templates(limit).await?))
}

/// GET /templates/recommended
pub async fn recommended_templates(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.store.recommended_templates(user.id).await?))
}

/// GET /templates/facets
/// Difficulties and industries available as listing filters
pub async fn template_facets(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(TemplateFacets {
        difficulties: state.store.template_difficulties().await?,
        industries: state.store.template_industries().await?,
    }))
}

/// GET /templates/:id
pub async fn get_template(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<TemplateId>,
) -> Result<impl IntoResponse, ApiError> {
    let template = state
        .store
        .template_by_id(id)
        .await?
        .filter(|t| t.is_active || user.is_admin())
        .ok_or_else(|| PitchError::not_found("template"))?;

    Ok(Json(template))
}
