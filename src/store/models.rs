use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

use crate::questions::parse_question_list;

pub type UserId = i64;
pub type TemplateId = i64;
pub type SessionId = i64;
pub type FeedbackId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub external_id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub credit: i64,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Profile fields supplied by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityProfile {
    pub external_id: String,
    pub name: String,
    pub email: String,
    pub image_url: String,
}

/// A row from the `practice_templates` table.
///
/// `questions` holds the ordered question list as a JSON string array.
#[derive(Debug, Clone, FromRow)]
pub struct TemplateRow {
    pub id: TemplateId,
    pub title: String,
    pub description: String,
    pub questions: String,
    pub difficulty: Difficulty,
    pub duration_minutes: i64,
    pub industry: String,
    pub target_market: String,
    pub target_market_code: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A practice scenario with its question list decoded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeTemplate {
    pub id: TemplateId,
    pub title: String,
    pub description: String,
    pub questions: Vec<String>,
    pub difficulty: Difficulty,
    pub duration_minutes: i64,
    pub industry: String,
    pub target_market: String,
    pub target_market_code: String,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TemplateRow> for PracticeTemplate {
    type Error = sqlx::Error;

    fn try_from(row: TemplateRow) -> Result<Self, Self::Error> {
        let questions: Vec<String> =
            serde_json::from_str(&row.questions).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            questions,
            difficulty: row.difficulty,
            duration_minutes: row.duration_minutes,
            industry: row.industry,
            target_market: row.target_market,
            target_market_code: row.target_market_code,
            image_url: row.image_url,
            is_active: row.is_active,
            usage_count: row.usage_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fields an admin supplies when creating or editing a template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    pub title: String,
    pub description: String,
    /// A JSON array, or text in any encoding `parse_question_list` accepts
    #[serde(deserialize_with = "question_list")]
    pub questions: Vec<String>,
    pub difficulty: Difficulty,
    pub duration_minutes: i64,
    pub industry: String,
    pub target_market: String,
    pub target_market_code: String,
    pub image_url: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

fn question_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::List(items) => Ok(items
            .into_iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect()),
        Raw::Text(text) => parse_question_list(&text).map_err(serde::de::Error::custom),
    }
}

/// Listing filters for the template catalogue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateFilter {
    pub search: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub industry: Option<String>,
}

/// A row from the `pitching_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchingSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub template_id: TemplateId,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// A session joined with the template fields shown in session lists.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: SessionId,
    pub template_id: TemplateId,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub template_title: String,
    pub difficulty: Difficulty,
    pub industry: String,
    pub target_market: String,
    pub image_url: Option<String>,
}

/// A row from the `pitch_feedback` table, list columns still JSON-encoded.
#[derive(Debug, Clone, FromRow)]
pub struct FeedbackRow {
    pub id: FeedbackId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub total_score: f64,
    pub category_scores: String,
    pub strengths: String,
    pub areas_for_improvement: String,
    pub final_assessment: String,
    pub transcript: String,
    pub created_at: DateTime<Utc>,
}

/// A row from the `notification_preferences` table.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct StoredNotificationPreference {
    pub user_id: UserId,
    pub email_notifications: bool,
    pub feedback_alerts: bool,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub template_count: i64,
    pub user_count: i64,
    pub session_count: i64,
    pub completed_session_count: i64,
}

/// One page of a paginated listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub total_pages: i64,
    pub page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64, page: i64, page_size: i64) -> Self {
        let total_pages = (total_count + page_size - 1) / page_size;
        Self {
            items,
            total_count,
            total_pages,
            page,
        }
    }
}
