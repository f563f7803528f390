//! Fixed scoring rubric and validation of scorer output.
//!
//! A report is accepted only when it names each of the five categories
//! exactly once and every score lies in 0..=100. Anything else is rejected
//! as is; nothing is clamped or filled in.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::store::{FeedbackId, FeedbackRow, SessionId};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Product Knowledge")]
    ProductKnowledge,
    #[serde(rename = "Market Relevance")]
    MarketRelevance,
    #[serde(rename = "Handling Objections")]
    HandlingObjections,
    #[serde(rename = "Negotiation Skills")]
    NegotiationSkills,
    #[serde(rename = "Logistics and Payment Understanding")]
    LogisticsAndPayment,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ProductKnowledge,
        Category::MarketRelevance,
        Category::HandlingObjections,
        Category::NegotiationSkills,
        Category::LogisticsAndPayment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ProductKnowledge => "Product Knowledge",
            Category::MarketRelevance => "Market Relevance",
            Category::HandlingObjections => "Handling Objections",
            Category::NegotiationSkills => "Negotiation Skills",
            Category::LogisticsAndPayment => "Logistics and Payment Understanding",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryScore {
    pub name: Category,
    pub score: f64,
    pub comment: String,
}

/// Structured feedback as returned by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FeedbackReport {
    pub total_score: f64,
    pub category_scores: Vec<CategoryScore>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
}

#[derive(Debug, Error)]
pub enum RubricError {
    #[error("malformed feedback: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("expected 5 category scores, got {0}")]
    CategoryCount(usize),

    #[error("category scored twice: {}", .0.as_str())]
    DuplicateCategory(Category),

    #[error("{field} score {score} outside 0-100")]
    ScoreOutOfRange { field: String, score: f64 },
}

impl FeedbackReport {
    /// Parse and validate scorer output.
    pub fn from_json(text: &str) -> Result<Self, RubricError> {
        let report: FeedbackReport = serde_json::from_str(text)?;
        report.validate()?;
        Ok(report)
    }

    pub fn validate(&self) -> Result<(), RubricError> {
        check_range("totalScore", self.total_score)?;

        if self.category_scores.len() != Category::ALL.len() {
            return Err(RubricError::CategoryCount(self.category_scores.len()));
        }

        let mut seen = Vec::with_capacity(Category::ALL.len());
        for entry in &self.category_scores {
            if seen.contains(&entry.name) {
                return Err(RubricError::DuplicateCategory(entry.name));
            }
            seen.push(entry.name);
            check_range(entry.name.as_str(), entry.score)?;
        }

        Ok(())
    }
}

fn check_range(field: &str, score: f64) -> Result<(), RubricError> {
    if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
        return Err(RubricError::ScoreOutOfRange {
            field: field.to_string(),
            score,
        });
    }
    Ok(())
}

/// JSON schema the scorer is asked to follow.
pub fn response_schema() -> Value {
    let names: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();

    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["totalScore", "categoryScores", "strengths", "areasForImprovement", "finalAssessment"],
        "properties": {
            "totalScore": { "type": "number", "minimum": MIN_SCORE, "maximum": MAX_SCORE },
            "categoryScores": {
                "type": "array",
                "minItems": names.len(),
                "maxItems": names.len(),
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["name", "score", "comment"],
                    "properties": {
                        "name": { "type": "string", "enum": names },
                        "score": { "type": "number", "minimum": MIN_SCORE, "maximum": MAX_SCORE },
                        "comment": { "type": "string" }
                    }
                }
            },
            "strengths": { "type": "array", "items": { "type": "string" } },
            "areasForImprovement": { "type": "array", "items": { "type": "string" } },
            "finalAssessment": { "type": "string" }
        }
    })
}

/// Stored feedback with its list columns decoded, as served to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackView {
    pub id: FeedbackId,
    pub session_id: SessionId,
    pub total_score: f64,
    pub category_scores: Vec<CategoryScore>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
    pub transcript: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl TryFrom<FeedbackRow> for FeedbackView {
    type Error = serde_json::Error;

    fn try_from(row: FeedbackRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            session_id: row.session_id,
            total_score: row.total_score,
            category_scores: serde_json::from_str(&row.category_scores)?,
            strengths: serde_json::from_str(&row.strengths)?,
            areas_for_improvement: serde_json::from_str(&row.areas_for_improvement)?,
            final_assessment: row.final_assessment,
            transcript: row.transcript,
            created_at: row.created_at,
        })
    }
}
