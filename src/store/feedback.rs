use chrono::Utc;
use sqlx::SqliteConnection;

use super::models::{FeedbackId, FeedbackRow, SessionId, UserId};
use super::Store;
use crate::error::{PitchError, PitchResult};

const FEEDBACK_COLUMNS: &str = "id, session_id, user_id, total_score, category_scores, strengths, \
     areas_for_improvement, final_assessment, transcript, created_at";

/// Scored feedback ready to be written. List fields are already serialized.
#[derive(Debug, Clone)]
pub struct FeedbackRecord {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub total_score: f64,
    pub category_scores: String,
    pub strengths: String,
    pub areas_for_improvement: String,
    pub final_assessment: String,
    pub transcript: String,
}

impl FeedbackRecord {
    pub async fn insert(&self, conn: &mut SqliteConnection) -> PitchResult<FeedbackId> {
        let id = sqlx::query(
            r#"
            INSERT INTO pitch_feedback (
                session_id, user_id, total_score, category_scores, strengths,
                areas_for_improvement, final_assessment, transcript, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(self.session_id)
        .bind(self.user_id)
        .bind(self.total_score)
        .bind(&self.category_scores)
        .bind(&self.strengths)
        .bind(&self.areas_for_improvement)
        .bind(&self.final_assessment)
        .bind(&self.transcript)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    /// Overwrite feedback `id`, which must belong to the same session and user.
    pub async fn replace(&self, conn: &mut SqliteConnection, id: FeedbackId) -> PitchResult<()> {
        let affected = sqlx::query(
            r#"
            UPDATE pitch_feedback SET
                total_score = ?, category_scores = ?, strengths = ?,
                areas_for_improvement = ?, final_assessment = ?, transcript = ?
            WHERE id = ? AND session_id = ? AND user_id = ?
            "#,
        )
        .bind(self.total_score)
        .bind(&self.category_scores)
        .bind(&self.strengths)
        .bind(&self.areas_for_improvement)
        .bind(&self.final_assessment)
        .bind(&self.transcript)
        .bind(id)
        .bind(self.session_id)
        .bind(self.user_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(PitchError::not_found("feedback"));
        }

        Ok(())
    }
}

impl Store {
    /// Latest feedback for a session owned by `user_id`.
    pub async fn feedback_for_session(
        &self,
        session_id: SessionId,
        user_id: UserId,
    ) -> PitchResult<Option<FeedbackRow>> {
        let row = sqlx::query_as::<_, FeedbackRow>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM pitch_feedback WHERE session_id = ? AND user_id = ? \
             ORDER BY id DESC LIMIT 1"
        ))
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn feedback_by_id(&self, id: FeedbackId) -> PitchResult<Option<FeedbackRow>> {
        let row = sqlx::query_as::<_, FeedbackRow>(&format!(
            "SELECT {FEEDBACK_COLUMNS} FROM pitch_feedback WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn feedback_count_for_session(&self, session_id: SessionId) -> PitchResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM pitch_feedback WHERE session_id = ?")
            .bind(session_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
