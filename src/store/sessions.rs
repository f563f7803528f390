use chrono::Utc;
use sqlx::SqliteConnection;

use super::models::{
    AdminStats, PitchingSession, SessionId, SessionStatus, SessionSummary, TemplateId, UserId,
};
use super::Store;
use crate::error::{PitchError, PitchResult};

const SESSION_COLUMNS: &str = "id, user_id, template_id, status, created_at, completed_at";

/// Sessions shown on the dashboard.
const RECENT_SESSION_LIMIT: i64 = 5;

/// Take `cost` credits from the user if the balance covers it. Returns false
/// when the user is missing or cannot afford it; nothing is written then.
pub async fn deduct_credit(
    conn: &mut SqliteConnection,
    user_id: UserId,
    cost: i64,
) -> sqlx::Result<bool> {
    let affected = sqlx::query(
        "UPDATE users SET credit = credit - ?, updated_at = ? WHERE id = ? AND credit >= ?",
    )
    .bind(cost)
    .bind(Utc::now())
    .bind(user_id)
    .bind(cost)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(affected == 1)
}

pub async fn credit_balance(conn: &mut SqliteConnection, user_id: UserId) -> sqlx::Result<Option<i64>> {
    sqlx::query_scalar("SELECT credit FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
}

/// Count one more use of an active template. Returns false if the template
/// is missing or inactive.
pub async fn increment_template_usage(
    conn: &mut SqliteConnection,
    template_id: TemplateId,
) -> sqlx::Result<bool> {
    let affected = sqlx::query(
        "UPDATE practice_templates SET usage_count = usage_count + 1, updated_at = ? \
         WHERE id = ? AND is_active = 1",
    )
    .bind(Utc::now())
    .bind(template_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(affected == 1)
}

pub async fn insert_session(
    conn: &mut SqliteConnection,
    user_id: UserId,
    template_id: TemplateId,
) -> sqlx::Result<SessionId> {
    let id = sqlx::query(
        "INSERT INTO pitching_sessions (user_id, template_id, status, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(template_id)
    .bind(SessionStatus::InProgress)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?
    .last_insert_rowid();

    Ok(id)
}

/// Mark a session completed. Returns false when it was already completed, in
/// which case it is left untouched.
pub async fn complete_session_in(
    conn: &mut SqliteConnection,
    session_id: SessionId,
) -> PitchResult<bool> {
    let affected = sqlx::query(
        "UPDATE pitching_sessions SET status = ?, completed_at = ? WHERE id = ? AND status = ?",
    )
    .bind(SessionStatus::Completed)
    .bind(Utc::now())
    .bind(session_id)
    .bind(SessionStatus::InProgress)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if affected == 0 {
        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM pitching_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&mut *conn)
            .await?;

        if exists.is_none() {
            return Err(PitchError::not_found("session"));
        }
    }

    Ok(affected == 1)
}

impl Store {
    pub async fn session_by_id(&self, id: SessionId) -> PitchResult<Option<PitchingSession>> {
        let session = sqlx::query_as::<_, PitchingSession>(&format!(
            "SELECT {SESSION_COLUMNS} FROM pitching_sessions WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// A session owned by `user_id`, with the title of its template.
    pub async fn owned_session(
        &self,
        id: SessionId,
        user_id: UserId,
    ) -> PitchResult<Option<SessionSummary>> {
        let session = sqlx::query_as::<_, SessionSummary>(
            r#"
            SELECT s.id, s.template_id, s.status, s.created_at, s.completed_at,
                   t.title AS template_title, t.difficulty, t.industry, t.target_market, t.image_url
            FROM pitching_sessions s
            JOIN practice_templates t ON t.id = s.template_id
            WHERE s.id = ? AND s.user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// The user's latest sessions, newest first.
    pub async fn recent_sessions(&self, user_id: UserId) -> PitchResult<Vec<SessionSummary>> {
        let sessions = sqlx::query_as::<_, SessionSummary>(
            r#"
            SELECT s.id, s.template_id, s.status, s.created_at, s.completed_at,
                   t.title AS template_title, t.difficulty, t.industry, t.target_market, t.image_url
            FROM pitching_sessions s
            JOIN practice_templates t ON t.id = s.template_id
            WHERE s.user_id = ?
            ORDER BY s.created_at DESC, s.id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(RECENT_SESSION_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    pub async fn admin_stats(&self) -> PitchResult<AdminStats> {
        let (template_count, user_count, session_count, completed_session_count) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM practice_templates),
                    (SELECT COUNT(*) FROM users),
                    (SELECT COUNT(*) FROM pitching_sessions),
                    (SELECT COUNT(*) FROM pitching_sessions WHERE status = 'completed')
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(AdminStats {
            template_count,
            user_count,
            session_count,
            completed_session_count,
        })
    }
}
