use chrono::Utc;
use tracing::info;

use super::models::{IdentityProfile, Page, Role, User, UserId};
use super::Store;
use crate::error::{PitchError, PitchResult};

const USER_COLUMNS: &str =
    "id, external_id, name, email, image_url, credit, role, created_at, updated_at";

impl Store {
    /// Materialize the user for an identity profile. Existing users (matched
    /// by external id) are returned unchanged.
    pub async fn upsert_identity_user(&self, profile: &IdentityProfile) -> PitchResult<User> {
        let now = Utc::now();

        let inserted = sqlx::query(
            r#"
            INSERT INTO users (external_id, name, email, image_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(external_id) DO NOTHING
            "#,
        )
        .bind(&profile.external_id)
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.image_url)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_to_conflict(e, "email already registered"))?
        .rows_affected();

        if inserted > 0 {
            info!(external_id = %profile.external_id, "Created user from identity profile");
        }

        self.user_by_external_id(&profile.external_id)
            .await?
            .ok_or_else(|| PitchError::not_found("user"))
    }

    pub async fn user_by_id(&self, id: UserId) -> PitchResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn user_by_external_id(&self, external_id: &str) -> PitchResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE external_id = ?"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn update_user_name(&self, id: UserId, name: &str) -> PitchResult<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PitchError::InvalidInput("name must not be empty".into()));
        }

        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PitchError::not_found("user"))
    }

    pub async fn update_user_email(&self, id: UserId, email: &str) -> PitchResult<User> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(PitchError::InvalidInput(format!(
                "'{}' is not an email address",
                email
            )));
        }

        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET email = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(email)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| unique_to_conflict(e, "email already registered"))?
        .ok_or_else(|| PitchError::not_found("user"))
    }

    pub async fn set_user_role(&self, id: UserId, role: Role) -> PitchResult<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = ?, updated_at = ? WHERE id = ? RETURNING {USER_COLUMNS}"
        ))
        .bind(role)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PitchError::not_found("user"))?;

        info!(user_id = id, role = ?role, "User role changed");

        Ok(user)
    }

    /// Newest users first.
    pub async fn list_users(&self, page: i64, page_size: i64) -> PitchResult<Page<User>> {
        let page = page.max(1);
        let offset = (page - 1).saturating_mul(page_size);

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        ))
        .bind(page_size)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(Page::new(users, total, page, page_size))
    }

    /// Delete a user together with everything it owns.
    pub async fn delete_account(&self, id: UserId) -> PitchResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM pitch_feedback WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM pitching_sessions WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM notification_preferences WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(PitchError::not_found("user"));
        }

        tx.commit().await?;

        info!(user_id = id, "Account deleted");

        Ok(())
    }
}

pub(super) fn unique_to_conflict(err: sqlx::Error, message: &str) -> PitchError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => PitchError::Conflict(message.to_string()),
        _ => PitchError::PersistenceFailed(err),
    }
}
