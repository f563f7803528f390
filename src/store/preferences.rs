use chrono::Utc;

use super::models::{StoredNotificationPreference, UserId};
use super::Store;
use crate::error::PitchResult;

impl Store {
    /// The stored preference row, if the user ever changed their settings.
    pub async fn notification_preference(
        &self,
        user_id: UserId,
    ) -> PitchResult<Option<StoredNotificationPreference>> {
        let row = sqlx::query_as::<_, StoredNotificationPreference>(
            "SELECT user_id, email_notifications, feedback_alerts \
             FROM notification_preferences WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn save_notification_preference(
        &self,
        preference: StoredNotificationPreference,
    ) -> PitchResult<()> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO notification_preferences (
                user_id, email_notifications, feedback_alerts, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                email_notifications = excluded.email_notifications,
                feedback_alerts = excluded.feedback_alerts,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(preference.user_id)
        .bind(preference.email_notifications)
        .bind(preference.feedback_alerts)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
