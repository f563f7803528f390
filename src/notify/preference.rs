use serde::{Deserialize, Serialize};

use crate::store::{StoredNotificationPreference, UserId};

/// A user's effective notification settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreference {
    pub email_notifications: bool,
    pub feedback_alerts: bool,
}

impl Default for NotificationPreference {
    fn default() -> Self {
        Self {
            email_notifications: true,
            feedback_alerts: true,
        }
    }
}

impl NotificationPreference {
    /// Users who never saved their settings get everything enabled.
    pub fn resolve(stored: Option<StoredNotificationPreference>) -> Self {
        stored
            .map(|row| Self {
                email_notifications: row.email_notifications,
                feedback_alerts: row.feedback_alerts,
            })
            .unwrap_or_default()
    }

    pub fn wants_feedback_email(&self) -> bool {
        self.email_notifications && self.feedback_alerts
    }

    pub fn into_stored(self, user_id: UserId) -> StoredNotificationPreference {
        StoredNotificationPreference {
            user_id,
            email_notifications: self.email_notifications,
            feedback_alerts: self.feedback_alerts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_row_enables_everything() {
        let pref = NotificationPreference::resolve(None);
        assert!(pref.email_notifications);
        assert!(pref.feedback_alerts);
        assert!(pref.wants_feedback_email());
    }

    #[test]
    fn test_both_flags_required() {
        let stored = |email, alerts| StoredNotificationPreference {
            user_id: 1,
            email_notifications: email,
            feedback_alerts: alerts,
        };

        assert!(!NotificationPreference::resolve(Some(stored(true, false))).wants_feedback_email());
        assert!(!NotificationPreference::resolve(Some(stored(false, true))).wants_feedback_email());
        assert!(NotificationPreference::resolve(Some(stored(true, true))).wants_feedback_email());
    }
}
