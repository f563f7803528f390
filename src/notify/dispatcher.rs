use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::mailer::{Email, Mailer};
use super::preference::NotificationPreference;
use crate::store::{FeedbackId, Store, UserId};

const FEEDBACK_READY_SUBJECT: &str = "Your Pitch Feedback is Ready - ExportPitch AI";

/// What the feedback-ready email reports.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackNotice {
    pub template_name: String,
    pub feedback_id: FeedbackId,
    pub score: f64,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

/// Told when new feedback has been stored. Never fails.
#[async_trait]
pub trait FeedbackNotifier: Send + Sync {
    async fn notify_feedback_ready(&self, user_id: UserId, notice: FeedbackNotice);
}

pub struct NotificationDispatcher {
    store: Store,
    mailer: Arc<dyn Mailer>,
    app_url: String,
}

impl NotificationDispatcher {
    pub fn new(store: Store, mailer: Arc<dyn Mailer>, app_url: impl Into<String>) -> Self {
        Self {
            store,
            mailer,
            app_url: app_url.into(),
        }
    }

    async fn send_feedback_ready(&self, user_id: UserId, notice: &FeedbackNotice) -> Result<()> {
        let stored = self.store.notification_preference(user_id).await?;
        if !NotificationPreference::resolve(stored).wants_feedback_email() {
            debug!(user_id, "Feedback alerts disabled, skipping email");
            return Ok(());
        }

        let user = self
            .store
            .user_by_id(user_id)
            .await?
            .context("User no longer exists")?;

        let email = Email {
            to: user.email,
            subject: FEEDBACK_READY_SUBJECT.to_string(),
            html: render_feedback_ready(&user.name, notice, &self.app_url),
        };

        self.mailer
            .send(&email)
            .await
            .context("Failed to send feedback email")?;

        info!(user_id, feedback_id = notice.feedback_id, "Feedback email sent");

        Ok(())
    }
}

#[async_trait]
impl FeedbackNotifier for NotificationDispatcher {
    async fn notify_feedback_ready(&self, user_id: UserId, notice: FeedbackNotice) {
        if let Err(e) = self.send_feedback_ready(user_id, &notice).await {
            warn!(
                user_id,
                feedback_id = notice.feedback_id,
                "Feedback notification dropped: {:#}",
                e
            );
        }
    }
}

/// HTML body of the feedback-ready email.
pub fn render_feedback_ready(user_name: &str, notice: &FeedbackNotice, app_url: &str) -> String {
    let app_url = app_url.trim_end_matches('/');
    let list = |items: &[String]| -> String {
        items
            .iter()
            .map(|item| format!("<li>{}</li>", escape_html(item)))
            .collect()
    };

    format!(
        r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px; color: #333">
<h1 style="color: #F59E0B">ExportPitch</h1>
<h2>Your Feedback is Ready!</h2>
<p>Hello {name},</p>
<p>Great job on completing your pitch practice session for <strong>{template}</strong>. Your feedback is now available to review.</p>
<h3>Feedback Summary</h3>
<p><strong>Overall Score:</strong> {score}/100</p>
<p><strong>Date Submitted:</strong> {date}</p>
<h4>Key Strengths:</h4>
<ul>{strengths}</ul>
<h4>Areas for Improvement:</h4>
<ul>{improvements}</ul>
<p><a href="{app_url}/dashboard/my-feedback/{feedback_id}">View Full Feedback</a></p>
<p>You received this email because you have email notifications enabled in your <a href="{app_url}/dashboard/settings">account settings</a>.</p>
</div>"#,
        name = escape_html(user_name),
        template = escape_html(&notice.template_name),
        score = notice.score,
        date = chrono::Utc::now().format("%B %-d, %Y"),
        strengths = list(&notice.strengths),
        improvements = list(&notice.improvements),
        feedback_id = notice.feedback_id,
    )
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
