//! Feedback-ready email notifications
//!
//! Delivery is best effort: preference lookups, rendering and mailer
//! failures are logged and never reach the caller.

mod dispatcher;
mod mailer;
mod preference;

pub use dispatcher::{render_feedback_ready, FeedbackNotice, FeedbackNotifier, NotificationDispatcher};
pub use mailer::{Email, HttpMailer, LogMailer, Mailer, MailerError};
pub use preference::NotificationPreference;
