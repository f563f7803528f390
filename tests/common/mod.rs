#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use exportpitch::feedback::{
    Category, CategoryScore, FeedbackReport, FeedbackScorer, ScoringError,
};
use exportpitch::notify::{Email, FeedbackNotice, FeedbackNotifier, Mailer, MailerError};
use exportpitch::store::{
    Difficulty, IdentityProfile, PracticeTemplate, Store, TemplateDraft, User, UserId,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// A store backed by a fresh database file. Keep the `TempDir` alive for
/// the duration of the test.
pub async fn test_store() -> Result<(TempDir, Store)> {
    let dir = tempfile::tempdir()?;
    let store = Store::open(dir.path().join("test.db")).await?;
    Ok((dir, store))
}

pub async fn create_user(store: &Store, external_id: &str, credit: i64) -> Result<User> {
    let user = store
        .upsert_identity_user(&IdentityProfile {
            external_id: external_id.to_string(),
            name: format!("User {}", external_id),
            email: format!("{}@example.com", external_id),
            image_url: String::new(),
        })
        .await?;

    set_credit(store, user.id, credit).await?;

    Ok(store.user_by_id(user.id).await?.expect("user just created"))
}

pub async fn set_credit(store: &Store, user_id: UserId, credit: i64) -> Result<()> {
    sqlx::query("UPDATE users SET credit = ? WHERE id = ?")
        .bind(credit)
        .bind(user_id)
        .execute(store.pool())
        .await?;
    Ok(())
}

pub async fn credit_of(store: &Store, user_id: UserId) -> Result<i64> {
    Ok(store.user_by_id(user_id).await?.expect("user exists").credit)
}

pub async fn session_count(store: &Store) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM pitching_sessions")
        .fetch_one(store.pool())
        .await?)
}

pub fn draft(title: &str, industry: &str, difficulty: Difficulty) -> TemplateDraft {
    TemplateDraft {
        title: title.to_string(),
        description: format!("Pitch {} to a foreign buyer", title),
        questions: vec![
            "What is your minimum order quantity?".to_string(),
            "Which Incoterms do you offer?".to_string(),
        ],
        difficulty,
        duration_minutes: 10,
        industry: industry.to_string(),
        target_market: "Germany".to_string(),
        target_market_code: "DE".to_string(),
        image_url: None,
        is_active: true,
    }
}

pub async fn create_template(store: &Store, title: &str) -> Result<PracticeTemplate> {
    Ok(store
        .create_template(&draft(title, "Agriculture", Difficulty::Beginner))
        .await?)
}

pub fn sample_report(total_score: f64) -> FeedbackReport {
    FeedbackReport {
        total_score,
        category_scores: Category::ALL
            .iter()
            .map(|c| CategoryScore {
                name: *c,
                score: total_score,
                comment: format!("{} was adequate", c.as_str()),
            })
            .collect(),
        strengths: vec!["Clear pricing".to_string()],
        areas_for_improvement: vec!["Explain payment terms".to_string()],
        final_assessment: "A solid first pitch.".to_string(),
    }
}

pub enum ScorerBehavior {
    Report(FeedbackReport),
    Fail,
    Hang,
}

/// Scorer double that counts calls.
pub struct FakeScorer {
    behavior: ScorerBehavior,
    calls: AtomicUsize,
}

impl FakeScorer {
    pub fn new(behavior: ScorerBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn returning(report: FeedbackReport) -> Self {
        Self::new(ScorerBehavior::Report(report))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedbackScorer for FakeScorer {
    async fn score(&self, prompt: &str, _system: &str) -> Result<FeedbackReport, ScoringError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(prompt.starts_with("Transcript:\n"));

        match &self.behavior {
            ScorerBehavior::Report(report) => Ok(report.clone()),
            ScorerBehavior::Fail => Err(ScoringError::Api(500, "model overloaded".to_string())),
            ScorerBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(ScoringError::Network("unreachable".to_string()))
            }
        }
    }
}

/// Notifier double forwarding every notice to a channel.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<(UserId, FeedbackNotice)>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(UserId, FeedbackNotice)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl FeedbackNotifier for ChannelNotifier {
    async fn notify_feedback_ready(&self, user_id: UserId, notice: FeedbackNotice) {
        let _ = self.tx.send((user_id, notice));
    }
}

/// Notifier double that ignores everything.
pub struct NullNotifier;

#[async_trait]
impl FeedbackNotifier for NullNotifier {
    async fn notify_feedback_ready(&self, _user_id: UserId, _notice: FeedbackNotice) {}
}

/// Mailer double whose every send fails.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _email: &Email) -> Result<(), MailerError> {
        Err(MailerError::Api(503, "unavailable".to_string()))
    }
}
