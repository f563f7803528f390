mod common;

use anyhow::Result;
use common::{
    create_template, create_user, sample_report, test_store, ChannelNotifier, FailingMailer,
    FakeScorer, NullNotifier, ScorerBehavior,
};
use exportpitch::call::{Speaker, Turn};
use exportpitch::feedback::{FeedbackGenerator, FeedbackView};
use exportpitch::notify::NotificationDispatcher;
use exportpitch::store::{SessionStatus, Store};
use exportpitch::{PitchError, SessionLifecycle, DEFAULT_SESSION_COST};
use std::sync::Arc;
use std::time::Duration;

const SCORING_TIMEOUT: Duration = Duration::from_secs(5);

fn transcript() -> Vec<Turn> {
    vec![
        Turn::new(Speaker::Assistant, "What is your lead time to Hamburg?"),
        Turn::new(Speaker::User, "Four weeks from order, shipped CIF."),
    ]
}

async fn open_session(store: &Store) -> Result<(i64, i64)> {
    let user = create_user(store, "buyer-1", 5).await?;
    let template = create_template(store, "Coffee beans").await?;
    let lifecycle = SessionLifecycle::new(store.clone(), DEFAULT_SESSION_COST);
    let started = lifecycle.start_session(user.id, template.id).await?;
    Ok((user.id, started.session_id))
}

#[tokio::test]
async fn test_new_feedback_completes_session_and_notifies() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let (user_id, session_id) = open_session(&store).await?;

    let (notifier, mut notices) = ChannelNotifier::new();
    let generator = FeedbackGenerator::new(
        store.clone(),
        Arc::new(FakeScorer::returning(sample_report(78.0))),
        Arc::new(notifier),
        SCORING_TIMEOUT,
    );

    let feedback_id = generator
        .generate_feedback(session_id, user_id, &transcript(), None)
        .await?;

    let session = store.session_by_id(session_id).await?.unwrap();
    assert_eq!(session.status, SessionStatus::Completed);

    let row = store.feedback_by_id(feedback_id).await?.unwrap();
    assert!(row.transcript.contains("- user: Four weeks from order, shipped CIF."));
    let view = FeedbackView::try_from(row)?;
    assert_eq!(view.total_score, 78.0);
    assert_eq!(view.category_scores.len(), 5);
    assert_eq!(view.strengths, vec!["Clear pricing".to_string()]);

    let (notified_user, notice) = tokio::time::timeout(Duration::from_secs(2), notices.recv())
        .await?
        .expect("notice sent");
    assert_eq!(notified_user, user_id);
    assert_eq!(notice.feedback_id, feedback_id);
    assert_eq!(notice.template_name, "Coffee beans");
    assert_eq!(notice.score, 78.0);
    assert_eq!(notice.improvements, vec!["Explain payment terms".to_string()]);

    Ok(())
}

#[tokio::test]
async fn test_regeneration_updates_in_place() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let (user_id, session_id) = open_session(&store).await?;

    let first = FeedbackGenerator::new(
        store.clone(),
        Arc::new(FakeScorer::returning(sample_report(60.0))),
        Arc::new(NullNotifier),
        SCORING_TIMEOUT,
    );
    let feedback_id = first
        .generate_feedback(session_id, user_id, &transcript(), None)
        .await?;

    let (notifier, mut notices) = ChannelNotifier::new();
    let second = FeedbackGenerator::new(
        store.clone(),
        Arc::new(FakeScorer::returning(sample_report(85.0))),
        Arc::new(notifier),
        SCORING_TIMEOUT,
    );
    let regenerated = second
        .generate_feedback(session_id, user_id, &transcript(), Some(feedback_id))
        .await?;

    assert_eq!(regenerated, feedback_id);
    assert_eq!(store.feedback_count_for_session(session_id).await?, 1);
    assert_eq!(store.feedback_by_id(feedback_id).await?.unwrap().total_score, 85.0);

    let notice = tokio::time::timeout(Duration::from_millis(200), notices.recv()).await;
    assert!(!matches!(notice, Ok(Some(_))), "regeneration must not notify");

    Ok(())
}

#[tokio::test]
async fn test_regeneration_of_foreign_feedback_is_rejected() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let (user_id, session_id) = open_session(&store).await?;

    let generator = FeedbackGenerator::new(
        store.clone(),
        Arc::new(FakeScorer::returning(sample_report(70.0))),
        Arc::new(NullNotifier),
        SCORING_TIMEOUT,
    );

    let result = generator
        .generate_feedback(session_id, user_id, &transcript(), Some(12345))
        .await;

    assert!(matches!(result, Err(PitchError::NotFound(_))));
    assert_eq!(store.feedback_count_for_session(session_id).await?, 0);
    assert_eq!(
        store.session_by_id(session_id).await?.unwrap().status,
        SessionStatus::InProgress
    );

    Ok(())
}

#[tokio::test]
async fn test_scorer_failure_writes_nothing() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let (user_id, session_id) = open_session(&store).await?;

    let generator = FeedbackGenerator::new(
        store.clone(),
        Arc::new(FakeScorer::new(ScorerBehavior::Fail)),
        Arc::new(NullNotifier),
        SCORING_TIMEOUT,
    );

    let result = generator
        .generate_feedback(session_id, user_id, &transcript(), None)
        .await;

    assert!(matches!(result, Err(PitchError::FeedbackGenerationFailed(_))));
    assert_eq!(store.feedback_count_for_session(session_id).await?, 0);
    assert_eq!(
        store.session_by_id(session_id).await?.unwrap().status,
        SessionStatus::InProgress
    );

    Ok(())
}

#[tokio::test]
async fn test_scorer_timeout_is_a_generation_failure() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let (user_id, session_id) = open_session(&store).await?;

    let generator = FeedbackGenerator::new(
        store.clone(),
        Arc::new(FakeScorer::new(ScorerBehavior::Hang)),
        Arc::new(NullNotifier),
        Duration::from_millis(50),
    );

    let result = generator
        .generate_feedback(session_id, user_id, &transcript(), None)
        .await;

    assert!(matches!(result, Err(PitchError::FeedbackGenerationFailed(_))));
    assert_eq!(store.feedback_count_for_session(session_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_invalid_report_is_rejected() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let (user_id, session_id) = open_session(&store).await?;

    let mut report = sample_report(70.0);
    report.category_scores.pop();

    let generator = FeedbackGenerator::new(
        store.clone(),
        Arc::new(FakeScorer::returning(report)),
        Arc::new(NullNotifier),
        SCORING_TIMEOUT,
    );

    let result = generator
        .generate_feedback(session_id, user_id, &transcript(), None)
        .await;

    assert!(matches!(result, Err(PitchError::FeedbackGenerationFailed(_))));
    assert_eq!(store.feedback_count_for_session(session_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_foreign_session_is_not_scored() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let (_owner, session_id) = open_session(&store).await?;
    let stranger = create_user(&store, "buyer-2", 5).await?;

    let scorer = Arc::new(FakeScorer::returning(sample_report(70.0)));
    let generator = FeedbackGenerator::new(
        store.clone(),
        scorer.clone(),
        Arc::new(NullNotifier),
        SCORING_TIMEOUT,
    );

    let result = generator
        .generate_feedback(session_id, stranger.id, &transcript(), None)
        .await;

    assert!(matches!(result, Err(PitchError::NotFound(_))));
    assert_eq!(scorer.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_second_feedback_for_completed_session_is_rejected() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let (user_id, session_id) = open_session(&store).await?;

    let (notifier, mut notices) = ChannelNotifier::new();
    let scorer = Arc::new(FakeScorer::returning(sample_report(70.0)));
    let generator = FeedbackGenerator::new(
        store.clone(),
        scorer.clone(),
        Arc::new(notifier),
        SCORING_TIMEOUT,
    );

    generator
        .generate_feedback(session_id, user_id, &transcript(), None)
        .await?;
    let retry = generator
        .generate_feedback(session_id, user_id, &transcript(), None)
        .await;

    assert!(matches!(retry, Err(PitchError::Conflict(_))));
    assert_eq!(store.feedback_count_for_session(session_id).await?, 1);
    assert_eq!(scorer.calls(), 1);

    let first = tokio::time::timeout(Duration::from_secs(2), notices.recv()).await?;
    assert!(first.is_some());
    let second = tokio::time::timeout(Duration::from_millis(200), notices.recv()).await;
    assert!(!matches!(second, Ok(Some(_))), "only the first feedback notifies");

    Ok(())
}

#[tokio::test]
async fn test_mail_failure_does_not_affect_feedback() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let (user_id, session_id) = open_session(&store).await?;

    let dispatcher =
        NotificationDispatcher::new(store.clone(), Arc::new(FailingMailer), "https://app.test");
    let generator = FeedbackGenerator::new(
        store.clone(),
        Arc::new(FakeScorer::returning(sample_report(64.0))),
        Arc::new(dispatcher),
        SCORING_TIMEOUT,
    );

    let feedback_id = generator
        .generate_feedback(session_id, user_id, &transcript(), None)
        .await?;

    // Let the detached notification run and fail.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let row = store.feedback_by_id(feedback_id).await?.unwrap();
    assert_eq!(row.session_id, session_id);
    assert_eq!(row.total_score, 64.0);
    assert_eq!(
        store.session_by_id(session_id).await?.unwrap().status,
        SessionStatus::Completed
    );
    assert_eq!(store.feedback_count_for_session(session_id).await?, 1);

    Ok(())
}
