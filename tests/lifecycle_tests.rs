mod common;

use anyhow::Result;
use common::{
    create_template, create_user, credit_of, sample_report, session_count, test_store,
    FakeScorer, NullNotifier,
};
use exportpitch::call::{Speaker, Turn};
use exportpitch::feedback::{FeedbackGenerator, FeedbackView};
use exportpitch::store::SessionStatus;
use exportpitch::{PitchError, SessionLifecycle, DEFAULT_SESSION_COST};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_start_session_charges_and_counts_usage() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let user = create_user(&store, "buyer-1", 5).await?;
    let template = create_template(&store, "Coffee beans").await?;

    sqlx::query("UPDATE practice_templates SET usage_count = 3 WHERE id = ?")
        .bind(template.id)
        .execute(store.pool())
        .await?;

    let lifecycle = SessionLifecycle::new(store.clone(), DEFAULT_SESSION_COST);
    let started = lifecycle.start_session(user.id, template.id).await?;

    assert_eq!(started.remaining_credit, 4);
    assert_eq!(credit_of(&store, user.id).await?, 4);

    let template = store.template_by_id(template.id).await?.unwrap();
    assert_eq!(template.usage_count, 4);

    let session = store.session_by_id(started.session_id).await?.unwrap();
    assert_eq!(session.status, SessionStatus::InProgress);
    assert_eq!(session.user_id, user.id);
    assert!(session.completed_at.is_none());

    Ok(())
}

#[tokio::test]
async fn test_insufficient_credit_writes_nothing() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let user = create_user(&store, "buyer-1", 0).await?;
    let template = create_template(&store, "Coffee beans").await?;

    let lifecycle = SessionLifecycle::new(store.clone(), DEFAULT_SESSION_COST);
    let result = lifecycle.start_session(user.id, template.id).await;

    assert!(matches!(
        result,
        Err(PitchError::InsufficientCredit {
            required: 1,
            available: 0
        })
    ));
    assert_eq!(credit_of(&store, user.id).await?, 0);
    assert_eq!(session_count(&store).await?, 0);
    assert_eq!(store.template_by_id(template.id).await?.unwrap().usage_count, 0);

    Ok(())
}

#[tokio::test]
async fn test_configured_cost_is_charged() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let user = create_user(&store, "buyer-1", 3).await?;
    let template = create_template(&store, "Coffee beans").await?;

    let lifecycle = SessionLifecycle::new(store.clone(), 2);

    let started = lifecycle.start_session(user.id, template.id).await?;
    assert_eq!(started.remaining_credit, 1);

    assert!(matches!(
        lifecycle.start_session(user.id, template.id).await,
        Err(PitchError::InsufficientCredit {
            required: 2,
            available: 1
        })
    ));

    Ok(())
}

#[tokio::test]
async fn test_unknown_template_rolls_back_charge() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let user = create_user(&store, "buyer-1", 5).await?;

    let lifecycle = SessionLifecycle::new(store.clone(), DEFAULT_SESSION_COST);
    let result = lifecycle.start_session(user.id, 999).await;

    assert!(matches!(result, Err(PitchError::NotFound(_))));
    assert_eq!(credit_of(&store, user.id).await?, 5);
    assert_eq!(session_count(&store).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_inactive_template_cannot_be_started() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let user = create_user(&store, "buyer-1", 5).await?;
    let template = create_template(&store, "Coffee beans").await?;

    let mut draft = common::draft("Coffee beans", "Agriculture", template.difficulty);
    draft.is_active = false;
    store.update_template(template.id, &draft).await?;

    let lifecycle = SessionLifecycle::new(store.clone(), DEFAULT_SESSION_COST);
    let result = lifecycle.start_session(user.id, template.id).await;

    assert!(matches!(result, Err(PitchError::NotFound(_))));
    assert_eq!(credit_of(&store, user.id).await?, 5);

    Ok(())
}

#[tokio::test]
async fn test_unknown_user_is_not_found() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let template = create_template(&store, "Coffee beans").await?;

    let lifecycle = SessionLifecycle::new(store.clone(), DEFAULT_SESSION_COST);
    let result = lifecycle.start_session(42, template.id).await;

    assert!(matches!(result, Err(PitchError::NotFound(_))));
    assert_eq!(store.template_by_id(template.id).await?.unwrap().usage_count, 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_never_overspend() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let user = create_user(&store, "buyer-1", 1).await?;
    let template = create_template(&store, "Coffee beans").await?;

    let lifecycle = SessionLifecycle::new(store.clone(), DEFAULT_SESSION_COST);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let lifecycle = lifecycle.clone();
            let (user_id, template_id) = (user.id, template.id);
            tokio::spawn(async move { lifecycle.start_session(user_id, template_id).await })
        })
        .collect();

    let mut started = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => started += 1,
            Err(PitchError::InsufficientCredit { .. }) => refused += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!((started, refused), (1, 1));
    assert_eq!(credit_of(&store, user.id).await?, 0);
    assert_eq!(session_count(&store).await?, 1);
    assert_eq!(store.template_by_id(template.id).await?.unwrap().usage_count, 1);

    Ok(())
}

#[tokio::test]
async fn test_complete_session_is_idempotent() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let user = create_user(&store, "buyer-1", 5).await?;
    let template = create_template(&store, "Coffee beans").await?;

    let lifecycle = SessionLifecycle::new(store.clone(), DEFAULT_SESSION_COST);
    let started = lifecycle.start_session(user.id, template.id).await?;

    lifecycle.complete_session(started.session_id).await?;
    let first = store.session_by_id(started.session_id).await?.unwrap();
    assert_eq!(first.status, SessionStatus::Completed);
    assert!(first.completed_at.is_some());

    lifecycle.complete_session(started.session_id).await?;
    let second = store.session_by_id(started.session_id).await?.unwrap();
    assert_eq!(second.status, SessionStatus::Completed);
    assert_eq!(second.completed_at, first.completed_at);

    Ok(())
}

#[tokio::test]
async fn test_complete_unknown_session() -> Result<()> {
    let (_dir, store) = test_store().await?;

    let lifecycle = SessionLifecycle::new(store, DEFAULT_SESSION_COST);

    assert!(matches!(
        lifecycle.complete_session(77).await,
        Err(PitchError::NotFound(_))
    ));

    Ok(())
}

#[tokio::test]
async fn test_non_positive_cost_is_refused() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let user = create_user(&store, "buyer-1", 0).await?;
    let template = create_template(&store, "Coffee beans").await?;

    for cost in [0, -10] {
        let lifecycle = SessionLifecycle::new(store.clone(), cost);
        let result = lifecycle.start_session(user.id, template.id).await;
        assert!(matches!(result, Err(PitchError::InvalidInput(_))));
    }

    assert_eq!(credit_of(&store, user.id).await?, 0);
    assert_eq!(session_count(&store).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_practice_from_start_to_feedback() -> Result<()> {
    let (_dir, store) = test_store().await?;
    let user = create_user(&store, "buyer-1", 10).await?;
    let template = create_template(&store, "Coffee beans").await?;

    sqlx::query("UPDATE practice_templates SET usage_count = 3 WHERE id = ?")
        .bind(template.id)
        .execute(store.pool())
        .await?;

    let lifecycle = SessionLifecycle::new(store.clone(), DEFAULT_SESSION_COST);
    let started = lifecycle.start_session(user.id, template.id).await?;

    assert_eq!(started.remaining_credit, 10 - DEFAULT_SESSION_COST);
    assert_eq!(store.template_by_id(template.id).await?.unwrap().usage_count, 4);

    let transcript = vec![
        Turn::new(Speaker::Assistant, "Tell me about your coffee."),
        Turn::new(Speaker::User, "Washed arabica from Nyeri, grade AA."),
        Turn::new(Speaker::Assistant, "What volumes can you ship each quarter?"),
    ];

    let generator = FeedbackGenerator::new(
        store.clone(),
        Arc::new(FakeScorer::returning(sample_report(82.0))),
        Arc::new(NullNotifier),
        Duration::from_secs(5),
    );
    let feedback_id = generator
        .generate_feedback(started.session_id, user.id, &transcript, None)
        .await?;

    let session = store.session_by_id(started.session_id).await?.unwrap();
    assert_eq!(session.status, SessionStatus::Completed);
    assert!(session.completed_at.is_some());
    assert_eq!(credit_of(&store, user.id).await?, 10 - DEFAULT_SESSION_COST);

    let row = store.feedback_by_id(feedback_id).await?.unwrap();
    assert_eq!(row.session_id, started.session_id);
    assert_eq!(row.transcript.lines().count(), 3);
    let view = FeedbackView::try_from(row)?;
    assert_eq!(view.total_score, 82.0);
    assert_eq!(store.feedback_count_for_session(started.session_id).await?, 1);

    Ok(())
}
