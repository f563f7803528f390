use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use super::prompt::{build_prompt, format_transcript, SYSTEM_INSTRUCTION};
use super::rubric::FeedbackReport;
use super::scorer::FeedbackScorer;
use crate::call::Turn;
use crate::error::{PitchError, PitchResult};
use crate::notify::{FeedbackNotice, FeedbackNotifier};
use crate::store::{self, FeedbackId, FeedbackRecord, SessionId, SessionStatus, Store, UserId};

/// Scores a finished call and stores the result.
#[derive(Clone)]
pub struct FeedbackGenerator {
    store: Store,
    scorer: Arc<dyn FeedbackScorer>,
    notifier: Arc<dyn FeedbackNotifier>,
    timeout: Duration,
}

impl FeedbackGenerator {
    pub fn new(
        store: Store,
        scorer: Arc<dyn FeedbackScorer>,
        notifier: Arc<dyn FeedbackNotifier>,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            scorer,
            notifier,
            timeout,
        }
    }

    /// Score `transcript` for a session the user owns and persist the result.
    ///
    /// With `existing_feedback_id` that row is overwritten and nothing else
    /// changes. Otherwise a new row is written and the session completed in
    /// the same transaction, after which the user is notified. A session
    /// that is already completed only accepts regeneration.
    pub async fn generate_feedback(
        &self,
        session_id: SessionId,
        user_id: UserId,
        transcript: &[Turn],
        existing_feedback_id: Option<FeedbackId>,
    ) -> PitchResult<FeedbackId> {
        let session = self
            .store
            .owned_session(session_id, user_id)
            .await?
            .ok_or_else(|| PitchError::not_found("session"))?;

        if existing_feedback_id.is_none() && session.status == SessionStatus::Completed {
            return Err(already_scored(session_id));
        }

        let formatted = format_transcript(transcript);
        let report = self.score(session_id, &formatted).await?;
        let record = to_record(session_id, user_id, &report, formatted)?;

        let mut tx = self.store.pool().begin().await?;

        let feedback_id = match existing_feedback_id {
            Some(id) => {
                record.replace(&mut tx, id).await?;
                id
            }
            None => {
                // A concurrent request may have completed the session since
                // it was read above; dropping `tx` rolls back.
                if !store::complete_session_in(&mut tx, session_id).await? {
                    return Err(already_scored(session_id));
                }
                record.insert(&mut tx).await?
            }
        };

        tx.commit().await?;

        info!(
            session_id,
            user_id,
            feedback_id,
            total_score = report.total_score,
            regenerated = existing_feedback_id.is_some(),
            "Feedback stored"
        );

        if existing_feedback_id.is_none() {
            let notice = FeedbackNotice {
                template_name: session.template_title,
                feedback_id,
                score: report.total_score,
                strengths: report.strengths,
                improvements: report.areas_for_improvement,
            };
            let notifier = Arc::clone(&self.notifier);
            tokio::spawn(async move {
                notifier.notify_feedback_ready(user_id, notice).await;
            });
        }

        Ok(feedback_id)
    }

    async fn score(&self, session_id: SessionId, transcript: &str) -> PitchResult<FeedbackReport> {
        let prompt = build_prompt(transcript);

        let report = match tokio::time::timeout(
            self.timeout,
            self.scorer.score(&prompt, SYSTEM_INSTRUCTION),
        )
        .await
        {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                error!(session_id, "Scoring failed: {}", e);
                return Err(PitchError::FeedbackGenerationFailed(e.to_string()));
            }
            Err(_) => {
                error!(session_id, timeout_secs = self.timeout.as_secs(), "Scoring timed out");
                return Err(PitchError::FeedbackGenerationFailed(
                    "scoring timed out".into(),
                ));
            }
        };

        // Every scorer's output must pass the rubric.
        if let Err(e) = report.validate() {
            warn!(session_id, "Scorer returned an invalid report: {}", e);
            return Err(PitchError::FeedbackGenerationFailed(e.to_string()));
        }

        Ok(report)
    }
}

fn already_scored(session_id: SessionId) -> PitchError {
    warn!(session_id, "Feedback requested for a completed session");
    PitchError::Conflict(
        "session already has feedback; pass its feedback id to regenerate".into(),
    )
}

fn to_record(
    session_id: SessionId,
    user_id: UserId,
    report: &FeedbackReport,
    transcript: String,
) -> PitchResult<FeedbackRecord> {
    Ok(FeedbackRecord {
        session_id,
        user_id,
        total_score: report.total_score,
        category_scores: encode(&report.category_scores)?,
        strengths: encode(&report.strengths)?,
        areas_for_improvement: encode(&report.areas_for_improvement)?,
        final_assessment: report.final_assessment.clone(),
        transcript,
    })
}

fn encode<T: Serialize>(value: &T) -> PitchResult<String> {
    serde_json::to_string(value).map_err(|e| PitchError::FeedbackGenerationFailed(e.to_string()))
}
