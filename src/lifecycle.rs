//! Session lifecycle controller
//!
//! A pitching session is created `in_progress` when the user starts a
//! practice (paying its credit cost) and moves to `completed` exactly once,
//! after its feedback has been written. There is no other transition.

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{PitchError, PitchResult};
use crate::store::{self, SessionId, Store, TemplateId, UserId};

/// Credits charged for one practice session.
pub const DEFAULT_SESSION_COST: i64 = 1;

/// Outcome of a successful session start.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStart {
    pub session_id: SessionId,
    pub remaining_credit: i64,
}

#[derive(Debug, Clone)]
pub struct SessionLifecycle {
    store: Store,
    session_cost: i64,
}

impl SessionLifecycle {
    pub fn new(store: Store, session_cost: i64) -> Self {
        Self {
            store,
            session_cost,
        }
    }

    pub fn session_cost(&self) -> i64 {
        self.session_cost
    }

    /// Charge the user, count the template use and open a new session, all
    /// in one transaction. Nothing is written when any step fails.
    pub async fn start_session(
        &self,
        user_id: UserId,
        template_id: TemplateId,
    ) -> PitchResult<SessionStart> {
        if self.session_cost <= 0 {
            return Err(PitchError::InvalidInput(format!(
                "session cost must be positive, got {}",
                self.session_cost
            )));
        }

        let mut tx = self.store.pool().begin().await?;

        // Balance check and decrement are one statement.
        if !store::deduct_credit(&mut tx, user_id, self.session_cost).await? {
            let balance = store::credit_balance(&mut tx, user_id).await?;
            return match balance {
                None => Err(PitchError::not_found("user")),
                Some(available) => {
                    info!(
                        user_id,
                        template_id,
                        available,
                        required = self.session_cost,
                        "Session start refused: insufficient credit"
                    );
                    Err(PitchError::InsufficientCredit {
                        required: self.session_cost,
                        available,
                    })
                }
            };
        }

        if !store::increment_template_usage(&mut tx, template_id).await? {
            return Err(PitchError::not_found("template"));
        }

        let session_id = store::insert_session(&mut tx, user_id, template_id).await?;
        let remaining_credit = store::credit_balance(&mut tx, user_id)
            .await?
            .ok_or_else(|| PitchError::not_found("user"))?;

        tx.commit().await?;

        info!(
            user_id,
            template_id, session_id, remaining_credit, "Practice session started"
        );

        Ok(SessionStart {
            session_id,
            remaining_credit,
        })
    }

    /// Mark a session completed. Idempotent.
    pub async fn complete_session(&self, session_id: SessionId) -> PitchResult<()> {
        let mut conn = self.store.pool().acquire().await?;

        match store::complete_session_in(&mut conn, session_id).await {
            Ok(true) => {
                info!(session_id, "Practice session completed");
                Ok(())
            }
            Ok(false) => Ok(()),
            Err(e) => {
                warn!(session_id, "Failed to complete session: {}", e);
                Err(e)
            }
        }
    }
}
