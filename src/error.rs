//! Domain error taxonomy shared by the lifecycle, feedback and account
//! operations.

use thiserror::Error;

/// Errors returned by the practice workflow and the store-backed services.
#[derive(Debug, Error)]
pub enum PitchError {
    /// A user, template, session or feedback row does not exist (or is not
    /// visible to the caller).
    #[error("{0} not found")]
    NotFound(String),

    /// The user cannot afford to start a session.
    #[error("insufficient credit: {required} required, {available} available")]
    InsufficientCredit { required: i64, available: i64 },

    /// The scoring call failed, timed out or returned an invalid payload.
    #[error("feedback generation failed: {0}")]
    FeedbackGenerationFailed(String),

    /// The store rejected a read or write.
    #[error("persistence failed: {0}")]
    PersistenceFailed(#[from] sqlx::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl PitchError {
    pub fn not_found(what: impl Into<String>) -> Self {
        PitchError::NotFound(what.into())
    }
}

pub type PitchResult<T> = Result<T, PitchError>;
