use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live statistics about a practice call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallStats {
    /// Whether the call is still running
    pub is_active: bool,

    /// Whether the assistant is currently speaking
    pub is_speaking: bool,

    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Number of final transcript turns received
    pub turns_count: usize,
}
