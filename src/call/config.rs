use serde::{Deserialize, Serialize};

use crate::config::VoiceConfig;
use crate::store::SessionId;

/// Configuration for one practice call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallConfig {
    /// Call identifier used in the voice channel subjects
    /// (e.g. "pitch-42-7b0c...")
    pub call_id: String,

    /// NATS server URL
    pub nats_url: String,

    /// Assistant profile the voice channel runs
    pub assistant_name: String,
}

impl CallConfig {
    pub fn for_session(session_id: SessionId, voice: &VoiceConfig) -> Self {
        Self {
            call_id: format!("pitch-{}-{}", session_id, uuid::Uuid::new_v4()),
            nats_url: voice.nats_url.clone(),
            assistant_name: voice.assistant_name.clone(),
        }
    }
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            call_id: format!("pitch-{}", uuid::Uuid::new_v4()),
            nats_url: "nats://localhost:4222".to_string(),
            assistant_name: "Pitcher".to_string(),
        }
    }
}
