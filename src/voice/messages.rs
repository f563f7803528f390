use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::call::Speaker;

/// Command asking the voice channel to start a call
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallMessage {
    pub call_id: String,
    /// Assistant profile the voice channel should run
    pub assistant: String,
    /// Template variables substituted into the assistant prompt
    pub variable_values: HashMap<String, String>,
    pub timestamp: String, // RFC3339 timestamp
}

impl StartCallMessage {
    /// Start command whose `questions` variable carries the formatted list
    pub fn new(call_id: impl Into<String>, assistant: impl Into<String>, questions: String) -> Self {
        Self {
            call_id: call_id.into(),
            assistant: assistant.into(),
            variable_values: HashMap::from([("questions".to_string(), questions)]),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Command asking the voice channel to hang up
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopCallMessage {
    pub call_id: String,
    pub timestamp: String,
}

/// Whether a transcript message is interim or settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptKind {
    Partial,
    Final,
}

/// Event emitted by the voice channel during a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum VoiceEvent {
    CallStart,
    CallEnd,
    SpeechStart,
    SpeechEnd,
    Error {
        message: String,
    },
    Transcript {
        role: Speaker,
        #[serde(rename = "transcriptType")]
        kind: TranscriptKind,
        transcript: String,
    },
}
