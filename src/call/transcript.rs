use serde::{Deserialize, Serialize};
use std::fmt;

use crate::voice::{TranscriptKind, VoiceEvent};

/// Who spoke a transcript turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
    System,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Speaker::User => "user",
            Speaker::Assistant => "assistant",
            Speaker::System => "system",
        };
        f.write_str(name)
    }
}

/// One finalized utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Speaker,
    pub content: String,
}

impl Turn {
    pub fn new(role: Speaker, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// What an event means for the call driving the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSignal {
    Continue,
    SpeechStarted,
    SpeechEnded,
    Ended,
}

/// Ordered, append-only transcript of one call.
///
/// Only final transcript events become turns; partial (interim) results are
/// superseded by their final version and dropped.
#[derive(Debug, Default)]
pub struct TranscriptAccumulator {
    turns: Vec<Turn>,
}

impl TranscriptAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn apply(&mut self, event: &VoiceEvent) -> CallSignal {
        match event {
            VoiceEvent::Transcript {
                role,
                kind: TranscriptKind::Final,
                transcript,
            } => {
                self.push(Turn::new(*role, transcript.clone()));
                CallSignal::Continue
            }
            VoiceEvent::Transcript { .. } => CallSignal::Continue,
            VoiceEvent::SpeechStart => CallSignal::SpeechStarted,
            VoiceEvent::SpeechEnd => CallSignal::SpeechEnded,
            VoiceEvent::CallEnd => CallSignal::Ended,
            VoiceEvent::CallStart | VoiceEvent::Error { .. } => CallSignal::Continue,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn into_turns(self) -> Vec<Turn> {
        self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript(role: Speaker, kind: TranscriptKind, text: &str) -> VoiceEvent {
        VoiceEvent::Transcript {
            role,
            kind,
            transcript: text.to_string(),
        }
    }

    #[test]
    fn test_partial_transcripts_are_dropped() {
        let mut acc = TranscriptAccumulator::new();

        acc.apply(&transcript(Speaker::User, TranscriptKind::Partial, "We ship"));
        acc.apply(&transcript(Speaker::User, TranscriptKind::Final, "We ship weekly"));

        assert_eq!(acc.turns(), &[Turn::new(Speaker::User, "We ship weekly")]);
    }

    #[test]
    fn test_turn_order_is_arrival_order() {
        let mut acc = TranscriptAccumulator::new();

        acc.apply(&transcript(Speaker::Assistant, TranscriptKind::Final, "Price?"));
        acc.apply(&transcript(Speaker::User, TranscriptKind::Final, "FOB 4 USD"));
        acc.push(Turn::new(Speaker::System, "note"));

        let roles: Vec<Speaker> = acc.turns().iter().map(|t| t.role).collect();
        assert_eq!(roles, vec![Speaker::Assistant, Speaker::User, Speaker::System]);
        assert_eq!(acc.len(), 3);
    }

    #[test]
    fn test_call_end_signal() {
        let mut acc = TranscriptAccumulator::new();

        assert_eq!(acc.apply(&VoiceEvent::CallStart), CallSignal::Continue);
        assert_eq!(acc.apply(&VoiceEvent::SpeechStart), CallSignal::SpeechStarted);
        assert_eq!(acc.apply(&VoiceEvent::CallEnd), CallSignal::Ended);
        assert!(acc.is_empty());
    }
}
