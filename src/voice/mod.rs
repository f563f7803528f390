//! Real-time voice channel over NATS
//!
//! Subjects, per call:
//! - `voice.call.start.{call_id}` - start command carrying the question list
//! - `voice.call.stop.{call_id}` - hang-up command
//! - `voice.events.{call_id}` - lifecycle and transcript events

pub mod client;
pub mod messages;

pub use client::{VoiceClient, VoiceEvents};
pub use messages::{StartCallMessage, StopCallMessage, TranscriptKind, VoiceEvent};
