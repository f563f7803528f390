//! Practice call management
//!
//! A `PracticeCall` runs one voice conversation for a pitching session:
//! it starts the call on the voice channel, collects final transcript turns
//! in a `TranscriptAccumulator` owned by its event task and reports live
//! statistics until the call is stopped or ended by the channel.

mod config;
mod practice;
mod stats;
mod transcript;

pub use config::CallConfig;
pub use practice::{drive_events, CallFlags, PracticeCall};
pub use stats::CallStats;
pub use transcript::{CallSignal, Speaker, TranscriptAccumulator, Turn};
