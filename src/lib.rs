pub mod call;
pub mod config;
pub mod error;
pub mod feedback;
pub mod http;
pub mod lifecycle;
pub mod notify;
pub mod questions;
pub mod store;
pub mod voice;

pub use call::{CallConfig, CallStats, PracticeCall, Speaker, TranscriptAccumulator, Turn};
pub use config::Config;
pub use error::{PitchError, PitchResult};
pub use feedback::{FeedbackGenerator, FeedbackReport, FeedbackScorer, HttpScorer};
pub use http::{create_router, AppState, CallSlot};
pub use lifecycle::{SessionLifecycle, SessionStart, DEFAULT_SESSION_COST};
pub use notify::{FeedbackNotice, FeedbackNotifier, NotificationDispatcher};
pub use store::Store;
pub use voice::{VoiceClient, VoiceEvent};
