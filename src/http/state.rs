use crate::call::{PracticeCall, Turn};
use crate::config::VoiceConfig;
use crate::feedback::FeedbackGenerator;
use crate::lifecycle::SessionLifecycle;
use crate::store::{SessionId, Store};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A session's entry in the live calls map.
#[derive(Clone)]
pub enum CallSlot {
    /// Reserved while the voice channel is being connected
    Starting,
    Running(Arc<PracticeCall>),
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub lifecycle: SessionLifecycle,
    pub generator: FeedbackGenerator,
    pub voice: VoiceConfig,

    /// Live practice calls (session id → call)
    pub calls: Arc<RwLock<HashMap<SessionId, CallSlot>>>,

    /// Transcripts of stopped calls whose scoring failed, kept for a retry
    pub unscored: Arc<RwLock<HashMap<SessionId, Vec<Turn>>>>,
}

impl AppState {
    pub fn new(
        store: Store,
        lifecycle: SessionLifecycle,
        generator: FeedbackGenerator,
        voice: VoiceConfig,
    ) -> Self {
        Self {
            store,
            lifecycle,
            generator,
            voice,
            calls: Arc::new(RwLock::new(HashMap::new())),
            unscored: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}
