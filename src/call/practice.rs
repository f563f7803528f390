use super::config::CallConfig;
use super::stats::CallStats;
use super::transcript::{CallSignal, TranscriptAccumulator, Turn};
use crate::questions::format_question_variable;
use crate::voice::{StartCallMessage, VoiceClient, VoiceEvent};
use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{Stream, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Flags shared between a call and the task driving its events
#[derive(Debug, Default)]
pub struct CallFlags {
    pub is_active: AtomicBool,
    pub is_speaking: AtomicBool,
    pub turns_count: AtomicUsize,
}

/// One real-time voice conversation bound to a pitching session
pub struct PracticeCall {
    config: CallConfig,

    voice: Arc<VoiceClient>,

    started_at: chrono::DateTime<chrono::Utc>,

    flags: Arc<CallFlags>,

    /// Signals the event task to finish
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,

    /// Event task; yields the finished transcript
    task_handle: Mutex<Option<JoinHandle<Vec<Turn>>>>,
}

impl PracticeCall {
    pub async fn new(config: CallConfig) -> Result<Self> {
        info!("Creating practice call: {}", config.call_id);

        let voice = Arc::new(
            VoiceClient::connect(&config.nats_url, config.call_id.clone())
                .await
                .context("Failed to connect to voice channel")?,
        );

        Ok(Self {
            config,
            voice,
            started_at: Utc::now(),
            flags: Arc::new(CallFlags::default()),
            stop_tx: Mutex::new(None),
            task_handle: Mutex::new(None),
        })
    }

    pub fn call_id(&self) -> &str {
        &self.config.call_id
    }

    /// Start the call, handing the voice agent the template questions
    pub async fn start(&self, questions: &[String]) -> Result<()> {
        let mut handle = self.task_handle.lock().await;
        if handle.is_some() {
            warn!("Call already started");
            return Ok(());
        }

        info!("Starting practice call: {}", self.config.call_id);

        // Subscribe before starting so no early event is missed
        let events = self
            .voice
            .subscribe_events()
            .await
            .context("Failed to subscribe to voice events")?;

        let message = StartCallMessage::new(
            self.config.call_id.clone(),
            self.config.assistant_name.clone(),
            format_question_variable(questions),
        );
        self.voice
            .start_call(&message)
            .await
            .context("Failed to start voice call")?;

        self.flags.is_active.store(true, Ordering::SeqCst);

        let (stop_tx, stop_rx) = oneshot::channel();
        let flags = Arc::clone(&self.flags);
        *handle = Some(tokio::spawn(drive_events(events, stop_rx, flags)));
        *self.stop_tx.lock().await = Some(stop_tx);

        info!("Practice call started successfully");

        Ok(())
    }

    /// Hang up and return the ordered transcript. A call the voice channel
    /// already ended returns its transcript as well.
    pub async fn stop(&self) -> Result<Vec<Turn>> {
        let Some(task) = self.task_handle.lock().await.take() else {
            warn!("Call not started");
            return Ok(Vec::new());
        };

        info!("Stopping practice call: {}", self.config.call_id);

        if self.flags.is_active.load(Ordering::SeqCst) {
            if let Err(e) = self.voice.stop_call().await {
                error!("Failed to publish call stop: {}", e);
            }
        }

        if let Some(stop_tx) = self.stop_tx.lock().await.take() {
            // The task may already have exited on call-end
            let _ = stop_tx.send(());
        }

        let turns = task.await.context("Call event task panicked")?;

        info!(
            call_id = %self.config.call_id,
            turns = turns.len(),
            "Practice call stopped"
        );

        Ok(turns)
    }

    pub fn stats(&self) -> CallStats {
        let duration = Utc::now().signed_duration_since(self.started_at);

        CallStats {
            is_active: self.flags.is_active.load(Ordering::SeqCst),
            is_speaking: self.flags.is_speaking.load(Ordering::SeqCst),
            started_at: self.started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            turns_count: self.flags.turns_count.load(Ordering::SeqCst),
        }
    }
}

/// Feed voice events into a fresh accumulator until the call ends, the
/// stop signal fires or the stream closes. Returns the turns in order.
pub async fn drive_events<S>(
    mut events: S,
    mut stop_rx: oneshot::Receiver<()>,
    flags: Arc<CallFlags>,
) -> Vec<Turn>
where
    S: Stream<Item = VoiceEvent> + Unpin,
{
    info!("Call event task started");

    let mut transcript = TranscriptAccumulator::new();

    loop {
        tokio::select! {
            _ = &mut stop_rx => {
                break;
            }
            event = events.next() => {
                let Some(event) = event else {
                    warn!("Voice event stream closed");
                    break;
                };

                if let VoiceEvent::Error { message } = &event {
                    warn!("Voice channel error: {}", message);
                }

                match transcript.apply(&event) {
                    CallSignal::Continue => {}
                    CallSignal::SpeechStarted => flags.is_speaking.store(true, Ordering::SeqCst),
                    CallSignal::SpeechEnded => flags.is_speaking.store(false, Ordering::SeqCst),
                    CallSignal::Ended => {
                        info!("Voice channel ended the call");
                        break;
                    }
                }

                flags.turns_count.store(transcript.len(), Ordering::SeqCst);
            }
        }
    }

    flags.is_active.store(false, Ordering::SeqCst);
    flags.is_speaking.store(false, Ordering::SeqCst);
    flags.turns_count.store(transcript.len(), Ordering::SeqCst);

    info!("Call event task stopped");

    transcript.into_turns()
}
