use anyhow::{Context, Result};
use async_nats::Client;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use tracing::{info, warn};

use super::messages::{StartCallMessage, StopCallMessage, VoiceEvent};

/// Decoded events of one call
pub type VoiceEvents = Pin<Box<dyn Stream<Item = VoiceEvent> + Send>>;

/// NATS connection to the real-time voice channel for one call
pub struct VoiceClient {
    client: Client,
    call_id: String,
}

impl VoiceClient {
    /// Connect to the NATS server
    pub async fn connect(url: &str, call_id: String) -> Result<Self> {
        info!("Connecting to voice channel at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to voice channel");

        Ok(Self { client, call_id })
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Ask the voice channel to start the call
    pub async fn start_call(&self, message: &StartCallMessage) -> Result<()> {
        let subject = format!("voice.call.start.{}", self.call_id);

        let payload = serde_json::to_vec(message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish call start")?;

        info!("Published call start to {}", subject);

        Ok(())
    }

    /// Ask the voice channel to hang up
    pub async fn stop_call(&self) -> Result<()> {
        let subject = format!("voice.call.stop.{}", self.call_id);

        let message = StopCallMessage {
            call_id: self.call_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish call stop")?;

        info!("Published call stop to {}", subject);

        Ok(())
    }

    /// Subscribe to this call's events. Malformed messages are logged and
    /// skipped.
    pub async fn subscribe_events(&self) -> Result<VoiceEvents> {
        let subject = format!("voice.events.{}", self.call_id);

        info!("Subscribing to voice events on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .context("Failed to subscribe to voice events")?;

        let events: VoiceEvents = Box::pin(subscriber.filter_map(|msg| async move {
            match serde_json::from_slice::<VoiceEvent>(&msg.payload) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Failed to parse voice event: {}", e);
                    None
                }
            }
        }));

        Ok(events)
    }
}
