//! Publish/subscribe bus interface.
//!
//! The broker connection itself lives outside this crate; here is the seam
//! it plugs into: a [`PublishSink`] trait, the retained-state envelope all
//! components share, the topic map, and an [`EventPublisher`] that turns
//! controller events into bus traffic.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, watch};

use crate::control::{ControllerEvent, Mode};

/// Currently governing mode, retained.
pub const TOPIC_TRACK_MODE: &str = "controller/trackMode";
/// Selected track overview, retained.
pub const TOPIC_TRACK: &str = "controller/track";
/// All loaded track overviews, retained.
pub const TOPIC_TRACKS: &str = "controller/tracks";
/// Interpolated ride position while following a track, retained.
pub const TOPIC_LOCATION: &str = "controller/location";
/// Target power command for the physical trainer.
pub const TOPIC_POWER_COMMAND: &str = "trainer/cmnd/power";
/// Reset command for the physical trainer.
pub const TOPIC_RESET_COMMAND: &str = "trainer/cmnd/reset";
/// Ride logger start command.
pub const TOPIC_LOGGER_START: &str = "logger/cmnd/start";
/// Ride logger stop command.
pub const TOPIC_LOGGER_STOP: &str = "logger/cmnd/stop";

/// Bus-related errors.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("publish failed: {0}")]
    PublishFailed(String),

    #[error("not connected")]
    NotConnected,
}

/// Seam for the message bus client.
pub trait PublishSink: Send + Sync {
    /// Publish `payload` under `base_topic/topic`; `retain` keeps the last
    /// value on the broker for late subscribers.
    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BusError>;
}

/// Retained-state envelope wrapping every published payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub payload: T,
    /// Unix timestamp in seconds
    #[serde(rename = "_timestamp")]
    pub timestamp: i64,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap a payload with the current time.
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Maps controller events onto bus topics.
///
/// Publish failures are logged and dropped; a missing broker never stalls
/// arbitration.
pub struct EventPublisher<S> {
    sink: S,
    base_topic: String,
}

impl<S: PublishSink> EventPublisher<S> {
    pub fn new(sink: S, base_topic: impl Into<String>) -> Self {
        Self {
            sink,
            base_topic: base_topic.into(),
        }
    }

    /// Announce the loaded track overviews, retained for late subscribers.
    pub fn publish_track_list(&self, summaries: &[&crate::track::TrackSummary]) {
        if let Err(err) = self.publish_retained(TOPIC_TRACKS, &summaries) {
            tracing::warn!(%err, "dropping track list publish");
        }
    }

    /// Publish one controller event.
    pub fn handle(&self, event: &ControllerEvent) {
        let result = match event {
            ControllerEvent::PowerTarget { watts } => {
                self.publish(TOPIC_POWER_COMMAND, &watts.to_string(), false)
            }
            ControllerEvent::TrackProgress(position) => {
                self.publish_retained(TOPIC_LOCATION, position)
            }
            ControllerEvent::ModeChanged { mode } => {
                let value = match mode {
                    Mode::Idle => None,
                    Mode::TrackFollowing { .. } => Some("track"),
                    Mode::DirectControl => Some("direct"),
                };
                let retained = self.publish_retained(TOPIC_TRACK_MODE, &value);
                // a fresh track selection also resets the trainer
                if retained.is_ok() && matches!(mode, Mode::TrackFollowing { .. }) {
                    self.publish(TOPIC_RESET_COMMAND, "", false)
                } else {
                    retained
                }
            }
            ControllerEvent::TrackSelected { summary } => {
                self.publish_retained(TOPIC_TRACK, summary)
            }
            ControllerEvent::TrackRejected { index } => self.publish_retained(
                TOPIC_TRACK,
                &serde_json::json!({ "error": format!("no track at index {index}") }),
            ),
            ControllerEvent::LoggingStarted { session } => self.publish(
                TOPIC_LOGGER_START,
                &serde_json::json!({ "logLocation": true, "session": session }).to_string(),
                false,
            ),
            ControllerEvent::LoggingStopped { .. } => self.publish(TOPIC_LOGGER_STOP, "", false),
        };

        if let Err(err) = result {
            tracing::warn!(%err, "dropping bus publish");
        }
    }

    /// Forward controller events to the bus until shutdown.
    pub async fn run(
        self,
        mut events: broadcast::Receiver<ControllerEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                event = events.recv() => match event {
                    Ok(event) => self.handle(&event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event publisher lagging");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }

    fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BusError> {
        self.sink
            .publish(&format!("{}/{}", self.base_topic, topic), payload, retain)
    }

    fn publish_retained<T: Serialize>(&self, topic: &str, payload: &T) -> Result<(), BusError> {
        let json = Envelope::new(payload)
            .to_json()
            .map_err(|err| BusError::PublishFailed(err.to_string()))?;
        self.publish(topic, &json, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        published: Mutex<Vec<(String, String, bool)>>,
    }

    impl PublishSink for &RecordingSink {
        fn publish(&self, topic: &str, payload: &str, retain: bool) -> Result<(), BusError> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload.to_string(), retain));
            Ok(())
        }
    }

    #[test]
    fn test_envelope_uses_underscore_timestamp_key() {
        let json = Envelope::new(7).to_json().unwrap();
        assert!(json.contains("\"_timestamp\""));
        assert!(json.contains("\"payload\":7"));
    }

    #[test]
    fn test_power_target_published_as_bare_integer() {
        let sink = RecordingSink::default();
        let publisher = EventPublisher::new(&sink, "velobridge");

        publisher.handle(&ControllerEvent::PowerTarget { watts: 180 });

        let published = sink.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "velobridge/trainer/cmnd/power");
        assert_eq!(published[0].1, "180");
        assert!(!published[0].2);
    }

    #[test]
    fn test_track_mode_retained_and_reset_sent() {
        let sink = RecordingSink::default();
        let publisher = EventPublisher::new(&sink, "velobridge");

        publisher.handle(&ControllerEvent::ModeChanged {
            mode: Mode::TrackFollowing { track: 0 },
        });

        let published = sink.published.lock().unwrap();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].0, "velobridge/controller/trackMode");
        assert!(published[0].1.contains("\"track\""));
        assert!(published[0].2);
        assert_eq!(published[1].0, "velobridge/trainer/cmnd/reset");
    }

    #[test]
    fn test_idle_mode_publishes_null() {
        let sink = RecordingSink::default();
        let publisher = EventPublisher::new(&sink, "velobridge");

        publisher.handle(&ControllerEvent::ModeChanged { mode: Mode::Idle });

        let published = sink.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert!(published[0].1.contains("\"payload\":null"));
    }
}
