//! FE-C broadcast cycle driver.
//!
//! Owns the tick counter, the bike-page event counter, and the shared
//! [`TrainerState`]. One [`FecBroadcaster::broadcast_cycle`] per channel
//! period encodes the scheduled page, hands it to the transport, and drains
//! decoded control commands toward the mode controller. The async
//! [`FecBroadcaster::run`] loop drives cycles at the 0.25 s cadence; tests
//! single-step cycles directly without wall-clock delay.

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use super::commands::{self, ControlCommand};
use super::pages::{self, TrainerState};
use super::scheduler::{page_for_tick, PageKind};
use super::{PageTransport, TransportError, CHANNEL_PERIOD};

use crate::telemetry::Telemetry;

/// Broadcast interval derived from the channel period (8192/32768 s).
pub const BROADCAST_INTERVAL: Duration =
    Duration::from_millis(CHANNEL_PERIOD as u64 * 1000 / 32768);

/// Transmit-side state machine for one FE-C channel.
pub struct FecBroadcaster {
    tick: u64,
    update_event: u8,
    state: TrainerState,
    command_tx: mpsc::Sender<ControlCommand>,
}

impl FecBroadcaster {
    /// Create a broadcaster forwarding decoded control commands to `command_tx`.
    pub fn new(command_tx: mpsc::Sender<ControlCommand>) -> Self {
        Self {
            tick: 0,
            update_event: 0,
            state: TrainerState::default(),
            command_tx,
        }
    }

    /// Current broadcast tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Read access to the broadcast state, mainly for tests and diagnostics.
    pub fn state(&self) -> &TrainerState {
        &self.state
    }

    /// Reset the rotation phase after a transport reconnect.
    ///
    /// Only cosmetic: the peer re-synchronizes on the next identification
    /// pages.
    pub fn reset(&mut self) {
        self.tick = 0;
    }

    /// Fold a telemetry sample into the broadcast state.
    pub fn apply_telemetry(&mut self, telemetry: &Telemetry) -> Result<(), crate::telemetry::TelemetryError> {
        telemetry.apply_to(&mut self.state)
    }

    /// Overlay a heart-rate reading from an external monitor.
    pub fn set_heart_rate(&mut self, bpm: Option<u8>) {
        self.state.instant_heart_rate = bpm;
    }

    /// Run one broadcast cycle: encode the scheduled page, send it, drain
    /// inbound control pages.
    ///
    /// The tick advances exactly once per attempted send, failed or not, so
    /// transport hiccups never shift the rotation phase.
    pub fn broadcast_cycle(
        &mut self,
        transport: &mut dyn PageTransport,
    ) -> Result<(), TransportError> {
        let page = match page_for_tick(self.tick) {
            PageKind::General => pages::general(&self.state),
            PageKind::Settings => pages::settings(&self.state),
            PageKind::StationaryBike => {
                let page = pages::stationary_bike(&mut self.state, self.update_event);
                self.update_event = self.update_event.wrapping_add(1);
                page
            }
            PageKind::Vendor => pages::vendor(),
            PageKind::Product => pages::product(),
        };

        let sent = transport.send_broadcast(page);
        self.tick += 1;
        sent?;

        while let Some(raw) = transport.poll_inbound()? {
            let command = commands::decode(&raw);
            if let ControlCommand::Unknown { page, .. } = command {
                tracing::debug!(page, "ignoring unrecognized control page");
                continue;
            }
            if self.command_tx.try_send(command).is_err() {
                tracing::warn!("control command channel full, dropping command");
            }
        }

        Ok(())
    }

    /// Drive broadcast cycles at the channel period until shutdown.
    ///
    /// Telemetry samples are folded into the broadcast state as they
    /// arrive; malformed samples are dropped and the previous state stays
    /// on the air. Transport errors are logged and the loop continues, the
    /// tick-advance rule keeping the rotation phase intact.
    pub async fn run(
        mut self,
        mut transport: Box<dyn PageTransport>,
        mut telemetry_rx: mpsc::Receiver<Telemetry>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut interval = tokio::time::interval(BROADCAST_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        tracing::info!("FE-C broadcast loop started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                sample = telemetry_rx.recv() => match sample {
                    Some(telemetry) => {
                        if let Err(err) = self.apply_telemetry(&telemetry) {
                            tracing::warn!(%err, "dropping malformed telemetry sample");
                        }
                    }
                    None => break,
                },
                _ = interval.tick() => {
                    if let Err(err) = self.broadcast_cycle(transport.as_mut()) {
                        tracing::warn!(%err, tick = self.tick, "broadcast failed");
                    }
                }
            }
        }

        tracing::info!("FE-C broadcast loop stopped");
    }
}
