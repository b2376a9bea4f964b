//! The mode controller: one governing source, one clamped power target.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, watch};
use uuid::Uuid;

use super::power::{PowerBand, PowerLimits};
use super::{ControllerError, ControllerEvent, Mode};

use crate::ant::ControlCommand;
use crate::telemetry::Telemetry;
use crate::track::TrackLibrary;

/// Capacity of the controller's event fan-out channel.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Arbitrates track progress, peer control commands, and trainer telemetry
/// into a single target-power stream.
pub struct ModeController {
    mode: Mode,
    band: PowerBand,
    limits: PowerLimits,
    library: Arc<TrackLibrary>,
    /// Accumulated ride distance in meters, reset on every mode switch
    distance: f64,
    /// Open ride-log session, if any
    session: Option<Uuid>,
    events: broadcast::Sender<ControllerEvent>,
}

impl ModeController {
    pub fn new(library: Arc<TrackLibrary>, band: PowerBand, limits: PowerLimits) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            mode: Mode::Idle,
            band,
            limits,
            library,
            distance: 0.0,
            session: None,
            events,
        }
    }

    /// Subscribe to controller events.
    pub fn subscribe(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    /// The currently governing mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch the governing mode.
    ///
    /// Always succeeds as an override of whatever is active, except when a
    /// requested track index is outside the loaded library: that is
    /// rejected and the current mode stays in force. Switching resets the
    /// accumulated ride distance; entering track following opens a fresh
    /// ride-log session.
    pub fn select_mode(&mut self, requested: Mode) -> Result<Mode, ControllerError> {
        let summary = match requested {
            Mode::TrackFollowing { track } => match self.library.get(track) {
                Ok(model) => Some(model.summary().clone()),
                Err(_) => {
                    tracing::warn!(index = track, "rejecting unknown track");
                    self.emit(ControllerEvent::TrackRejected { index: track });
                    return Err(ControllerError::TrackNotFound(track));
                }
            },
            _ => None,
        };

        // close an interrupted ride log before the override takes effect
        if let Some(session) = self.session.take() {
            self.emit(ControllerEvent::LoggingStopped { session });
        }

        self.distance = 0.0;
        self.mode = requested;
        tracing::info!(mode = %requested, "mode selected");

        if let Some(summary) = summary {
            let session = Uuid::new_v4();
            self.session = Some(session);
            self.emit(ControllerEvent::TrackSelected { summary });
            self.emit(ControllerEvent::LoggingStarted { session });
        }

        self.emit(ControllerEvent::ModeChanged { mode: requested });
        Ok(requested)
    }

    /// Feed one trainer telemetry sample.
    ///
    /// While track following, the sample's speed advances the ride distance
    /// by `speed * wall_dt` (the wall-clock gap between samples, not the
    /// trainer's own broadcast elapsed-time field), the track is queried at
    /// the new distance, and a grade-derived power target is emitted.
    /// Reaching the end of the track drops back to idle and closes the ride
    /// log exactly once. Other modes take no action here.
    pub fn on_telemetry(&mut self, telemetry: &Telemetry, wall_dt: Duration) {
        let Mode::TrackFollowing { track } = self.mode else {
            return;
        };
        let Ok(model) = self.library.get(track) else {
            // index was validated at selection; library is immutable
            return;
        };

        self.distance += telemetry.speed_mps() * wall_dt.as_secs_f64();
        let position = model.point_at_distance(self.distance);
        let finished = position.progress >= 1.0;

        self.emit_target(self.band.grade_to_power(position.grade));
        self.emit(ControllerEvent::TrackProgress(position));

        if finished {
            tracing::info!(mode = %self.mode, distance = self.distance.round(), "track completed");
            self.mode = Mode::Idle;
            if let Some(session) = self.session.take() {
                self.emit(ControllerEvent::LoggingStopped { session });
            }
            self.emit(ControllerEvent::ModeChanged { mode: Mode::Idle });
        }
    }

    /// Feed one decoded peer control command.
    ///
    /// Ignored entirely while a track governs the power target. From idle,
    /// the first power-bearing command implicitly takes direct control.
    pub fn on_control_command(&mut self, command: &ControlCommand) {
        if matches!(self.mode, Mode::TrackFollowing { .. }) {
            return;
        }

        let target = match command {
            ControlCommand::BasicResistance { permille } => {
                Some(self.band.fraction_to_power(f64::from(*permille) / 1000.0))
            }
            ControlCommand::TargetPower { watts } => Some(*watts),
            ControlCommand::TrackResistance {
                grade: Some(grade), ..
            } => {
                // wire grade is in 0.01 % units
                Some(self.band.grade_to_power(f64::from(*grade) / 10_000.0))
            }
            _ => None,
        };

        let Some(target) = target else {
            return;
        };

        if self.mode == Mode::Idle {
            self.mode = Mode::DirectControl;
            tracing::info!(mode = %self.mode, "peer command took direct control");
            self.emit(ControllerEvent::ModeChanged { mode: self.mode });
        }

        self.emit_target(target);
    }

    fn emit_target(&self, watts: u16) {
        self.emit(ControllerEvent::PowerTarget {
            watts: self.limits.clamp(watts),
        });
    }

    fn emit(&self, event: ControllerEvent) {
        // nobody listening is fine
        let _ = self.events.send(event);
    }
}

/// Consume the controller's three input streams until shutdown.
///
/// Mode requests, telemetry, and decoded control commands are serialized
/// through one task so every mutation is a single atomic step; the
/// wall-clock delta between telemetry samples is measured here.
pub async fn run(
    mut controller: ModeController,
    mut mode_rx: mpsc::Receiver<Mode>,
    mut telemetry_rx: mpsc::Receiver<Telemetry>,
    mut command_rx: mpsc::Receiver<ControlCommand>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut last_sample = tokio::time::Instant::now();

    tracing::info!("mode controller started");

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            request = mode_rx.recv() => match request {
                Some(mode) => {
                    if let Err(err) = controller.select_mode(mode) {
                        tracing::warn!(%err, "mode request rejected");
                    }
                }
                None => break,
            },
            sample = telemetry_rx.recv() => match sample {
                Some(telemetry) => {
                    let wall_dt = last_sample.elapsed();
                    last_sample = tokio::time::Instant::now();
                    controller.on_telemetry(&telemetry, wall_dt);
                }
                None => break,
            },
            command = command_rx.recv() => match command {
                Some(command) => controller.on_control_command(&command),
                None => break,
            },
        }
    }

    tracing::info!("mode controller stopped");
}
