//! Power arbitration and mode control.
//!
//! Exactly one control source governs the trainer's target power at any
//! time: a selected virtual track, a peer's FE-C control commands, or
//! nobody (idle). The [`ModeController`] reconciles those sources into one
//! clamped power value and announces everything it does on a broadcast
//! event channel.

pub mod controller;
pub mod power;

pub use controller::ModeController;
pub use power::{PowerBand, PowerLimits};

use thiserror::Error;
use uuid::Uuid;

use crate::track::TrackPosition;

/// The currently governing control source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// No source active, target power untouched
    Idle,
    /// Following the loaded track at the given library index
    TrackFollowing { track: usize },
    /// A paired peer steers power via control commands
    DirectControl,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Idle => write!(f, "idle"),
            Mode::TrackFollowing { track } => write!(f, "track:{track}"),
            Mode::DirectControl => write!(f, "direct"),
        }
    }
}

/// Events announced by the mode controller.
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// The governing mode changed
    ModeChanged { mode: Mode },
    /// A track was selected; carries its overview for display
    TrackSelected { summary: crate::track::TrackSummary },
    /// A track selection was rejected
    TrackRejected { index: usize },
    /// New clamped target power for the physical trainer
    PowerTarget { watts: u16 },
    /// Position update while following a track
    TrackProgress(TrackPosition),
    /// A ride log session should start
    LoggingStarted { session: Uuid },
    /// The ride log session should stop
    LoggingStopped { session: Uuid },
}

/// Errors from mode selection.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Requested track index is outside the loaded library
    #[error("no track at index {0}")]
    TrackNotFound(usize),
}
