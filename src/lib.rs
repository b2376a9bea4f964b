//! VeloBridge - Virtual Trainer Bridge
//!
//! Emulates an ANT+ FE-C fitness-equipment broadcaster for a physical
//! resistance trainer: the trainer shows up on head units and apps as a
//! virtual bike, can be ridden along GPX tracks, and follows a paired
//! app's resistance and power requests. One arbitrated, clamped target
//! power comes out the other end.

pub mod ant;
pub mod bus;
pub mod config;
pub mod control;
pub mod telemetry;
pub mod track;

// Re-export commonly used types
pub use ant::{ControlCommand, FecBroadcaster, TrainerState};
pub use config::AppConfig;
pub use control::{Mode, ModeController};
pub use telemetry::Telemetry;
pub use track::{TrackLibrary, TrackModel};
