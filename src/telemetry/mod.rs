//! Trainer telemetry records and their translation into broadcast state.
//!
//! The ergometer service publishes one status record per poll: speed,
//! cadence, power, elapsed time as a "MM:SS" string, and distance. This
//! module deserializes those records from the bus envelope and translates
//! them into the FE-C wire units of [`TrainerState`]. A malformed record is
//! dropped for that cycle; the previous state stays in effect.

use serde::Deserialize;
use thiserror::Error;

use crate::ant::TrainerState;
use crate::bus::Envelope;

/// One trainer status record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Telemetry {
    /// Pedal cadence in rpm
    pub cadence: u8,
    /// Speed in km/h
    pub speed: f64,
    /// Odometer distance in km
    pub distance: f64,
    /// Power the trainer is currently set to, in watts
    pub dest_power: u16,
    /// Energy spent in kJ
    pub energy: u16,
    /// Elapsed ride time as "MM:SS"
    pub time_elapsed: String,
    /// Measured power in watts
    pub real_power: u16,
}

/// Errors for telemetry records that cannot be used.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Record did not deserialize
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Elapsed time is not a "MM:SS" string
    #[error("bad elapsed time {0:?}")]
    BadElapsedTime(String),
}

impl Telemetry {
    /// Speed in m/s.
    pub fn speed_mps(&self) -> f64 {
        self.speed / 3.6
    }

    /// Elapsed ride time in wrapping 0.25 s wire ticks.
    pub fn elapsed_quarter_secs(&self) -> Result<u8, TelemetryError> {
        let (minutes, seconds) = self
            .time_elapsed
            .split_once(':')
            .ok_or_else(|| TelemetryError::BadElapsedTime(self.time_elapsed.clone()))?;

        let minutes: u32 = minutes
            .parse()
            .map_err(|_| TelemetryError::BadElapsedTime(self.time_elapsed.clone()))?;
        let seconds: u32 = seconds
            .parse()
            .map_err(|_| TelemetryError::BadElapsedTime(self.time_elapsed.clone()))?;
        if seconds >= 60 {
            return Err(TelemetryError::BadElapsedTime(self.time_elapsed.clone()));
        }

        Ok((((minutes * 60 + seconds) * 4) % 256) as u8)
    }

    /// Translate this record into FE-C broadcast state.
    ///
    /// Wire units: speed becomes 0.001 m/s, elapsed time 0.25 s ticks,
    /// resistance the 0.5 % level the equipment reports for the measured
    /// power. A cadence of zero means the rider stopped pedaling and is
    /// broadcast as "absent" rather than a literal zero.
    pub fn apply_to(&self, state: &mut TrainerState) -> Result<(), TelemetryError> {
        state.time_elapsed = self.elapsed_quarter_secs()?;
        state.speed = ((self.speed * 1000.0 / 3.6).round() as i64).rem_euclid(65536) as u16;
        state.resistance = (self.real_power / 1200).min(255) as u8;
        state.instant_cadence = (self.cadence != 0).then_some(self.cadence);
        state.instant_power = self.real_power;
        Ok(())
    }
}

/// Deserialize a telemetry record from its bus envelope.
pub fn parse_record(json: &str) -> Result<Telemetry, TelemetryError> {
    let envelope: Envelope<Telemetry> = serde_json::from_str(json)?;
    Ok(envelope.payload)
}
