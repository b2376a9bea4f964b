//! Power band and safety limits.

use serde::{Deserialize, Serialize};

/// Operating band mapping grades and resistance fractions to watts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PowerBand {
    /// Power on the flat / at zero resistance, in watts
    pub min_power: u16,
    /// Power at the steepest supported grade / full resistance, in watts
    pub max_power: u16,
    /// Grade (fraction) mapped to `max_power`
    pub max_grade: f64,
}

impl Default for PowerBand {
    fn default() -> Self {
        Self {
            min_power: 100,
            max_power: 200,
            max_grade: 0.15,
        }
    }
}

impl PowerBand {
    /// Map a grade fraction onto the band.
    ///
    /// Linear between `min_power` at 0 and `max_power` at `max_grade`,
    /// clamped to the band at both ends; descents never drop below
    /// `min_power`.
    pub fn grade_to_power(&self, grade: f64) -> u16 {
        let span = f64::from(self.max_power) - f64::from(self.min_power);
        let raw = f64::from(self.min_power) + span * (grade / self.max_grade);
        raw.clamp(f64::from(self.min_power), f64::from(self.max_power))
            .round() as u16
    }

    /// Map a resistance fraction in [0, 1] onto the band.
    pub fn fraction_to_power(&self, fraction: f64) -> u16 {
        let span = f64::from(self.max_power) - f64::from(self.min_power);
        (f64::from(self.min_power) + span * fraction.clamp(0.0, 1.0)).round() as u16
    }
}

/// Hard safety envelope applied to every emitted target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PowerLimits {
    /// Absolute lower bound in watts
    pub lower: u16,
    /// Absolute upper bound in watts
    pub upper: u16,
}

impl Default for PowerLimits {
    fn default() -> Self {
        Self {
            lower: 30,
            upper: 400,
        }
    }
}

impl PowerLimits {
    /// Clamp a target into the safety envelope.
    pub fn clamp(&self, watts: u16) -> u16 {
        watts.clamp(self.lower, self.upper)
    }
}
