//! Outbound FE-C data page encoders.
//!
//! Each encoder maps the current [`TrainerState`] to one fixed 8-byte page.
//! Encoding never fails; fields the equipment does not support are filled
//! with the profile's reserved bytes.

/// A single broadcast unit: 8 bytes, first byte is the page id.
pub type Page = [u8; 8];

/// General FE data page id (Page 16).
pub const GENERAL_FE: u8 = 0x10;
/// General settings page id (Page 17).
pub const GENERAL_SETTINGS: u8 = 0x11;
/// Stationary bike specific page id (Page 25).
pub const STATIONARY_BIKE: u8 = 0x19;
/// Manufacturer identification page id (Page 80).
pub const VENDOR: u8 = 0x50;
/// Product information page id (Page 81).
pub const PRODUCT: u8 = 0x51;

/// Equipment type byte for a trainer.
const EQUIPMENT_TYPE_TRAINER: u8 = 0x19;

/// Capabilities and FE-state byte broadcast on every live-data page.
const CAPABILITIES: u8 = 0x20;

/// Wheel circumference in 0.01 m units (2.15 m).
const CYCLE_LENGTH: u8 = 215;

/// Live trainer state broadcast by the FE-C engine.
///
/// Owned by the broadcaster and mutated only by the telemetry translator.
/// Wrap-around fields carry the modulo arithmetic of their wire width: the
/// elapsed-time byte wraps at 256 ticks and the speed and accumulated-power
/// words wrap at 65536.
#[derive(Debug, Clone, Default)]
pub struct TrainerState {
    /// Elapsed time in 0.25 s units, wrapping
    pub time_elapsed: u8,
    /// Speed in 0.001 m/s units, wrapping
    pub speed: u16,
    /// Resistance level in 0.5 % units
    pub resistance: u8,
    /// Instantaneous cadence in rpm, if reported
    pub instant_cadence: Option<u8>,
    /// Instantaneous power in watts (12-bit on the wire)
    pub instant_power: u16,
    /// Heart rate in bpm, if a monitor feeds the equipment
    pub instant_heart_rate: Option<u8>,
    /// Running power sum, wrapping
    pub accumulated_power: u16,
}

/// General FE data page (0x10): elapsed time, speed, heart rate.
///
/// Distance traveled is not implemented by this equipment and stays 0x00.
pub fn general(state: &TrainerState) -> Page {
    [
        GENERAL_FE,
        EQUIPMENT_TYPE_TRAINER,
        state.time_elapsed,
        0x00,
        (state.speed & 0xFF) as u8,
        (state.speed >> 8) as u8,
        state.instant_heart_rate.unwrap_or(0xFF),
        CAPABILITIES,
    ]
}

/// General settings page (0x11): cycle length and resistance.
///
/// Incline is not supported by the bike (0xFF, 0x7F).
pub fn settings(state: &TrainerState) -> Page {
    [
        GENERAL_SETTINGS,
        0xFF,
        0xFF,
        CYCLE_LENGTH,
        0xFF,
        0x7F,
        state.resistance,
        CAPABILITIES,
    ]
}

/// Stationary bike data page (0x19): cadence and power.
///
/// Folds the instantaneous power into the wrapping accumulated-power sum on
/// every emission, as the profile requires. The trainer-status nibble in
/// byte 6 is fixed to zero.
pub fn stationary_bike(state: &mut TrainerState, event_count: u8) -> Page {
    state.accumulated_power = state.accumulated_power.wrapping_add(state.instant_power);

    [
        STATIONARY_BIKE,
        event_count,
        state.instant_cadence.unwrap_or(0xFF),
        (state.accumulated_power & 0xFF) as u8,
        (state.accumulated_power >> 8) as u8,
        (state.instant_power & 0xFF) as u8,
        ((state.instant_power >> 8) & 0x0F) as u8,
        CAPABILITIES,
    ]
}

/// Manufacturer identification page (0x50): static constants.
pub fn vendor() -> Page {
    [VENDOR, 0xFF, 0xFF, 0x0A, 0xFF, 0x00, 0x24, 0x01]
}

/// Product information page (0x51): static constants.
pub fn product() -> Page {
    [PRODUCT, 0xFF, 0x50, 0x0D, 0x02, 0x00, 0x24, 0x01]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_general_page_layout() {
        let state = TrainerState {
            time_elapsed: 120,
            speed: 5000, // 5.0 m/s
            instant_heart_rate: None,
            ..Default::default()
        };
        let page = general(&state);

        assert_eq!(page[0], 0x10);
        assert_eq!(page[1], 0x19); // trainer
        assert_eq!(page[2], 120);
        assert_eq!(page[3], 0x00); // distance unsupported
        assert_eq!(u16::from_le_bytes([page[4], page[5]]), 5000);
        assert_eq!(page[6], 0xFF); // heart rate absent
        assert_eq!(page[7], 0x20);
    }

    #[test]
    fn test_general_page_heart_rate_present() {
        let state = TrainerState {
            instant_heart_rate: Some(140),
            ..Default::default()
        };
        assert_eq!(general(&state)[6], 140);
    }

    #[test]
    fn test_settings_page_layout() {
        let state = TrainerState {
            resistance: 42,
            ..Default::default()
        };
        assert_eq!(settings(&state), [0x11, 0xFF, 0xFF, 215, 0xFF, 0x7F, 42, 0x20]);
    }

    #[test]
    fn test_bike_page_accumulates_power() {
        let mut state = TrainerState {
            instant_power: 250,
            instant_cadence: Some(90),
            ..Default::default()
        };

        let page = stationary_bike(&mut state, 3);
        assert_eq!(page[0], 0x19);
        assert_eq!(page[1], 3);
        assert_eq!(page[2], 90);
        assert_eq!(u16::from_le_bytes([page[3], page[4]]), 250);
        assert_eq!(page[5], 250 & 0xFF);
        assert_eq!(page[6], 0x00); // power < 256, status nibble zero

        let page = stationary_bike(&mut state, 4);
        assert_eq!(u16::from_le_bytes([page[3], page[4]]), 500);
    }

    #[test]
    fn test_bike_page_accumulated_power_wraps() {
        let mut state = TrainerState {
            instant_power: 300,
            accumulated_power: 65500,
            ..Default::default()
        };
        let page = stationary_bike(&mut state, 0);
        assert_eq!(state.accumulated_power, ((65500u32 + 300) % 65536) as u16);
        assert_eq!(
            u16::from_le_bytes([page[3], page[4]]),
            state.accumulated_power
        );
    }

    #[test]
    fn test_bike_page_power_high_nibble() {
        let mut state = TrainerState {
            instant_power: 0x0ABC,
            ..Default::default()
        };
        let page = stationary_bike(&mut state, 0);
        assert_eq!(page[5], 0xBC);
        assert_eq!(page[6], 0x0A);
    }

    #[test]
    fn test_identification_pages_are_static() {
        assert_eq!(vendor(), [0x50, 0xFF, 0xFF, 0x0A, 0xFF, 0x00, 0x24, 0x01]);
        assert_eq!(product(), [0x51, 0xFF, 0x50, 0x0D, 0x02, 0x00, 0x24, 0x01]);
    }
}
