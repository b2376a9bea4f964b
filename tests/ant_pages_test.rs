//! Scenario tests for the FE-C broadcast engine.
//!
//! Covers the pattern-C rotation over whole windows, wire-level page
//! content, and control-command decoding against freshly built pages.

use velobridge::ant::commands::{decode, ControlCommand};
use velobridge::ant::pages::{self, TrainerState};
use velobridge::ant::scheduler::{page_for_tick, PageKind};

// =============================================================================
// Page rotation
// =============================================================================

#[test]
fn test_identification_pages_once_per_window() {
    for window in 0..4u64 {
        let base = window * 132;
        let vendor_ticks: Vec<u64> = (0..132)
            .filter(|offset| page_for_tick(base + offset) == PageKind::Vendor)
            .collect();
        let product_ticks: Vec<u64> = (0..132)
            .filter(|offset| page_for_tick(base + offset) == PageKind::Product)
            .collect();

        assert_eq!(vendor_ticks, vec![64, 65], "window {window}");
        assert_eq!(product_ticks, vec![130, 131], "window {window}");
    }
}

#[test]
fn test_rotation_spends_most_airtime_on_live_data() {
    let mut counts = std::collections::HashMap::new();
    for tick in 0..1320u64 {
        *counts.entry(page_for_tick(tick)).or_insert(0u32) += 1;
    }

    let general = counts[&PageKind::General];
    let settings = counts[&PageKind::Settings];
    let bike = counts[&PageKind::StationaryBike];

    assert_eq!(counts[&PageKind::Vendor], 20);
    assert_eq!(counts[&PageKind::Product], 20);
    assert_eq!(settings, bike);
    // live data dwarfs the identification slots
    assert!(general + settings + bike == 1280);
}

// =============================================================================
// Wire pages
// =============================================================================

#[test]
fn test_accumulated_power_wraps_across_bike_pages() {
    let mut state = TrainerState {
        instant_power: 4000,
        ..Default::default()
    };

    let mut last = 0u16;
    for event in 0..20u8 {
        let page = pages::stationary_bike(&mut state, event);
        let accumulated = u16::from_le_bytes([page[3], page[4]]);
        let expected = (u32::from(last) + 4000) % 65536;
        assert_eq!(u32::from(accumulated), expected, "event {event}");
        last = accumulated;
    }
    // 20 * 4000 = 80000 wraps past the 16-bit boundary once
    assert_eq!(u32::from(last), 80_000 % 65536);
}

#[test]
fn test_general_page_speed_little_endian() {
    let state = TrainerState {
        speed: 0x1388, // 5 m/s
        ..Default::default()
    };
    let page = pages::general(&state);
    assert_eq!(page[4], 0x88);
    assert_eq!(page[5], 0x13);
}

// =============================================================================
// Control command decode, against freshly built pages
// =============================================================================

/// Build a basic-resistance page the way a head unit would.
fn basic_resistance_page(half_percent: u8) -> [u8; 8] {
    [0x30, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, half_percent]
}

/// Build a target-power page for a given wattage.
fn target_power_page(watts: u16) -> [u8; 8] {
    let quarter_watts = (watts * 4).to_le_bytes();
    [0x31, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, quarter_watts[0], quarter_watts[1]]
}

/// Build a track-resistance page for a grade in percent.
fn track_resistance_page(grade_percent: f64, coefficient: Option<u8>) -> [u8; 8] {
    let encoded = ((grade_percent + 200.0) / 0.01).round() as u16;
    let grade_bytes = encoded.to_le_bytes();
    [
        0x33,
        0xFF,
        0xFF,
        0xFF,
        0xFF,
        grade_bytes[0],
        grade_bytes[1],
        coefficient.unwrap_or(0xFF),
    ]
}

#[test]
fn test_basic_resistance_round_trip() {
    assert_eq!(
        decode(&basic_resistance_page(200)),
        ControlCommand::BasicResistance { permille: 1000 }
    );
    assert_eq!(
        decode(&basic_resistance_page(0)),
        ControlCommand::BasicResistance { permille: 0 }
    );
}

#[test]
fn test_target_power_round_trip() {
    for watts in [0u16, 1, 150, 999, 4095] {
        assert_eq!(
            decode(&target_power_page(watts)),
            ControlCommand::TargetPower { watts },
            "{watts} W"
        );
    }
}

#[test]
fn test_track_resistance_round_trip() {
    assert_eq!(
        decode(&track_resistance_page(5.0, Some(80))),
        ControlCommand::TrackResistance {
            grade: Some(500),
            coefficient: Some(400),
        }
    );
    // 0 % grade is a real value, not "absent"
    assert_eq!(
        decode(&track_resistance_page(0.0, None)),
        ControlCommand::TrackResistance {
            grade: Some(0),
            coefficient: None,
        }
    );
    // -4 % descent
    assert_eq!(
        decode(&track_resistance_page(-4.0, None)),
        ControlCommand::TrackResistance {
            grade: Some(-400),
            coefficient: None,
        }
    );
}

#[test]
fn test_wind_resistance_absent_never_collides_with_zero() {
    let absent = decode(&[0x32, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    let zeroes = decode(&[0x32, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 127, 0x00]);

    assert_eq!(
        absent,
        ControlCommand::WindResistance {
            coefficient: None,
            wind_speed: None,
            drafting_factor: None,
        }
    );
    assert_eq!(
        zeroes,
        ControlCommand::WindResistance {
            coefficient: Some(0),
            wind_speed: Some(0),
            drafting_factor: Some(0),
        }
    );
}

#[test]
fn test_user_config_absent_never_collides_with_zero() {
    // all-zero weight field is 0.00 kg, not "absent"
    let zero_weight = decode(&[0x37, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00]);
    match zero_weight {
        ControlCommand::UserConfig { user_weight, .. } => {
            assert_eq!(user_weight, Some(0));
        }
        other => panic!("unexpected decode: {other:?}"),
    }
}

#[test]
fn test_unrecognized_page_is_unknown() {
    let data = [0x7B, 0, 1, 2, 3, 4, 5, 6];
    assert_eq!(decode(&data), ControlCommand::Unknown { page: 0x7B, data });
}
