//! Page rotation scheduler (transmission pattern C).
//!
//! The FE-C profile interleaves device-identification pages into the live
//! data stream on a fixed 132-tick rotation: vendor at ticks 64-65,
//! product at ticks 130-131, settings and bike-specific pages on a
//! repeating 8-tick sub-pattern, general data everywhere else. The
//! schedule is a pure function of the tick counter, so a caller that
//! advances the tick exactly once per send attempt can never drift phase.

/// Which outbound page kind to encode for a given tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    General,
    Settings,
    StationaryBike,
    Vendor,
    Product,
}

/// Select the page kind for a broadcast tick.
pub fn page_for_tick(tick: u64) -> PageKind {
    match tick % 132 {
        64 | 65 => PageKind::Vendor,
        130 | 131 => PageKind::Product,
        _ => match (tick % 66) % 8 {
            3 | 6 => PageKind::Settings,
            2 | 7 => PageKind::StationaryBike,
            _ => PageKind::General,
        },
    }
}
