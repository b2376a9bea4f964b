//! Great-circle distance between coordinates.

/// Mean Earth radius in meters.
const EARTH_RADIUS: f64 = 6_372_800.0;

/// Haversine distance between two (latitude, longitude) pairs in meters.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS * a.sqrt().atan2((1.0 - a).sqrt())
}
