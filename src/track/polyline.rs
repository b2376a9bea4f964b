//! Flexible-polyline encoding of track geometry.
//!
//! Produces the HERE "flexible polyline" string used by map frontends to
//! render the track: delta-encoded (latitude, longitude, altitude) triples,
//! zigzag-packed into 5-bit groups over a base64-like alphabet.

use super::model::TrackPoint;

/// Encoding format version.
const FORMAT_VERSION: u64 = 1;

/// Third-dimension marker for absolute altitude.
const THIRD_DIM_ALTITUDE: u64 = 2;

const ENCODING_TABLE: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

fn encode_unsigned(mut value: u64, out: &mut String) {
    while value >= 0x20 {
        out.push(ENCODING_TABLE[((value & 0x1F) | 0x20) as usize] as char);
        value >>= 5;
    }
    out.push(ENCODING_TABLE[value as usize] as char);
}

fn encode_signed(value: i64, out: &mut String) {
    encode_unsigned(((value << 1) ^ (value >> 63)) as u64, out);
}

/// Encode points as a flexible polyline with altitude as third dimension.
///
/// `precision` scales latitude/longitude, `third_dim_precision` scales the
/// altitude, both as decimal digits.
pub fn encode(points: &[TrackPoint], precision: u32, third_dim_precision: u32) -> String {
    let mut out = String::new();

    encode_unsigned(FORMAT_VERSION, &mut out);
    let header = u64::from(precision)
        | (THIRD_DIM_ALTITUDE << 4)
        | (u64::from(third_dim_precision) << 7);
    encode_unsigned(header, &mut out);

    let scale = 10f64.powi(precision as i32);
    let third_scale = 10f64.powi(third_dim_precision as i32);

    let (mut last_lat, mut last_lon, mut last_ele) = (0i64, 0i64, 0i64);
    for point in points {
        let lat = (point.latitude * scale).round() as i64;
        let lon = (point.longitude * scale).round() as i64;
        let ele = (point.elevation * third_scale).round() as i64;

        encode_signed(lat - last_lat, &mut out);
        encode_signed(lon - last_lon, &mut out);
        encode_signed(ele - last_ele, &mut out);

        last_lat = lat;
        last_lon = lon;
        last_ele = ele;
    }

    out
}
