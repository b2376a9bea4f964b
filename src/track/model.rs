//! Distance-indexed track model.
//!
//! A track is an immutable ordered point sequence plus a derived cumulative
//! distance array. All queries are pure, restartable, and O(log N): the
//! follower asks "where am I after d meters" and gets an interpolated
//! position, the local grade, and overall progress.

use serde::Serialize;

use super::geo::haversine_distance;
use super::polyline;
use super::TrackError;

/// Lat/lon precision of the summary polyline (decimal digits).
const POLYLINE_PRECISION: u32 = 6;

/// Altitude precision of the summary polyline (decimal digits).
const POLYLINE_ALTITUDE_PRECISION: u32 = 2;

/// A point along a track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters
    pub elevation: f64,
}

/// Static track overview, computed once at load.
#[derive(Debug, Clone, Serialize)]
pub struct TrackSummary {
    /// Display name
    pub name: String,
    /// Total distance in meters
    pub distance: f64,
    /// Sum of climbing elevation deltas in meters
    pub ascent: f64,
    /// Sum of descending elevation deltas in meters (negative)
    pub descent: f64,
    /// Steepest climb in percent
    pub max_grade_percent: f64,
    /// Steepest descent in percent (negative)
    pub min_grade_percent: f64,
    /// Flexible-polyline encoding of the full geometry
    pub polyline: String,
}

/// Interpolated position along a track at a given distance.
#[derive(Debug, Clone, Serialize)]
pub struct TrackPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters
    pub elevation: f64,
    /// Local grade as a fraction (elevation change / horizontal distance)
    pub grade: f64,
    /// Overall progress in [0, 1]
    pub progress: f64,
}

/// Immutable ordered point sequence with distance lookup.
#[derive(Debug, Clone)]
pub struct TrackModel {
    points: Vec<TrackPoint>,
    /// Cumulative distance through the end of segment i, strictly
    /// non-decreasing, last element = total distance. Length is points - 1.
    cumulative: Vec<f64>,
    summary: TrackSummary,
}

impl TrackModel {
    /// Build a track from an ordered point sequence.
    ///
    /// Rejects sequences with fewer than two points: a single coordinate
    /// has no distance axis to follow.
    pub fn new(name: impl Into<String>, points: Vec<TrackPoint>) -> Result<Self, TrackError> {
        if points.len() < 2 {
            return Err(TrackError::TooFewPoints(points.len()));
        }

        let mut cumulative = Vec::with_capacity(points.len() - 1);
        let mut total = 0.0;
        let mut ascent = 0.0;
        let mut descent = 0.0;
        // at least one segment exists, so these always get set
        let mut max_grade = f64::NEG_INFINITY;
        let mut min_grade = f64::INFINITY;

        for pair in points.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let length = haversine_distance(
                start.latitude,
                start.longitude,
                end.latitude,
                end.longitude,
            );
            total += length;
            cumulative.push(total);

            let climb = end.elevation - start.elevation;
            if climb >= 0.0 {
                ascent += climb;
            } else {
                descent += climb;
            }

            // coincident points contribute no grade
            let grade = if length > 0.0 { climb / length } else { 0.0 };
            max_grade = max_grade.max(grade);
            min_grade = min_grade.min(grade);
        }

        let summary = TrackSummary {
            name: name.into(),
            distance: total,
            ascent,
            descent,
            max_grade_percent: max_grade * 100.0,
            min_grade_percent: min_grade * 100.0,
            polyline: polyline::encode(&points, POLYLINE_PRECISION, POLYLINE_ALTITUDE_PRECISION),
        };

        Ok(Self {
            points,
            cumulative,
            summary,
        })
    }

    /// The static track overview.
    pub fn summary(&self) -> &TrackSummary {
        &self.summary
    }

    /// Total track distance in meters.
    pub fn total_distance(&self) -> f64 {
        self.summary.distance
    }

    /// Interpolated position, grade, and progress at `distance` meters.
    ///
    /// Out-of-range distances clamp to the track ends.
    pub fn point_at_distance(&self, distance: f64) -> TrackPosition {
        // lower-bound search for the segment containing the distance
        let mut index = self.cumulative.partition_point(|&c| c < distance);
        if index >= self.cumulative.len() {
            index = self.cumulative.len() - 1;
        }

        let start = self.points[index];
        let end = self.points[index + 1];
        let length = haversine_distance(
            start.latitude,
            start.longitude,
            end.latitude,
            end.longitude,
        );

        let (grade, segment_progress) = if length > 0.0 {
            (
                (end.elevation - start.elevation) / length,
                (1.0 - (self.cumulative[index] - distance) / length).clamp(0.0, 1.0),
            )
        } else {
            // degenerate coincident points
            (0.0, 1.0)
        };

        TrackPosition {
            latitude: (1.0 - segment_progress) * start.latitude + segment_progress * end.latitude,
            longitude: (1.0 - segment_progress) * start.longitude
                + segment_progress * end.longitude,
            elevation: (1.0 - segment_progress) * start.elevation
                + segment_progress * end.elevation,
            grade,
            progress: self.progress_at_distance(distance),
        }
    }

    /// Overall progress in [0, 1] at `distance` meters.
    pub fn progress_at_distance(&self, distance: f64) -> f64 {
        (distance / self.summary.distance).clamp(0.0, 1.0)
    }
}
