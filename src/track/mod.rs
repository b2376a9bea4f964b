//! Distance-indexed track model for virtual route following.

pub mod geo;
pub mod library;
pub mod model;
pub mod polyline;

pub use library::TrackLibrary;
pub use model::{TrackModel, TrackPoint, TrackPosition, TrackSummary};

use thiserror::Error;

/// Errors raised while loading or selecting tracks.
#[derive(Debug, Error)]
pub enum TrackError {
    /// A usable track needs at least two points
    #[error("track has too few points: {0}")]
    TooFewPoints(usize),

    /// Track index outside the loaded set
    #[error("no track at index {0}")]
    NotFound(usize),

    /// GPX file could not be parsed
    #[error("GPX parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
