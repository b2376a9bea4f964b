//! Preloaded track list and the GPX directory adapter.
//!
//! Tracks are loaded once at startup and addressed by index thereafter;
//! the library itself is read-only. Files that fail to parse are skipped
//! with a warning so one broken upload cannot take the whole library down.

use std::path::{Path, PathBuf};

use super::model::{TrackModel, TrackPoint, TrackSummary};
use super::TrackError;

/// Ordered, immutable set of loaded tracks.
#[derive(Debug, Default)]
pub struct TrackLibrary {
    tracks: Vec<TrackModel>,
}

impl TrackLibrary {
    /// Build a library from already-loaded tracks.
    pub fn new(tracks: Vec<TrackModel>) -> Self {
        Self { tracks }
    }

    /// Load every `*.gpx` file in `dir`, ordered by file name.
    pub fn from_gpx_dir(dir: &Path) -> Result<Self, TrackError> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("gpx"))
            })
            .collect();
        files.sort();

        let mut tracks = Vec::new();
        for file in files {
            match load_gpx(&file) {
                Ok(track) => {
                    tracing::info!(
                        file = %file.display(),
                        distance_m = track.total_distance().round(),
                        "loaded track"
                    );
                    tracks.push(track);
                }
                Err(err) => {
                    tracing::warn!(file = %file.display(), %err, "skipping track");
                }
            }
        }

        Ok(Self { tracks })
    }

    /// Resolve a track by index.
    pub fn get(&self, index: usize) -> Result<&TrackModel, TrackError> {
        self.tracks.get(index).ok_or(TrackError::NotFound(index))
    }

    /// Summaries of all loaded tracks, in index order.
    pub fn summaries(&self) -> Vec<&TrackSummary> {
        self.tracks.iter().map(|track| track.summary()).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

/// Parse one GPX file into a track.
fn load_gpx(path: &Path) -> Result<TrackModel, TrackError> {
    let content = std::fs::read_to_string(path)?;
    let data: gpx::Gpx =
        gpx::read(content.as_bytes()).map_err(|err| TrackError::ParseError(err.to_string()))?;

    let mut points = Vec::new();
    for track in &data.tracks {
        for segment in &track.segments {
            for waypoint in &segment.points {
                points.push(TrackPoint {
                    latitude: waypoint.point().y(),
                    longitude: waypoint.point().x(),
                    elevation: waypoint.elevation.unwrap_or(0.0),
                });
            }
        }
    }

    let name = data
        .tracks
        .first()
        .and_then(|track| track.name.clone())
        .or_else(|| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .map(String::from)
        })
        .unwrap_or_else(|| "unnamed".to_string());

    TrackModel::new(name, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_GPX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test">
  <trk>
    <name>Sample Climb</name>
    <trkseg>
      <trkpt lat="47.0" lon="11.0"><ele>500</ele></trkpt>
      <trkpt lat="47.001" lon="11.0"><ele>510</ele></trkpt>
    </trkseg>
  </trk>
</gpx>"#;

    fn write_file(dir: &Path, name: &str, content: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_loads_gpx_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "b_second.gpx", SAMPLE_GPX);
        write_file(
            dir.path(),
            "a_first.gpx",
            &SAMPLE_GPX.replace("Sample Climb", "First"),
        );
        write_file(dir.path(), "notes.txt", "not a track");

        let library = TrackLibrary::from_gpx_dir(dir.path()).unwrap();

        assert_eq!(library.len(), 2);
        assert_eq!(library.summaries()[0].name, "First");
        assert_eq!(library.summaries()[1].name, "Sample Climb");
    }

    #[test]
    fn test_skips_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "bad.gpx", "<gpx><unclosed>");
        write_file(dir.path(), "good.gpx", SAMPLE_GPX);

        let library = TrackLibrary::from_gpx_dir(dir.path()).unwrap();

        assert_eq!(library.len(), 1);
        assert_eq!(library.summaries()[0].name, "Sample Climb");
    }

    #[test]
    fn test_get_out_of_range() {
        let library = TrackLibrary::default();
        assert!(matches!(library.get(0), Err(TrackError::NotFound(0))));
    }
}
