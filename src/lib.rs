//! Track analysis for recorded GPS activities.
//!
//! Raw samples are normalized into [`TrackPoint`]s, points that only reflect
//! GPS drift while standing still are removed, and the remaining path is
//! summarized as distance, duration, average pace and elevation gain.

pub mod format;

use serde::Serialize;
use thiserror::Error;
use time::format_description::well_known::Iso8601;
use time::{Duration, OffsetDateTime, PrimitiveDateTime};
use tracing::debug;

/// Mean Earth radius in meters used by [`haversine_distance`].
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Slowest speed still counted as movement, in km/h.
pub const DEFAULT_MIN_SPEED_KMH: f64 = 1.5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    #[error("insufficient data: need at least 2 valid track points, found {found}")]
    InsufficientData { found: usize },
    #[error("malformed input at byte {position}: {message}")]
    MalformedInput { position: u64, message: String },
}

/// Reason a raw sample was left out of the normalized track.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvalidSample {
    #[error("missing latitude")]
    MissingLatitude,
    #[error("missing longitude")]
    MissingLongitude,
    #[error("invalid latitude: {0:?}")]
    InvalidLatitude(String),
    #[error("invalid longitude: {0:?}")]
    InvalidLongitude(String),
}

/// A sample as it appears in the source document, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSample {
    pub lat: Option<String>,
    pub lon: Option<String>,
    pub elevation: Option<String>,
    pub time: Option<String>,
}

impl RawSample {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        RawSample {
            lat: Some(lat.into()),
            lon: Some(lon.into()),
            ..Default::default()
        }
    }

    pub fn from_coords(lat: f64, lon: f64) -> Self {
        Self::new(lat.to_string(), lon.to_string())
    }

    pub fn with_elevation(mut self, elevation: impl Into<String>) -> Self {
        self.elevation = Some(elevation.into());
        self
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    #[serde(
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    /// Meters.
    pub total_distance: f64,
    /// Seconds between the first and last timestamp.
    pub duration: Option<f64>,
    /// Minutes per kilometer.
    pub average_pace: Option<f64>,
    /// Meters climbed; descents are not subtracted.
    pub elevation_gain: f64,
    /// The filtered path the metrics were computed from.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<TrackPoint>,
}

/// Thresholds of the movement filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalyzerConfig {
    /// Pairs slower than this (km/h) count as standing still.
    pub min_speed_kmh: f64,
    /// Pairs closer in time than this are treated as duplicate fixes.
    pub min_interval: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        AnalyzerConfig {
            min_speed_kmh: DEFAULT_MIN_SPEED_KMH,
            min_interval: Duration::SECOND,
        }
    }
}

fn parse_coordinate(text: &str, limit: f64) -> Option<f64> {
    let value: f64 = text.trim().parse().ok()?;
    (value.is_finite() && value.abs() <= limit).then_some(value)
}

fn parse_elevation(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|e| e.is_finite())
}

/// Timestamps without an offset are taken as UTC, the GPX convention.
fn parse_timestamp(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();
    OffsetDateTime::parse(text, &Iso8601::DEFAULT)
        .or_else(|_| PrimitiveDateTime::parse(text, &Iso8601::DEFAULT).map(|t| t.assume_utc()))
        .ok()
}

/// Converts one raw sample. Elevation and timestamp that fail to parse are
/// left absent rather than rejecting the sample.
pub fn normalize_sample(sample: &RawSample) -> Result<TrackPoint, InvalidSample> {
    let lat_text = sample.lat.as_deref().ok_or(InvalidSample::MissingLatitude)?;
    let lon_text = sample.lon.as_deref().ok_or(InvalidSample::MissingLongitude)?;

    let lat = parse_coordinate(lat_text, 90.0)
        .ok_or_else(|| InvalidSample::InvalidLatitude(lat_text.to_string()))?;
    let lon = parse_coordinate(lon_text, 180.0)
        .ok_or_else(|| InvalidSample::InvalidLongitude(lon_text.to_string()))?;

    Ok(TrackPoint {
        lat,
        lon,
        elevation: sample.elevation.as_deref().and_then(parse_elevation),
        timestamp: sample.time.as_deref().and_then(parse_timestamp),
    })
}

/// Normalizes samples in order, silently skipping the ones without usable
/// coordinates.
pub fn normalize(samples: &[RawSample]) -> Vec<TrackPoint> {
    samples
        .iter()
        .enumerate()
        .filter_map(|(index, sample)| match normalize_sample(sample) {
            Ok(point) => Some(point),
            Err(reason) => {
                debug!(index, %reason, "dropping sample");
                None
            }
        })
        .collect()
}

/// Calculates the great circle distance between two GPS coordinates using the haversine formula.
///
/// The Earth is modelled as a sphere of radius [`EARTH_RADIUS_M`], which is
/// accurate enough for the short hops between consecutive fixes of a track.
///
/// References:
/// - R.W. Sinnott, "Virtues of the Haversine", Sky and Telescope, vol. 68, no. 2, 1984, p. 159
/// - https://en.wikipedia.org/wiki/Haversine_formula
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    // a = sin²(Δφ/2) + cos φ1 ⋅ cos φ2 ⋅ sin²(Δλ/2)
    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push a past 1 for antipodal points
    let a = a.min(1.0);

    // c = 2 ⋅ atan2(√a, √(1−a))
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

pub fn distance_between(p1: &TrackPoint, p2: &TrackPoint) -> f64 {
    haversine_distance(p1.lat, p1.lon, p2.lat, p2.lon)
}

/// Decides whether `current` moved on its way to `next`.
fn is_moving(current: &TrackPoint, next: &TrackPoint, config: &AnalyzerConfig) -> bool {
    let (Some(start), Some(end)) = (current.timestamp, next.timestamp) else {
        return true;
    };

    let elapsed = end - start;
    if elapsed < config.min_interval {
        return false;
    }

    let hours = elapsed.as_seconds_f64() / 3600.0;
    let speed_kmh = distance_between(current, next) / 1000.0 / hours;
    speed_kmh >= config.min_speed_kmh
}

/// Removes interior points that show no real movement towards the following
/// point. The first and last points are always kept.
pub fn filter_moving_points(points: &[TrackPoint], config: &AnalyzerConfig) -> Vec<TrackPoint> {
    let Some(last_index) = points.len().checked_sub(1) else {
        return Vec::new();
    };

    let mut kept = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        if i == 0 || i == last_index || is_moving(point, &points[i + 1], config) {
            kept.push(point.clone());
        }
    }

    kept
}

/// Aggregates distance, duration, pace and elevation gain over `points`.
pub fn compute_metrics(points: Vec<TrackPoint>) -> AnalysisResult {
    let total_distance = points
        .windows(2)
        .map(|pair| distance_between(&pair[0], &pair[1]))
        .fold(0.0, |acc, d| acc + d);

    let elevation_gain = points
        .windows(2)
        .filter_map(|pair| match (pair[0].elevation, pair[1].elevation) {
            (Some(from), Some(to)) => Some((to - from).max(0.0)),
            _ => None,
        })
        .fold(0.0, |acc, gain| acc + gain);

    let first_time = points.first().and_then(|p| p.timestamp);
    let last_time = points.last().and_then(|p| p.timestamp);
    let duration = match (first_time, last_time) {
        (Some(start), Some(end)) if end >= start => Some((end - start).as_seconds_f64()),
        _ => None,
    };

    let average_pace = duration
        .filter(|_| total_distance > 0.0)
        .map(|seconds| (seconds / 60.0) / (total_distance / 1000.0));

    AnalysisResult {
        total_distance,
        duration,
        average_pace,
        elevation_gain,
        points,
    }
}

/// Analyzes a track with the default movement thresholds.
pub fn analyze(samples: &[RawSample]) -> Result<AnalysisResult, TrackError> {
    analyze_with(samples, &AnalyzerConfig::default())
}

pub fn analyze_with(
    samples: &[RawSample],
    config: &AnalyzerConfig,
) -> Result<AnalysisResult, TrackError> {
    let points = normalize(samples);
    if points.len() < 2 {
        return Err(TrackError::InsufficientData {
            found: points.len(),
        });
    }

    let moving = filter_moving_points(&points, config);
    debug!(
        samples = samples.len(),
        normalized = points.len(),
        kept = moving.len(),
        "movement filter applied"
    );

    Ok(compute_metrics(moving))
}
