//! # Mining Map
//!
//! Geospatial marker clustering and chart data aggregation for mining export
//! dashboards.
//!
//! This library provides:
//! - A build-once/query-many cluster index for map marker rendering
//! - Chart-shaped aggregation of export statistics (top destinations, trends, shares)
//! - Decoding of the static JSON datasets the dashboard ships with
//!
//! ## Modules
//!
//! - **[`cluster`]** - Hierarchical marker clustering with viewport queries
//! - **[`summary`]** - Top-N destination summarization
//! - **[`trend`]** - Multi-series time chart reshaping
//! - **[`share`]** - Share-of-production percentages and color keys
//! - **[`dataset`]** - JSON dataset decoding and point loading
//! - **[`mercator`]** - Web Mercator projection utilities
//!
//! ## Quick Start
//!
//! ```rust
//! use mining_map::{Bounds, ClusterConfig, ClusterIndex, GeoPoint};
//!
//! // Point records for the marker layer (Katanga copperbelt)
//! let points = vec![
//!     GeoPoint::new("ruashi", 27.578, -11.624),
//!     GeoPoint::new("kamoto", 25.350, -10.717),
//!     GeoPoint::new("mutanda", 25.785, -10.789),
//! ];
//!
//! let index = ClusterIndex::build(points, ClusterConfig::default());
//!
//! // Viewport query: everything visible in the box at zoom 4
//! let viewport = Bounds::new(20.0, -14.0, 30.0, -8.0);
//! for feature in index.clusters_in(&viewport, 4.0) {
//!     let (lng, lat) = feature.position();
//!     println!("{} point(s) at {:.3},{:.3}", feature.point_count(), lat, lng);
//! }
//! ```

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub mod cluster;
pub mod dataset;
pub mod mercator;
pub mod share;
pub mod summary;
pub mod trend;

pub use cluster::{Cluster, ClusterConfig, ClusterFeature, ClusterIndex, Leaf};
pub use dataset::{
    decode_rows, load_geo_points, DataError, RawExportRow, RawPointFeature, RawProjectShareRow,
    RawShareRow,
};
pub use share::{
    color_key, project_shares, share_slices, to_percent, ProjectShare, ProjectShareRow, ShareRow,
    ShareSlice,
};
pub use summary::{summarize_destinations, DestinationRecord, DestinationSummary, DEFAULT_TOP_N};
pub use trend::{transform_trend, TrendPoint, TrendRow};

// ============================================================================
// Core Types
// ============================================================================

/// A geo-tagged point record.
///
/// One row of the marker dataset: a stable identifier, a WGS84 position and an
/// opaque bag of display properties (project name, province, source links...)
/// that the core never interprets - it is passed through unchanged to the
/// [`Leaf`] the renderer receives.
///
/// # Example
/// ```
/// use mining_map::GeoPoint;
/// let point = GeoPoint::new("ruashi", 27.578, -11.624);
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub id: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Opaque passthrough properties for popups and styling.
    pub properties: Map<String, Value>,
}

impl GeoPoint {
    /// Create a new point with an empty properties bag.
    pub fn new(id: impl Into<String>, longitude: f64, latitude: f64) -> Self {
        Self {
            id: id.into(),
            longitude,
            latitude,
            properties: Map::new(),
        }
    }

    /// Create a new point carrying display properties.
    pub fn with_properties(
        id: impl Into<String>,
        longitude: f64,
        latitude: f64,
        properties: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            longitude,
            latitude,
            properties,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// A viewport bounding box in geographic coordinates.
///
/// Constructed from the map widget's `[min_lng, min_lat, max_lng, max_lat]`
/// array on every pan/zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl Bounds {
    /// Create bounds in `[min_lng, min_lat, max_lng, max_lat]` order.
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// Create bounds from a flat `[min_lng, min_lat, max_lng, max_lat]` array.
    pub fn from_bbox(bbox: [f64; 4]) -> Self {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    /// Compute the bounding box of a set of points.
    ///
    /// Returns `None` for empty input.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut bounds = Self::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for p in points {
            bounds.min_lng = bounds.min_lng.min(p.longitude);
            bounds.min_lat = bounds.min_lat.min(p.latitude);
            bounds.max_lng = bounds.max_lng.max(p.longitude);
            bounds.max_lat = bounds.max_lat.max(p.latitude);
        }
        Some(bounds)
    }

    /// Get the center point of the bounds as `(lng, lat)`.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lng + self.max_lng) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// A box is well-formed when `min <= max` on both axes.
    ///
    /// Mid-initialization map widgets briefly report inverted boxes; queries
    /// treat those as empty rather than erroring.
    pub fn is_well_formed(&self) -> bool {
        self.min_lng <= self.max_lng && self.min_lat <= self.max_lat
    }
}

// ============================================================================
// Coordinate Parsing
// ============================================================================

/// A parsed `"lat,long"` coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Error parsing a `"lat,long"` coordinate string.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// The string did not split into exactly two comma-separated tokens.
    #[error("expected a `lat,long` pair, found {0} token(s)")]
    TokenCount(usize),
    /// A token was not a valid float literal.
    #[error("invalid coordinate number `{0}`")]
    InvalidNumber(String),
}

/// Parse a `"lat,long"` formatted string into a coordinate pair.
///
/// Whitespace around the string and around each token is tolerated. The
/// returned values are unconstrained in range; callers validate bounds via
/// [`GeoPoint::is_valid`] where it matters.
///
/// # Errors
///
/// Returns [`ParseError`] when the string does not split into exactly two
/// tokens, or either token is not a valid float literal. No partial result is
/// produced on failure.
///
/// # Example
/// ```
/// use mining_map::parse_coordinates;
///
/// let coords = parse_coordinates("-11.366, 26.321").unwrap();
/// assert_eq!(coords.latitude, -11.366);
/// assert_eq!(coords.longitude, 26.321);
///
/// assert!(parse_coordinates("abc,26.3").is_err());
/// ```
pub fn parse_coordinates(raw: &str) -> Result<Coordinates, ParseError> {
    let tokens: Vec<&str> = raw.split(',').map(str::trim).collect();
    if tokens.len() != 2 {
        return Err(ParseError::TokenCount(tokens.len()));
    }

    let latitude: f64 = tokens[0]
        .parse()
        .map_err(|_| ParseError::InvalidNumber(tokens[0].to_string()))?;
    let longitude: f64 = tokens[1]
        .parse()
        .map_err(|_| ParseError::InvalidNumber(tokens[1].to_string()))?;

    Ok(Coordinates {
        latitude,
        longitude,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new("a", 26.321, -11.366).is_valid());
        assert!(!GeoPoint::new("b", 0.0, 91.0).is_valid());
        assert!(!GeoPoint::new("c", 181.0, 0.0).is_valid());
        assert!(!GeoPoint::new("d", f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_parse_coordinates() {
        let coords = parse_coordinates("-11.366, 26.321").unwrap();
        assert_eq!(coords.latitude, -11.366);
        assert_eq!(coords.longitude, 26.321);
    }

    #[test]
    fn test_parse_coordinates_whitespace() {
        let coords = parse_coordinates("  -10.5 ,  25.413  ").unwrap();
        assert_eq!(coords.latitude, -10.5);
        assert_eq!(coords.longitude, 25.413);
    }

    #[test]
    fn test_parse_coordinates_bad_number() {
        assert_eq!(
            parse_coordinates("abc,26.3"),
            Err(ParseError::InvalidNumber("abc".to_string()))
        );
    }

    #[test]
    fn test_parse_coordinates_wrong_token_count() {
        assert_eq!(parse_coordinates("1.0"), Err(ParseError::TokenCount(1)));
        assert_eq!(
            parse_coordinates("1.0,2.0,3.0"),
            Err(ParseError::TokenCount(3))
        );
        assert_eq!(parse_coordinates(""), Err(ParseError::TokenCount(1)));
    }

    #[test]
    fn test_bounds_from_points() {
        let points = vec![
            GeoPoint::new("a", 25.35, -10.717),
            GeoPoint::new("b", 27.578, -11.624),
        ];
        let bounds = Bounds::from_points(&points).unwrap();
        assert_eq!(bounds.min_lng, 25.35);
        assert_eq!(bounds.max_lng, 27.578);
        assert_eq!(bounds.min_lat, -11.624);
        assert_eq!(bounds.max_lat, -10.717);
        assert!(bounds.is_well_formed());
    }

    #[test]
    fn test_bounds_from_points_empty() {
        assert!(Bounds::from_points(&[]).is_none());
    }

    #[test]
    fn test_bounds_inverted_not_well_formed() {
        let bounds = Bounds::new(30.0, -8.0, 20.0, -14.0);
        assert!(!bounds.is_well_formed());
    }

    #[test]
    fn test_bounds_center() {
        let bounds = Bounds::new(20.0, -14.0, 30.0, -8.0);
        assert_eq!(bounds.center(), (25.0, -11.0));
    }
}
