//! # Dataset Decoding
//!
//! Decoding of the static JSON datasets the dashboard ships with.
//!
//! The upstream exports are loose about types: quantities arrive as numbers
//! in some files and as numeric strings in others, and point features carry
//! their position either as separate `latitude`/`longitude` fields or as a
//! single `"lat,long"` string. Decoding normalizes all of that up front so
//! the aggregation functions only ever see real numbers. A non-numeric value
//! in a numeric field fails the dataset slice - it is never coerced to zero,
//! which would silently corrupt downstream sums.

use std::fmt;

use log::warn;
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::share::{ProjectShareRow, ShareRow};
use crate::summary::DestinationRecord;
use crate::{parse_coordinates, Coordinates, GeoPoint};

/// Error decoding a dataset.
#[derive(Debug, Error)]
pub enum DataError {
    /// A numeric field holds non-numeric content.
    #[error("field `{field}` is not numeric: `{value}`")]
    NonNumeric { field: String, value: String },
    /// The document is not the expected JSON shape.
    #[error("malformed dataset: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a static JSON array dataset into typed rows.
///
/// # Errors
///
/// Fails on the first malformed row - a bad record fails the whole slice
/// rather than producing a partially-aggregated result.
pub fn decode_rows<T: DeserializeOwned>(json: &str) -> Result<Vec<T>, DataError> {
    Ok(serde_json::from_str(json)?)
}

/// Normalize a JSON value that should hold a number.
///
/// Accepts numbers and numeric strings (leading/trailing whitespace
/// tolerated); anything else is a [`DataError::NonNumeric`].
pub fn numeric_value(field: &str, value: &Value) -> Result<f64, DataError> {
    let non_numeric = || DataError::NonNumeric {
        field: field.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(non_numeric),
        Value::String(s) => s.trim().parse().map_err(|_| non_numeric()),
        _ => Err(non_numeric()),
    }
}

// ============================================================================
// Flexible Numeric Deserializers
// ============================================================================

/// Deserialize an `f64` from a JSON number or numeric string.
pub fn number_or_string_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct FloatVisitor;

    impl Visitor<'_> for FloatVisitor {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number or a numeric string")
        }

        fn visit_f64<E>(self, v: f64) -> Result<f64, E>
        where
            E: de::Error,
        {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<f64, E>
        where
            E: de::Error,
        {
            Ok(v as f64)
        }

        fn visit_u64<E>(self, v: u64) -> Result<f64, E>
        where
            E: de::Error,
        {
            Ok(v as f64)
        }

        fn visit_str<E>(self, v: &str) -> Result<f64, E>
        where
            E: de::Error,
        {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(FloatVisitor)
}

/// Deserialize a `u64` count from a JSON number or numeric string.
///
/// Whole-valued floats are accepted (`12.0` counts as `12`); negative or
/// fractional values are rejected.
pub fn number_or_string_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct CountVisitor;

    impl Visitor<'_> for CountVisitor {
        type Value = u64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a non-negative integer or a numeric string")
        }

        fn visit_u64<E>(self, v: u64) -> Result<u64, E>
        where
            E: de::Error,
        {
            Ok(v)
        }

        fn visit_i64<E>(self, v: i64) -> Result<u64, E>
        where
            E: de::Error,
        {
            u64::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
        }

        fn visit_f64<E>(self, v: f64) -> Result<u64, E>
        where
            E: de::Error,
        {
            if v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64 {
                Ok(v as u64)
            } else {
                Err(E::invalid_value(de::Unexpected::Float(v), &self))
            }
        }

        fn visit_str<E>(self, v: &str) -> Result<u64, E>
        where
            E: de::Error,
        {
            v.trim()
                .parse()
                .map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }

    deserializer.deserialize_any(CountVisitor)
}

// ============================================================================
// Raw Dataset Rows
// ============================================================================

/// One row of the export-by-destination dataset.
///
/// Carries its year and product so the page can filter before handing the
/// rows to [`summarize_destinations`](crate::summarize_destinations).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawExportRow {
    pub year: String,
    pub product: String,
    pub short_destination: String,
    pub long_destination: String,
    #[serde(deserialize_with = "number_or_string_f64")]
    pub quantity: f64,
    #[serde(deserialize_with = "number_or_string_u64")]
    pub transaction: u64,
}

impl RawExportRow {
    /// The aggregation-ready record for this row.
    pub fn record(&self) -> DestinationRecord {
        DestinationRecord {
            short_destination: self.short_destination.clone(),
            long_destination: self.long_destination.clone(),
            quantity: self.quantity,
            transaction: self.transaction,
        }
    }
}

/// One row of a share-by-nationality dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawShareRow {
    pub year: String,
    #[serde(default)]
    pub product: Option<String>,
    pub nationality: String,
    #[serde(deserialize_with = "number_or_string_f64")]
    pub quantity: f64,
    #[serde(deserialize_with = "number_or_string_f64")]
    pub quantity_share: f64,
    #[serde(deserialize_with = "number_or_string_u64")]
    pub transaction: u64,
    #[serde(deserialize_with = "number_or_string_f64")]
    pub transaction_share: f64,
}

impl RawShareRow {
    pub fn share_row(&self) -> ShareRow {
        ShareRow {
            year: self.year.clone(),
            product: self.product.clone(),
            category: self.nationality.clone(),
            quantity: self.quantity,
            quantity_share: self.quantity_share,
            transaction: self.transaction,
            transaction_share: self.transaction_share,
        }
    }
}

/// One row of the export-share-by-project dataset.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawProjectShareRow {
    pub year: String,
    pub product: String,
    pub project: String,
    #[serde(deserialize_with = "number_or_string_f64")]
    pub quantity: f64,
    #[serde(deserialize_with = "number_or_string_f64")]
    pub quantity_share: f64,
    #[serde(deserialize_with = "number_or_string_u64")]
    pub transaction: u64,
    #[serde(deserialize_with = "number_or_string_f64")]
    pub transaction_share: f64,
}

impl RawProjectShareRow {
    pub fn share_row(&self) -> ProjectShareRow {
        ProjectShareRow {
            year: self.year.clone(),
            product: self.product.clone(),
            project: self.project.clone(),
            quantity: self.quantity,
            quantity_share: self.quantity_share,
            transaction: self.transaction,
            transaction_share: self.transaction_share,
        }
    }
}

// ============================================================================
// Geo Point Loading
// ============================================================================

/// One raw point feature from a marker dataset.
///
/// The position arrives as separate `latitude`/`longitude` fields (numbers or
/// numeric strings), as a single `"lat,long"` string, or both. Every other
/// field lands in the opaque properties bag and passes through to the map
/// layer untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPointFeature {
    #[serde(default, rename = "_project_id")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub latitude_longitude: Option<String>,
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl RawPointFeature {
    /// Resolve the feature's position, preferring the separate numeric
    /// fields over the combined coordinate string.
    fn coordinates(&self) -> Result<Coordinates, DataError> {
        match (&self.latitude, &self.longitude) {
            (Some(lat), Some(lng)) => {
                let latitude = numeric_value("latitude", lat)?;
                let longitude = numeric_value("longitude", lng)?;
                Ok(Coordinates {
                    latitude,
                    longitude,
                })
            }
            _ => {
                let raw = self.latitude_longitude.as_deref().ok_or_else(|| {
                    DataError::NonNumeric {
                        field: "latitude/longitude".to_string(),
                        value: "<missing>".to_string(),
                    }
                })?;
                parse_coordinates(raw).map_err(|e| DataError::NonNumeric {
                    field: "latitude_longitude".to_string(),
                    value: format!("{raw} ({e})"),
                })
            }
        }
    }
}

/// Turn raw point features into [`GeoPoint`]s for the cluster index.
///
/// A feature with no usable coordinates is skipped with a warning and the
/// rest continue - a single bad record never aborts index construction.
/// Points take their id from the feature's `_project_id` when present, else
/// a stable positional id.
pub fn load_geo_points(features: Vec<RawPointFeature>) -> Vec<GeoPoint> {
    let mut points = Vec::with_capacity(features.len());

    for (i, feature) in features.into_iter().enumerate() {
        let id = feature
            .project_id
            .clone()
            .unwrap_or_else(|| format!("point-{i}"));

        match feature.coordinates() {
            Ok(coords) => points.push(GeoPoint::with_properties(
                id,
                coords.longitude,
                coords.latitude,
                feature.properties,
            )),
            Err(e) => warn!("skipping point `{id}`: {e}"),
        }
    }

    points
}
