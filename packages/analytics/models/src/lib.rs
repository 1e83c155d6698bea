#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Grid, decay, and heatmap types for incident analytics.
//!
//! These are the immutable configuration values built once at startup
//! ([`GridSpec`], [`DecayParameters`]) and the plain result rows the
//! aggregator hands back to the caller ([`HeatmapCell`]).

use incident_map_geo_models::GeoPoint;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// What to do with a record that falls outside the grid's bounding box.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OutOfBoundsPolicy {
    /// Fail the whole aggregation.
    #[default]
    Reject,
    /// Leave the record out of the aggregate.
    Drop,
    /// Assign the record to the nearest edge cell.
    Clamp,
}

/// How records sharing a cell are combined.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AggregationMode {
    /// Arithmetic mean of the raw severities.
    #[default]
    Mean,
    /// Sum of the time-decayed severities.
    Decayed,
}

/// Bounding box and resolution of the aggregation grid.
///
/// The grid has `lat_steps + 1` by `lng_steps + 1` cell centres, placed at
/// `min + i * step` along each axis, so both edges of the box are centres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSpec {
    /// Southern edge in degrees.
    pub min_lat: f64,
    /// Northern edge in degrees.
    pub max_lat: f64,
    /// Western edge in degrees.
    pub min_lng: f64,
    /// Eastern edge in degrees.
    pub max_lng: f64,
    /// Number of steps between the southern and northern edge.
    pub lat_steps: u32,
    /// Number of steps between the western and eastern edge.
    pub lng_steps: u32,
    /// Handling of points outside the box.
    #[serde(default)]
    pub out_of_bounds: OutOfBoundsPolicy,
}

impl Default for GridSpec {
    /// Greater London, 50 steps per axis.
    fn default() -> Self {
        Self {
            min_lat: 51.291_504_162_868_72,
            max_lat: 51.690_315_647_606_95,
            min_lng: -0.499_317_017_220_753_33,
            max_lng: 0.322_603_142_392_930_5,
            lat_steps: 50,
            lng_steps: 50,
            out_of_bounds: OutOfBoundsPolicy::Reject,
        }
    }
}

/// Integer coordinates of a grid cell. `x` indexes latitude, `y` longitude.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GridCell {
    /// Latitude index.
    pub x: u32,
    /// Longitude index.
    pub y: u32,
}

/// Parameters of the exponential severity decay.
///
/// Construct through [`DecayParameters::new`], which enforces
/// `half_life_seconds > 0`, `0 < scale_factor < 1`, and
/// `min_significance > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawDecayParameters")]
pub struct DecayParameters {
    half_life_seconds: f64,
    scale_factor: f64,
    min_significance: f64,
}

impl DecayParameters {
    /// Creates validated decay parameters.
    ///
    /// `scale_factor` is the fraction of severity left after one
    /// `half_life_seconds` (0.5 for a true half-life).
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is non-finite or out of range.
    pub fn new(
        half_life_seconds: f64,
        scale_factor: f64,
        min_significance: f64,
    ) -> Result<Self, InvalidDecayParametersError> {
        let valid = half_life_seconds.is_finite()
            && half_life_seconds > 0.0
            && scale_factor > 0.0
            && scale_factor < 1.0
            && min_significance.is_finite()
            && min_significance > 0.0;

        if valid {
            Ok(Self {
                half_life_seconds,
                scale_factor,
                min_significance,
            })
        } else {
            Err(InvalidDecayParametersError {
                half_life_seconds,
                scale_factor,
                min_significance,
            })
        }
    }

    /// Seconds after which `scale_factor` of the severity remains.
    #[must_use]
    pub const fn half_life_seconds(&self) -> f64 {
        self.half_life_seconds
    }

    /// Fraction of severity remaining after one half-life.
    #[must_use]
    pub const fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Decayed severity below which a record no longer matters.
    #[must_use]
    pub const fn min_significance(&self) -> f64 {
        self.min_significance
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDecayParameters {
    half_life_seconds: f64,
    scale_factor: f64,
    min_significance: f64,
}

impl TryFrom<RawDecayParameters> for DecayParameters {
    type Error = InvalidDecayParametersError;

    fn try_from(raw: RawDecayParameters) -> Result<Self, Self::Error> {
        Self::new(raw.half_life_seconds, raw.scale_factor, raw.min_significance)
    }
}

impl Default for DecayParameters {
    /// One hour half-life, negligible below 0.1.
    fn default() -> Self {
        Self {
            half_life_seconds: 3600.0,
            scale_factor: 0.5,
            min_significance: 0.1,
        }
    }
}

/// Error returned by [`DecayParameters::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidDecayParametersError {
    /// Rejected half-life.
    pub half_life_seconds: f64,
    /// Rejected scale factor.
    pub scale_factor: f64,
    /// Rejected significance threshold.
    pub min_significance: f64,
}

impl std::fmt::Display for InvalidDecayParametersError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid decay parameters (half life {}s, scale factor {}, min significance {}): \
             expected half life > 0, 0 < scale factor < 1, min significance > 0",
            self.half_life_seconds, self.scale_factor, self.min_significance
        )
    }
}

impl std::error::Error for InvalidDecayParametersError {}

/// One non-empty cell of an aggregated heatmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    /// Grid coordinates.
    pub cell: GridCell,
    /// Centre of the cell.
    pub center: GeoPoint,
    /// Aggregated value (mean or decayed sum, depending on the mode).
    pub value: f64,
    /// Number of records that landed in this cell.
    pub count: usize,
}
