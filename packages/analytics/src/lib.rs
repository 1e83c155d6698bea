#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregation and estimation over incident snapshots.
//!
//! - [`decay`]: exponential severity decay and the age beyond which a
//!   record stops mattering.
//! - [`grid`]: fixed lat/lng grid and the heatmap aggregator built on it.
//! - [`duration`]: mean historical resolution time per responder and
//!   category.
//!
//! All functions are pure and operate on a point-in-time snapshot supplied
//! by the caller.

pub mod decay;
pub mod duration;
pub mod grid;

use incident_map_analytics_models::InvalidDecayParametersError;
use incident_map_geo_models::GeoError;

/// Errors that can occur during aggregation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    /// A point fell outside the grid bounding box under the `Reject`
    /// policy.
    #[error("Point ({latitude}, {longitude}) is outside the grid bounding box")]
    OutOfBounds {
        /// Latitude of the rejected point.
        latitude: f64,
        /// Longitude of the rejected point.
        longitude: f64,
    },

    /// The grid specification cannot describe a grid.
    #[error("Invalid grid: {message}")]
    InvalidGrid {
        /// Description of what went wrong.
        message: String,
    },

    /// Decay parameters out of range.
    #[error("Invalid decay parameters: {0}")]
    InvalidDecayParameters(#[from] InvalidDecayParametersError),

    /// A computed coordinate was not a valid point.
    #[error("Invalid geometry: {0}")]
    Geometry(#[from] GeoError),
}
