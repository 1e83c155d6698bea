#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geographic point and reference building types.
//!
//! [`GeoPoint`] is the coordinate value shared by every record the query
//! engine touches. Construction validates the WGS84 ranges so the distance,
//! filtering, and grid code downstream never has to.

use serde::{Deserialize, Serialize};

/// Errors raised when building geographic values.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// Latitude outside `[-90, 90]`, longitude outside `[-180, 180]`, or a
    /// non-finite coordinate.
    #[error("Invalid geometry: ({latitude}, {longitude}) is not a valid WGS84 coordinate")]
    InvalidGeometry {
        /// Offending latitude in degrees.
        latitude: f64,
        /// Offending longitude in degrees.
        longitude: f64,
    },
}

/// A WGS84 coordinate in degrees.
///
/// Immutable once constructed; both components are guaranteed finite and
/// within range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawGeoPoint")]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidGeometry`] if either coordinate is
    /// non-finite or outside its valid range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude)
        {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(GeoError::InvalidGeometry {
                latitude,
                longitude,
            })
        }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

/// Anything that sits at a single [`GeoPoint`].
///
/// Implemented by every record type the spatial filter and grid
/// aggregator operate on.
pub trait Located {
    /// The record's location.
    fn location(&self) -> GeoPoint;
}

impl Located for GeoPoint {
    fn location(&self) -> GeoPoint {
        *self
    }
}

impl<T: Located + ?Sized> Located for &T {
    fn location(&self) -> GeoPoint {
        (**self).location()
    }
}

/// A building from the static height reference dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingRecord {
    /// Building location.
    pub location: GeoPoint,
    /// Height in meters (non-negative).
    pub height: f64,
}

impl Located for BuildingRecord {
    fn location(&self) -> GeoPoint {
        self.location
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_range_boundaries() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_latitude() {
        let err = GeoPoint::new(90.5, 0.0).unwrap_err();
        assert_eq!(
            err,
            GeoError::InvalidGeometry {
                latitude: 90.5,
                longitude: 0.0
            }
        );
    }

    #[test]
    fn rejects_non_finite() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn deserialize_validates_range() {
        let ok: GeoPoint = serde_json::from_str(r#"{"latitude":51.5,"longitude":-0.1}"#).unwrap();
        assert!((ok.latitude() - 51.5).abs() < f64::EPSILON);

        let bad = serde_json::from_str::<GeoPoint>(r#"{"latitude":123.0,"longitude":0.0}"#);
        assert!(bad.is_err());
    }
}
