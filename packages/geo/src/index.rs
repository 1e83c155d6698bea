//! R-tree index over a static set of located records.
//!
//! The building dataset is loaded once and queried once per active
//! incident, so it is worth indexing. Queries prune with a lat/lng
//! envelope that fully contains the great-circle disc and then apply the
//! exact [`distance_km`] check, so results match
//! [`crate::filter::within_radius`] exactly.

use std::f64::consts::{FRAC_PI_2, PI};

use incident_map_geo_models::{GeoPoint, Located};
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

use crate::distance::{EARTH_RADIUS_KM, distance_km};

/// Slack added around query envelopes to absorb trigonometric rounding.
const ENVELOPE_MARGIN_DEG: f64 = 1e-9;

/// `[lng, lat]` with the record's position in the backing vector.
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Immutable spatial index over records that each sit at one point.
pub struct PointIndex<T> {
    records: Vec<T>,
    tree: RTree<IndexedPoint>,
}

impl<T: Located> PointIndex<T> {
    /// Builds the index with a bulk load.
    #[must_use]
    pub fn new(records: Vec<T>) -> Self {
        let points = records
            .iter()
            .enumerate()
            .map(|(position, record)| {
                let location = record.location();
                IndexedPoint::new([location.longitude(), location.latitude()], position)
            })
            .collect();
        let tree = RTree::bulk_load(points);
        log::debug!("Built point index over {} records", tree.size());

        Self { records, tree }
    }

    /// All indexed records in their original order.
    #[must_use]
    pub fn records(&self) -> &[T] {
        &self.records
    }

    /// Number of indexed records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the index holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records within `radius_km` of `center` (inclusive), in original
    /// dataset order.
    #[must_use]
    pub fn within_radius(&self, center: GeoPoint, radius_km: f64) -> Vec<&T> {
        if radius_km < 0.0 {
            return Vec::new();
        }

        let envelope = search_envelope(center, radius_km);
        let mut positions: Vec<usize> = self
            .tree
            .locate_in_envelope(&envelope)
            .map(|point| point.data)
            .filter(|&position| {
                distance_km(self.records[position].location(), center) <= radius_km
            })
            .collect();
        positions.sort_unstable();

        positions
            .into_iter()
            .map(|position| &self.records[position])
            .collect()
    }
}

/// Lat/lng box containing every point within `radius_km` of `center`.
///
/// Falls back to the full longitude range when the disc reaches a pole or
/// crosses the antimeridian, and to the whole globe once the radius covers
/// a quarter circle or more.
fn search_envelope(center: GeoPoint, radius_km: f64) -> AABB<[f64; 2]> {
    let angular = radius_km / EARTH_RADIUS_KM;
    if angular >= FRAC_PI_2 {
        return AABB::from_corners([-180.0, -90.0], [180.0, 90.0]);
    }

    let lat = center.latitude().to_radians();
    let min_lat = lat - angular;
    let max_lat = lat + angular;

    if min_lat <= -FRAC_PI_2 || max_lat >= FRAC_PI_2 {
        return AABB::from_corners(
            [-180.0, min_lat.to_degrees().max(-90.0)],
            [180.0, max_lat.to_degrees().min(90.0)],
        );
    }

    let lng_delta = (angular.sin() / lat.cos()).clamp(-1.0, 1.0).asin();
    let min_lng = center.longitude().to_radians() - lng_delta;
    let max_lng = center.longitude().to_radians() + lng_delta;

    let (min_lng, max_lng) = if min_lng < -PI || max_lng > PI {
        (-180.0, 180.0)
    } else {
        (
            min_lng.to_degrees() - ENVELOPE_MARGIN_DEG,
            max_lng.to_degrees() + ENVELOPE_MARGIN_DEG,
        )
    };

    AABB::from_corners(
        [min_lng, min_lat.to_degrees() - ENVELOPE_MARGIN_DEG],
        [max_lng, max_lat.to_degrees() + ENVELOPE_MARGIN_DEG],
    )
}
