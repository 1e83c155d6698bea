#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial matching over geo-tagged records.
//!
//! Provides the great-circle distance used throughout the service, a pure
//! radius filter for ad-hoc record sets, an R-tree backed [`PointIndex`]
//! for the static building dataset, and a stable top-K ranking. Everything
//! here is synchronous and free of shared mutable state.

pub mod distance;
pub mod filter;
pub mod index;
pub mod rank;

pub use distance::{EARTH_RADIUS_KM, distance_km};
pub use filter::within_radius;
pub use index::PointIndex;
pub use rank::top_k;

use incident_map_geo_models::{BuildingRecord, GeoPoint};

/// Returns up to `count` of the tallest buildings within `radius_km` of
/// `center`, tallest first.
///
/// Buildings of equal height keep their dataset order.
#[must_use]
pub fn tallest_within(
    buildings: &PointIndex<BuildingRecord>,
    center: GeoPoint,
    radius_km: f64,
    count: usize,
) -> Vec<BuildingRecord> {
    let nearby = buildings.within_radius(center, radius_km);
    top_k(nearby, |b| b.height, count)
        .into_iter()
        .copied()
        .collect()
}
