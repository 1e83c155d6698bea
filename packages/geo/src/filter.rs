//! Radius filtering over arbitrary record sequences.

use incident_map_geo_models::{GeoPoint, Located};

use crate::distance::distance_km;

/// Keeps the records whose great-circle distance to `center` is at most
/// `radius_km`, in input order.
///
/// Linear in the number of records. For the static building dataset use
/// [`crate::PointIndex::within_radius`], which answers the same question
/// through an R-tree.
pub fn within_radius<T: Located>(
    records: impl IntoIterator<Item = T>,
    center: GeoPoint,
    radius_km: f64,
) -> Vec<T> {
    records
        .into_iter()
        .filter(|record| distance_km(record.location(), center) <= radius_km)
        .collect()
}
