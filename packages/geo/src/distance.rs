//! Great-circle distance on a spherical Earth.

use std::cmp::Ordering;
use std::f64::consts::PI;

use incident_map_geo_models::GeoPoint;

/// Sphere radius used for every distance computation, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometers.
///
/// Uses the arctangent form of the spherical law of cosines. `atan` only
/// covers `(-π/2, π/2)`, so when the denominator goes negative (separation
/// beyond a quarter circle) the raw angle is negative and is shifted by π
/// into the upper half range. Identical points return `0.0` without
/// evaluating the ratio.
///
/// The arguments are put in a fixed `(latitude, longitude)` order before
/// evaluation, so swapping them yields the bit-identical result.
#[must_use]
pub fn distance_km(a: GeoPoint, b: GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }

    let (a, b) = if canonical_order(a, b) == Ordering::Greater {
        (b, a)
    } else {
        (a, b)
    };

    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let d_lng = (a.longitude() - b.longitude()).to_radians();

    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_lat2, cos_lat2) = lat2.sin_cos();
    let (sin_d_lng, cos_d_lng) = d_lng.sin_cos();

    let numerator = (cos_lat2 * sin_d_lng)
        .hypot(cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_d_lng);
    let denominator = sin_lat1 * sin_lat2 + cos_lat1 * cos_lat2 * cos_d_lng;

    if numerator <= 0.0 && denominator >= 0.0 {
        return 0.0;
    }

    let mut angle = (numerator / denominator).atan();
    // numerator is never negative, so the sign of the raw angle follows the
    // denominator. Checking the denominator also catches `atan(-0.0)` for
    // exact antipodes.
    if denominator < 0.0 {
        angle += PI;
    }

    EARTH_RADIUS_KM * angle
}

fn canonical_order(a: GeoPoint, b: GeoPoint) -> Ordering {
    a.latitude()
        .total_cmp(&b.latitude())
        .then_with(|| a.longitude().total_cmp(&b.longitude()))
}
