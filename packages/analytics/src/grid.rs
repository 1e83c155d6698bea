//! Fixed lat/lng grid and the heatmap aggregator.
//!
//! Cell centres sit at `min + i * step` on each axis and a point is
//! assigned to the *nearest* centre (coordinates are rounded, not floored),
//! so the outermost cells are half-width and centred on the box edges.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use incident_map_analytics_models::{
    DecayParameters, GridCell, GridSpec, HeatmapCell, OutOfBoundsPolicy,
};
use incident_map_geo_models::{GeoPoint, Located};
use incident_map_incident_models::IncidentRecord;

use crate::AnalyticsError;
use crate::decay::decayed_severity;

/// Validated grid with its derived cell sizes.
///
/// Built once from a [`GridSpec`] and never mutated; safe to share across
/// threads.
#[derive(Debug, Clone, PartialEq)]
pub struct GridTopology {
    spec: GridSpec,
    lat_step: f64,
    lng_step: f64,
}

impl GridTopology {
    /// Validates `spec` and derives the cell sizes.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::InvalidGrid`] if the box is empty, inverted,
    /// non-finite, or outside WGS84 ranges, or if either step count is zero.
    pub fn new(spec: GridSpec) -> Result<Self, AnalyticsError> {
        GeoPoint::new(spec.min_lat, spec.min_lng).map_err(|e| invalid_grid(&e))?;
        GeoPoint::new(spec.max_lat, spec.max_lng).map_err(|e| invalid_grid(&e))?;

        if spec.min_lat >= spec.max_lat || spec.min_lng >= spec.max_lng {
            return Err(AnalyticsError::InvalidGrid {
                message: format!(
                    "bounding box lat {}..{} lng {}..{} is empty or inverted",
                    spec.min_lat, spec.max_lat, spec.min_lng, spec.max_lng
                ),
            });
        }
        if spec.lat_steps == 0 || spec.lng_steps == 0 {
            return Err(AnalyticsError::InvalidGrid {
                message: format!(
                    "step counts must be positive, got {}x{}",
                    spec.lat_steps, spec.lng_steps
                ),
            });
        }

        let lat_step = (spec.max_lat - spec.min_lat) / f64::from(spec.lat_steps);
        let lng_step = (spec.max_lng - spec.min_lng) / f64::from(spec.lng_steps);

        log::debug!(
            "Grid topology: {}x{} centres, {lat_step:.6}° x {lng_step:.6}° cells, out-of-bounds={}",
            spec.lat_steps + 1,
            spec.lng_steps + 1,
            spec.out_of_bounds,
        );

        Ok(Self {
            spec,
            lat_step,
            lng_step,
        })
    }

    /// The grid definition this topology was built from.
    #[must_use]
    pub const fn spec(&self) -> &GridSpec {
        &self.spec
    }

    /// Whether `point` lies inside the bounding box (edges included).
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.spec.min_lat..=self.spec.max_lat).contains(&point.latitude())
            && (self.spec.min_lng..=self.spec.max_lng).contains(&point.longitude())
    }

    /// The cell whose centre is nearest to `point`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::OutOfBounds`] if `point` is outside the
    /// bounding box, whatever the configured policy.
    pub fn cell_of(&self, point: GeoPoint) -> Result<GridCell, AnalyticsError> {
        if !self.contains(point) {
            return Err(out_of_bounds(point));
        }
        Ok(self.nearest_cell(point))
    }

    /// Applies the configured [`OutOfBoundsPolicy`] to `point`.
    ///
    /// `Ok(None)` means the point is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::OutOfBounds`] for an outside point under
    /// [`OutOfBoundsPolicy::Reject`].
    pub fn assign(&self, point: GeoPoint) -> Result<Option<GridCell>, AnalyticsError> {
        if self.contains(point) {
            return Ok(Some(self.nearest_cell(point)));
        }

        match self.spec.out_of_bounds {
            OutOfBoundsPolicy::Reject => Err(out_of_bounds(point)),
            OutOfBoundsPolicy::Drop => {
                log::debug!(
                    "Dropping point ({}, {}) outside the grid",
                    point.latitude(),
                    point.longitude()
                );
                Ok(None)
            }
            OutOfBoundsPolicy::Clamp => Ok(Some(self.nearest_cell(point))),
        }
    }

    /// Centre of `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Geometry`] if the centre is not a valid
    /// coordinate, which can only happen for a cell outside this grid.
    pub fn center_of(&self, cell: GridCell) -> Result<GeoPoint, AnalyticsError> {
        let lat = f64::from(cell.x)
            .mul_add(self.lat_step, self.spec.min_lat)
            .min(self.spec.max_lat);
        let lng = f64::from(cell.y)
            .mul_add(self.lng_step, self.spec.min_lng)
            .min(self.spec.max_lng);
        Ok(GeoPoint::new(lat, lng)?)
    }

    /// Rounds to the nearest centre, clamped to the grid's index range.
    fn nearest_cell(&self, point: GeoPoint) -> GridCell {
        GridCell {
            x: axis_index(
                point.latitude(),
                self.spec.min_lat,
                self.lat_step,
                self.spec.lat_steps,
            ),
            y: axis_index(
                point.longitude(),
                self.spec.min_lng,
                self.lng_step,
                self.spec.lng_steps,
            ),
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn axis_index(coord: f64, min: f64, step: f64, steps: u32) -> u32 {
    let index = ((coord - min) / step).round().clamp(0.0, f64::from(steps));
    index as u32
}

fn out_of_bounds(point: GeoPoint) -> AnalyticsError {
    AnalyticsError::OutOfBounds {
        latitude: point.latitude(),
        longitude: point.longitude(),
    }
}

fn invalid_grid(error: &impl std::fmt::Display) -> AnalyticsError {
    AnalyticsError::InvalidGrid {
        message: format!("bounding box corner: {error}"),
    }
}

#[derive(Default)]
struct Bucket {
    total: f64,
    count: usize,
}

/// Buckets incidents into grid cells and aggregates each non-empty cell.
///
/// Without `decay` the cell value is the mean severity of its incidents;
/// with `decay` it is the sum of their severities decayed to
/// `reference_time`. Empty cells are not emitted. Cells come back in
/// ascending `(x, y)` order.
///
/// # Errors
///
/// Returns [`AnalyticsError::OutOfBounds`] if an incident lies outside the
/// grid and the grid's policy is [`OutOfBoundsPolicy::Reject`].
pub fn aggregate<'a>(
    records: impl IntoIterator<Item = &'a IncidentRecord>,
    grid: &GridTopology,
    decay: Option<&DecayParameters>,
    reference_time: DateTime<Utc>,
) -> Result<Vec<HeatmapCell>, AnalyticsError> {
    let mut buckets: BTreeMap<GridCell, Bucket> = BTreeMap::new();

    for record in records {
        let Some(cell) = grid.assign(record.location())? else {
            continue;
        };

        let severity = f64::from(record.severity);
        let contribution = decay.map_or(severity, |params| {
            decayed_severity(severity, record.age_seconds(reference_time), params)
        });

        let bucket = buckets.entry(cell).or_default();
        bucket.total += contribution;
        bucket.count += 1;
    }

    log::trace!("Aggregated into {} non-empty cells", buckets.len());

    buckets
        .into_iter()
        .map(|(cell, bucket)| {
            #[allow(clippy::cast_precision_loss)]
            let value = if decay.is_some() {
                bucket.total
            } else {
                bucket.total / bucket.count as f64
            };
            Ok(HeatmapCell {
                cell,
                center: grid.center_of(cell)?,
                value,
                count: bucket.count,
            })
        })
        .collect()
}
