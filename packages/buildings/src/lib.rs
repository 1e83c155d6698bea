#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Building height reference dataset loader.
//!
//! The dataset is a headerless CSV with one `lat,lng,height` row per
//! building. It is read once at startup and never modified afterwards.

use std::io::Read;
use std::path::Path;

use incident_map_geo_models::{BuildingRecord, GeoPoint};
use serde::Deserialize;

/// Errors from loading the building dataset.
#[derive(Debug, thiserror::Error)]
pub enum BuildingsError {
    /// The file could not be opened or read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The CSV stream itself is unreadable.
    #[error("CSV error in {path}: {source}")]
    Csv {
        /// Path (or source description) of the CSV data.
        path: String,
        /// Underlying CSV error.
        source: csv::Error,
    },
}

#[derive(Deserialize)]
struct BuildingRow(f64, f64, f64);

impl BuildingRow {
    fn to_record(&self) -> Option<BuildingRecord> {
        let Self(lat, lng, height) = *self;
        if !height.is_finite() || height < 0.0 {
            return None;
        }
        let location = GeoPoint::new(lat, lng).ok()?;
        Some(BuildingRecord { location, height })
    }
}

/// Loads the building dataset from a CSV file.
///
/// # Errors
///
/// Returns [`BuildingsError`] if the file cannot be opened or the CSV
/// stream is unreadable. Individual malformed rows are skipped.
pub fn load_csv(path: &Path) -> Result<Vec<BuildingRecord>, BuildingsError> {
    let file = std::fs::File::open(path).map_err(|e| BuildingsError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let buildings = parse(file, &path.display().to_string())?;
    log::info!(
        "Loaded {} buildings from {}",
        buildings.len(),
        path.display()
    );
    Ok(buildings)
}

/// Parses building rows from any `Read` source.
///
/// # Errors
///
/// Returns [`BuildingsError::Csv`] if the stream cannot be read as CSV.
pub fn from_reader(reader: impl Read) -> Result<Vec<BuildingRecord>, BuildingsError> {
    parse(reader, "<reader>")
}

fn parse(reader: impl Read, source_name: &str) -> Result<Vec<BuildingRecord>, BuildingsError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut buildings = Vec::new();
    let mut skipped = 0u64;

    for result in csv_reader.deserialize::<BuildingRow>() {
        let row = match result {
            Ok(row) => row,
            Err(e) if e.is_io_error() => {
                return Err(BuildingsError::Csv {
                    path: source_name.to_string(),
                    source: e,
                });
            }
            Err(e) => {
                log::trace!("  skipping malformed row: {e}");
                skipped += 1;
                continue;
            }
        };

        if let Some(building) = row.to_record() {
            buildings.push(building);
        } else {
            log::trace!("  skipping out-of-range row: {}, {}, {}", row.0, row.1, row.2);
            skipped += 1;
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {skipped} unusable building rows in {source_name}");
    }

    Ok(buildings)
}
