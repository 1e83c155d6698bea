#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the incident map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the record types to allow independent evolution of the API
//! contract.

use chrono::{DateTime, Utc};
use incident_map_analytics_models::{AggregationMode, HeatmapCell};
use incident_map_geo_models::BuildingRecord;
use incident_map_incident_models::{IncidentCategory, IncidentId, IncidentRecord};
use serde::{Deserialize, Serialize};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// One entry of the incident taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCategory {
    /// Category wire name.
    pub name: IncidentCategory,
    /// Human-readable label.
    pub label: String,
    /// Severity assumed when a report omits one.
    pub default_severity: u8,
}

/// A building as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBuilding {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Height in meters.
    pub height: f64,
}

impl From<BuildingRecord> for ApiBuilding {
    fn from(building: BuildingRecord) -> Self {
        Self {
            latitude: building.location.latitude(),
            longitude: building.location.longitude(),
            height: building.height,
        }
    }
}

/// An incident as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncident {
    /// Unique incident ID.
    pub id: IncidentId,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Incident category.
    pub category: IncidentCategory,
    /// Human-readable category label.
    pub category_label: String,
    /// Severity (1-10).
    pub severity: u8,
    /// When the incident was reported (ISO 8601).
    pub created_at: DateTime<Utc>,
    /// When the incident was resolved, if it has been.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Who resolved the incident, if anyone.
    pub resolved_by: Option<String>,
    /// Tallest nearby buildings, tallest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vantage_points: Vec<ApiBuilding>,
    /// Expected minutes to resolution for the requesting responder.
    /// Omitted when there is no history to estimate from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_resolution_minutes: Option<f64>,
}

impl From<IncidentRecord> for ApiIncident {
    fn from(record: IncidentRecord) -> Self {
        Self {
            id: record.id,
            latitude: record.location.latitude(),
            longitude: record.location.longitude(),
            category: record.category,
            category_label: record.category.label().to_string(),
            severity: record.severity.value(),
            created_at: record.created_at,
            resolved_at: record.resolved_at,
            resolved_by: record.resolved_by.map(|actor| actor.to_string()),
            vantage_points: Vec::new(),
            estimated_resolution_minutes: None,
        }
    }
}

/// One non-empty heatmap cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHeatmapCell {
    /// Cell centre latitude.
    pub latitude: f64,
    /// Cell centre longitude.
    pub longitude: f64,
    /// Aggregated value.
    pub value: f64,
    /// Number of incidents in the cell.
    pub count: usize,
}

impl From<HeatmapCell> for ApiHeatmapCell {
    fn from(cell: HeatmapCell) -> Self {
        Self {
            latitude: cell.center.latitude(),
            longitude: cell.center.longitude(),
            value: cell.value,
            count: cell.count,
        }
    }
}

/// Query parameters for the tallest-buildings endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingQueryParams {
    /// Query latitude.
    pub lat: f64,
    /// Query longitude.
    pub lng: f64,
    /// Search radius in kilometers.
    pub radius: f64,
    /// Maximum number of buildings to return.
    pub count: Option<usize>,
}

/// Query parameters for the active-incidents endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveIncidentParams {
    /// Query latitude.
    pub lat: f64,
    /// Query longitude.
    pub lng: f64,
    /// Search radius in kilometers.
    pub radius: f64,
    /// How far back an incident still counts as active.
    pub window_minutes: Option<u32>,
    /// Responder to estimate resolution times for.
    pub actor: Option<String>,
}

/// Query parameters for the heatmap endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapQueryParams {
    /// Aggregation mode, mean severity by default.
    pub mode: Option<AggregationMode>,
}

/// Body of an incident report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncidentRequest {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Incident category.
    pub category: IncidentCategory,
    /// Severity (1-10); the category default when omitted.
    pub severity: Option<u8>,
}

/// Body of a resolution request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveIncidentRequest {
    /// Responder resolving the incident.
    pub actor: String,
}
