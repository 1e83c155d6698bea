//! HTTP handler functions for the incident map API.

use actix_web::{HttpResponse, web};
use chrono::{TimeDelta, Utc};
use incident_map_analytics::decay::relevance_cutoff;
use incident_map_analytics::duration::estimate_for_incident;
use incident_map_analytics::grid::aggregate;
use incident_map_analytics_models::AggregationMode;
use incident_map_geo::{tallest_within, within_radius};
use incident_map_geo_models::GeoPoint;
use incident_map_incident_models::{ActorId, IncidentCategory, IncidentId, IncidentRecord, Severity};
use incident_map_server_models::{
    ActiveIncidentParams, ApiBuilding, ApiCategory, ApiHealth, ApiHeatmapCell, ApiIncident,
    BuildingQueryParams, HeatmapQueryParams, NewIncidentRequest, ResolveIncidentRequest,
};

use crate::AppState;
use crate::store::StoreError;

/// Buildings returned when the request does not ask for a count.
const DEFAULT_BUILDING_COUNT: usize = 3;
/// Vantage-point search radius around an incident.
const VANTAGE_RADIUS_KM: f64 = 0.2;
/// Vantage points attached to each incident.
const VANTAGE_COUNT: usize = 3;
/// How long an unresolved incident counts as active by default.
const DEFAULT_ACTIVE_WINDOW_MINUTES: u32 = 5;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/categories`
///
/// Returns the incident taxonomy with default severities.
pub async fn categories() -> HttpResponse {
    let categories: Vec<ApiCategory> = IncidentCategory::all()
        .iter()
        .map(|category| ApiCategory {
            name: *category,
            label: category.label().to_string(),
            default_severity: category.default_severity().value(),
        })
        .collect();

    HttpResponse::Ok().json(categories)
}

/// `GET /api/buildings/tallest`
///
/// Tallest buildings within `radius` km of (`lat`, `lng`), tallest first.
pub async fn tallest_buildings(
    state: web::Data<AppState>,
    params: web::Query<BuildingQueryParams>,
) -> HttpResponse {
    let center = match query_point(params.lat, params.lng, params.radius) {
        Ok(center) => center,
        Err(response) => return response,
    };

    let count = params.count.unwrap_or(DEFAULT_BUILDING_COUNT);
    let buildings: Vec<ApiBuilding> = tallest_within(&state.buildings, center, params.radius, count)
        .into_iter()
        .map(ApiBuilding::from)
        .collect();

    HttpResponse::Ok().json(buildings)
}

/// `GET /api/incidents/active`
///
/// Unresolved incidents reported within the active window and inside the
/// radius, each with nearby vantage points and, when an `actor` is given,
/// that responder's estimated resolution time.
pub async fn active_incidents(
    state: web::Data<AppState>,
    params: web::Query<ActiveIncidentParams>,
) -> HttpResponse {
    let center = match query_point(params.lat, params.lng, params.radius) {
        Ok(center) => center,
        Err(response) => return response,
    };

    let now = Utc::now();
    let window = params
        .window_minutes
        .unwrap_or(DEFAULT_ACTIVE_WINDOW_MINUTES);
    let cutoff = now - TimeDelta::minutes(i64::from(window));

    // One point-in-time view serves both the active window and the
    // estimator history.
    let history = state.incidents.snapshot();
    let window_start = history.partition_point(|incident| incident.created_at < cutoff);
    let open: Vec<IncidentRecord> = history[window_start..]
        .iter()
        .filter(|incident| !incident.is_resolved())
        .cloned()
        .collect();
    let nearby = within_radius(open, center, params.radius);

    let actor = params.actor.as_deref().map(ActorId::from);

    let incidents: Vec<ApiIncident> = nearby
        .into_iter()
        .map(|incident| {
            let vantage_points = tallest_within(
                &state.buildings,
                incident.location,
                VANTAGE_RADIUS_KM,
                VANTAGE_COUNT,
            )
            .into_iter()
            .map(ApiBuilding::from)
            .collect();
            let estimated_resolution_minutes = actor
                .as_ref()
                .and_then(|actor| estimate_for_incident(&incident, actor, &history));

            ApiIncident {
                vantage_points,
                estimated_resolution_minutes,
                ..ApiIncident::from(incident)
            }
        })
        .collect();

    HttpResponse::Ok().json(incidents)
}

/// `GET /api/heatmap`
///
/// Per-cell mean severity over all incidents, or the decayed severity sum
/// over incidents recent enough to still matter.
pub async fn heatmap(
    state: web::Data<AppState>,
    params: web::Query<HeatmapQueryParams>,
) -> HttpResponse {
    let now = Utc::now();
    let mode = params.mode.unwrap_or_default();

    let result = match mode {
        AggregationMode::Mean => {
            let incidents = state.incidents.snapshot();
            aggregate(&incidents, &state.grid, None, now)
        }
        AggregationMode::Decayed => {
            let cutoff = relevance_cutoff(&state.decay, f64::from(Severity::MAX), now);
            let incidents = state.incidents.created_since(cutoff);
            log::debug!(
                "Decayed heatmap over {} incidents since {cutoff}",
                incidents.len()
            );
            aggregate(&incidents, &state.grid, Some(&state.decay), now)
        }
    };

    match result {
        Ok(cells) => {
            let cells: Vec<ApiHeatmapCell> = cells.into_iter().map(ApiHeatmapCell::from).collect();
            HttpResponse::Ok().json(cells)
        }
        Err(e) => {
            log::error!("Failed to aggregate heatmap: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to aggregate heatmap"
            }))
        }
    }
}

/// `POST /api/incidents`
///
/// Records a new incident. A missing severity falls back to the category
/// default.
pub async fn create_incident(
    state: web::Data<AppState>,
    body: web::Json<NewIncidentRequest>,
) -> HttpResponse {
    let request = body.into_inner();

    let location = match GeoPoint::new(request.latitude, request.longitude) {
        Ok(location) => location,
        Err(e) => return bad_request(&e),
    };
    let severity = match request.severity.map(Severity::from_value) {
        None => request.category.default_severity(),
        Some(Ok(severity)) => severity,
        Some(Err(e)) => return bad_request(&e),
    };

    let record = IncidentRecord::new(location, request.category, severity, Utc::now());
    state.incidents.insert(record.clone());
    log::debug!(
        "Recorded {} incident {} at ({}, {})",
        record.category,
        record.id,
        location.latitude(),
        location.longitude()
    );

    HttpResponse::Created().json(ApiIncident::from(record))
}

/// `POST /api/incidents/{id}/resolve`
///
/// Marks an incident resolved by the given responder.
pub async fn resolve_incident(
    state: web::Data<AppState>,
    path: web::Path<IncidentId>,
    body: web::Json<ResolveIncidentRequest>,
) -> HttpResponse {
    let id = path.into_inner();
    let actor = ActorId::new(body.into_inner().actor);

    match state.incidents.resolve(id, actor, Utc::now()) {
        Ok(record) => HttpResponse::Ok().json(ApiIncident::from(record)),
        Err(e @ StoreError::NotFound { .. }) => HttpResponse::NotFound().json(serde_json::json!({
            "error": e.to_string()
        })),
        Err(e @ (StoreError::AlreadyResolved { .. } | StoreError::BeforeCreation { .. })) => {
            HttpResponse::Conflict().json(serde_json::json!({
                "error": e.to_string()
            }))
        }
    }
}

/// Validates a point + radius query.
fn query_point(lat: f64, lng: f64, radius: f64) -> Result<GeoPoint, HttpResponse> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(HttpResponse::BadRequest().json(serde_json::json!({
            "error": format!("Invalid radius {radius}: expected a non-negative number of kilometers")
        })));
    }
    GeoPoint::new(lat, lng).map_err(|e| bad_request(&e))
}

fn bad_request(error: &impl std::fmt::Display) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "error": error.to_string()
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use incident_map_geo_models::BuildingRecord;

    use super::*;
    use crate::config::ServerConfig;
    use crate::store::IncidentStore;

    fn building(lat: f64, lng: f64, height: f64) -> BuildingRecord {
        BuildingRecord {
            location: GeoPoint::new(lat, lng).unwrap(),
            height,
        }
    }

    fn state(buildings: Vec<BuildingRecord>, incidents: Vec<IncidentRecord>) -> web::Data<AppState> {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        web::Data::new(
            AppState::new(buildings, IncidentStore::with_records(incidents), &config).unwrap(),
        )
    }

    fn open_incident(lat: f64, lng: f64, category: IncidentCategory, minutes_ago: i64) -> IncidentRecord {
        IncidentRecord::new(
            GeoPoint::new(lat, lng).unwrap(),
            category,
            Severity::from_value(6).unwrap(),
            Utc::now() - TimeDelta::minutes(minutes_ago),
        )
    }

    #[actix_web::test]
    async fn tallest_building_at_query_point() {
        let app = test::init_service(
            App::new()
                .app_data(state(vec![building(51.50, -0.10, 100.0)], Vec::new()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/buildings/tallest?lat=51.50&lng=-0.10&radius=1&count=1")
            .to_request();
        let buildings: Vec<ApiBuilding> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            buildings,
            vec![ApiBuilding {
                latitude: 51.50,
                longitude: -0.10,
                height: 100.0
            }]
        );
    }

    #[actix_web::test]
    async fn invalid_coordinates_are_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(state(Vec::new(), Vec::new()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/buildings/tallest?lat=123&lng=0&radius=1")
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn active_incidents_with_vantage_points_and_estimate() {
        let mut solved = open_incident(51.5046, -0.0866, IncidentCategory::Robbery, 120);
        let solved_at = solved.created_at + TimeDelta::minutes(10);
        solved.resolve(ActorId::from("batman"), solved_at).unwrap();

        let active = open_incident(51.5045, -0.0865, IncidentCategory::Robbery, 1);
        let stale = open_incident(51.5045, -0.0865, IncidentCategory::Robbery, 30);
        let far = open_incident(51.6000, -0.0865, IncidentCategory::Robbery, 1);

        let app = test::init_service(
            App::new()
                .app_data(state(
                    vec![
                        building(51.5045, -0.0865, 310.0),
                        building(51.5050, -0.0860, 40.0),
                        building(51.5200, -0.0865, 500.0),
                    ],
                    vec![solved, active.clone(), stale, far],
                ))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/incidents/active?lat=51.5045&lng=-0.0865&radius=1&actor=batman")
            .to_request();
        let incidents: Vec<ApiIncident> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].id, active.id);
        let heights: Vec<f64> = incidents[0].vantage_points.iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![310.0, 40.0]);
        let estimate = incidents[0].estimated_resolution_minutes.unwrap();
        assert!((estimate - 10.0).abs() < 1e-9);
    }

    #[actix_web::test]
    async fn create_resolve_and_heatmap() {
        let app = test::init_service(
            App::new()
                .app_data(state(Vec::new(), Vec::new()))
                .configure(crate::configure),
        )
        .await;

        for severity in [4, 6] {
            let req = test::TestRequest::post()
                .uri("/api/incidents")
                .set_json(NewIncidentRequest {
                    latitude: 51.5000,
                    longitude: -0.1000,
                    category: IncidentCategory::Burglary,
                    severity: Some(severity),
                })
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), actix_web::http::StatusCode::CREATED);
        }

        let req = test::TestRequest::post()
            .uri("/api/incidents")
            .set_json(NewIncidentRequest {
                latitude: 51.5001,
                longitude: -0.1001,
                category: IncidentCategory::Drugs,
                severity: None,
            })
            .to_request();
        let created: ApiIncident = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            created.severity,
            IncidentCategory::Drugs.default_severity().value()
        );

        let req = test::TestRequest::post()
            .uri(&format!("/api/incidents/{}/resolve", created.id))
            .set_json(ResolveIncidentRequest {
                actor: "batman".to_string(),
            })
            .to_request();
        let resolved: ApiIncident = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resolved.resolved_by.as_deref(), Some("batman"));

        let req = test::TestRequest::post()
            .uri(&format!("/api/incidents/{}/resolve", created.id))
            .set_json(ResolveIncidentRequest {
                actor: "robin".to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CONFLICT);

        let req = test::TestRequest::get()
            .uri("/api/heatmap?mode=mean")
            .to_request();
        let cells: Vec<ApiHeatmapCell> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].count, 3);
        let expected = (4.0 + 6.0 + f64::from(IncidentCategory::Drugs.default_severity())) / 3.0;
        assert!((cells[0].value - expected).abs() < 1e-9);

        let req = test::TestRequest::get()
            .uri("/api/heatmap?mode=decayed")
            .to_request();
        let cells: Vec<ApiHeatmapCell> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cells.len(), 1);
        assert!(cells[0].value > 0.0);
    }

    #[actix_web::test]
    async fn decayed_heatmap_keeps_old_top_severity_incident() {
        // 10 * 0.5^6 is still above the 0.1 significance threshold.
        let old = IncidentRecord::new(
            GeoPoint::new(51.5, -0.1).unwrap(),
            IncidentCategory::Robbery,
            Severity::MAX,
            Utc::now() - TimeDelta::hours(6),
        );
        let app = test::init_service(
            App::new()
                .app_data(state(Vec::new(), vec![old]))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/heatmap?mode=decayed")
            .to_request();
        let cells: Vec<ApiHeatmapCell> = test::call_and_read_body_json(&app, req).await;

        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].count, 1);
        assert!(cells[0].value > 0.1);
        assert!(cells[0].value < 0.16);
    }

    #[actix_web::test]
    async fn active_window_excludes_resolved_and_stale_incidents() {
        let recent = open_incident(51.5, -0.1, IncidentCategory::Burglary, 2);
        let mut resolved = open_incident(51.5, -0.1, IncidentCategory::Burglary, 1);
        let resolved_at = resolved.created_at;
        resolved.resolve(ActorId::from("robin"), resolved_at).unwrap();
        let stale = open_incident(51.5, -0.1, IncidentCategory::Burglary, 20);

        let app = test::init_service(
            App::new()
                .app_data(state(Vec::new(), vec![stale.clone(), recent.clone(), resolved]))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/incidents/active?lat=51.5&lng=-0.1&radius=1")
            .to_request();
        let incidents: Vec<ApiIncident> = test::call_and_read_body_json(&app, req).await;
        let ids: Vec<IncidentId> = incidents.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![recent.id]);

        let req = test::TestRequest::get()
            .uri("/api/incidents/active?lat=51.5&lng=-0.1&radius=1&windowMinutes=30")
            .to_request();
        let incidents: Vec<ApiIncident> = test::call_and_read_body_json(&app, req).await;
        let ids: Vec<IncidentId> = incidents.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![stale.id, recent.id]);
    }

    #[actix_web::test]
    async fn resolving_unknown_incident_is_not_found() {
        let app = test::init_service(
            App::new()
                .app_data(state(Vec::new(), Vec::new()))
                .configure(crate::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/incidents/{}/resolve", uuid::Uuid::new_v4()))
            .set_json(ResolveIncidentRequest {
                actor: "batman".to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }
}
