#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the incident map application.
//!
//! Holds the building reference dataset and the live incident log in
//! memory and answers nearby-building, active-incident, and heatmap
//! queries by handing point-in-time snapshots to the geo and analytics
//! crates.

pub mod config;
mod handlers;
pub mod store;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use incident_map_analytics::grid::GridTopology;
use incident_map_analytics_models::DecayParameters;
use incident_map_geo::PointIndex;
use incident_map_geo_models::BuildingRecord;

use crate::config::ServerConfig;
use crate::store::IncidentStore;

/// Shared application state.
///
/// Everything except the incident log is fixed at startup.
pub struct AppState {
    /// Building height reference dataset.
    pub buildings: PointIndex<BuildingRecord>,
    /// Live incident log.
    pub incidents: IncidentStore,
    /// Heatmap grid.
    pub grid: GridTopology,
    /// Heatmap decay.
    pub decay: DecayParameters,
}

impl AppState {
    /// Builds the state from loaded buildings, an incident log, and the
    /// startup configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured grid is invalid.
    pub fn new(
        buildings: Vec<BuildingRecord>,
        incidents: IncidentStore,
        config: &ServerConfig,
    ) -> Result<Self, incident_map_analytics::AnalyticsError> {
        Ok(Self {
            buildings: PointIndex::new(buildings),
            incidents,
            grid: GridTopology::new(config.grid)?,
            decay: config.decay,
        })
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/categories", web::get().to(handlers::categories))
            .route(
                "/buildings/tallest",
                web::get().to(handlers::tallest_buildings),
            )
            .route("/incidents", web::post().to(handlers::create_incident))
            .route(
                "/incidents/active",
                web::get().to(handlers::active_incidents),
            )
            .route(
                "/incidents/{id}/resolve",
                web::post().to(handlers::resolve_incident),
            )
            .route("/heatmap", web::get().to(handlers::heatmap)),
    );
}

/// Starts the incident map API server.
///
/// Reads configuration from the environment, loads the building dataset,
/// and starts the Actix-Web HTTP server. The caller provides the async
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the configuration is invalid, the
/// building dataset cannot be read, or the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = ServerConfig::from_env().map_err(std::io::Error::other)?;

    log::info!(
        "Loading building heights from {}...",
        config.buildings_csv.display()
    );
    let buildings =
        incident_map_buildings::load_csv(&config.buildings_csv).map_err(std::io::Error::other)?;

    let state = web::Data::new(
        AppState::new(buildings, IncidentStore::new(), &config).map_err(std::io::Error::other)?,
    );

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?
    .run()
    .await
}
