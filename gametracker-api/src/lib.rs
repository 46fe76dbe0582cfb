//! gametracker-api library - HTTP service for the GameTracker backend
//!
//! Exposes game record CRUD, the CSV import pipeline, and the dashboard
//! aggregation endpoints over JSON.

use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod covers;
pub mod dashboard;
pub mod error;
pub mod import;

use covers::CoverClient;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Long-lived cover-art lookup client
    pub covers: CoverClient,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, covers: CoverClient) -> Self {
        Self { db, covers }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post, put};

    Router::new()
        .route("/games", get(api::list_games).post(api::create_game))
        .route("/games/without-hours", get(api::list_games_without_hours))
        .route(
            "/games/:id",
            put(api::update_game)
                .get(api::get_game)
                .patch(api::patch_game)
                .delete(api::delete_game),
        )
        .route("/games/:id/fetch-cover", post(api::fetch_cover))
        .route("/import/csv", post(api::import_csv))
        .route("/dashboard/summary", get(api::dashboard_summary))
        .route("/dashboard/evolution", get(api::dashboard_evolution))
        .merge(api::health_routes())
        // Browser and mobile clients run on their own origins
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
