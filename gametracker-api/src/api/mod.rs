//! HTTP API handlers for gametracker-api

pub mod dashboard;
pub mod games;
pub mod health;
pub mod import;

pub use dashboard::{dashboard_evolution, dashboard_summary};
pub use games::{
    create_game, delete_game, fetch_cover, get_game, list_games, list_games_without_hours,
    patch_game, update_game,
};
pub use health::health_routes;
pub use import::import_csv;
