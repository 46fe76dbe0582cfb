//! Dashboard endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use gametracker_common::db::games;
use serde::Deserialize;
use tracing::error;

use crate::dashboard::{monthly_evolution, summarize, DashboardSummary, MonthlyCount};
use crate::error::ApiError;
use crate::AppState;

/// Query parameters for the summary endpoint
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    /// Calendar year for the year-scoped figures; defaults to the current one
    pub year: Option<i32>,
}

/// GET /dashboard/summary
pub async fn dashboard_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let games = games::list_all_games(&state.db).await.map_err(|e| {
        error!("Failed to load games for dashboard summary: {}", e);
        ApiError::Internal("Failed to build dashboard summary".to_string())
    })?;

    let year = query.year.unwrap_or_else(|| Utc::now().year());
    Ok(Json(summarize(&games, year)))
}

/// GET /dashboard/evolution
pub async fn dashboard_evolution(
    State(state): State<AppState>,
) -> Result<Json<Vec<MonthlyCount>>, ApiError> {
    let games = games::list_all_games(&state.db).await.map_err(|e| {
        error!("Failed to load games for evolution series: {}", e);
        ApiError::Internal("Failed to build evolution series".to_string())
    })?;

    Ok(Json(monthly_evolution(&games)))
}
