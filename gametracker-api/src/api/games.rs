//! Game record CRUD handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use gametracker_common::db::games;
use gametracker_common::db::models::{Game, GameStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::AppState;

const MAX_TITLE_LEN: usize = 200;
const MAX_PLATFORM_LEN: usize = 50;

/// Query parameters for game listing
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Status filter; unknown values are ignored
    pub status: Option<String>,
    /// Title substring filter
    pub title: Option<String>,
}

/// Creation payload; title is the only required field
#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub title: Option<String>,
    pub platform: Option<String>,
    pub genre: Option<String>,
    pub status: Option<GameStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub hours_played: Option<f64>,
    pub rating: Option<f64>,
    pub comments: Option<String>,
    pub owner_id: Option<Uuid>,
}

/// Partial update payload: one optional slot per mutable attribute,
/// applied field-by-field only when present
#[derive(Debug, Default, Deserialize)]
pub struct GamePatch {
    pub rating: Option<f64>,
    pub hours_played: Option<f64>,
    pub end_date: Option<DateTime<Utc>>,
    pub comments: Option<String>,
    pub status: Option<GameStatus>,
}

/// Slim projection for the without-hours listing
#[derive(Debug, Serialize)]
pub struct GameWithoutHours {
    pub id: Uuid,
    pub title: String,
    pub platform: String,
    pub status: GameStatus,
    pub rating: Option<f64>,
    pub hours_played: Option<f64>,
}

/// GET /games
pub async fn list_games(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Game>>, ApiError> {
    // An unparsable status filter is ignored rather than rejected
    let status = query
        .status
        .as_deref()
        .and_then(|s| s.parse::<GameStatus>().ok());

    let result = games::list_games(&state.db, status, query.title.as_deref())
        .await
        .map_err(|e| {
            error!("Failed to list games: {}", e);
            ApiError::Internal("Failed to list games".to_string())
        })?;

    Ok(Json(result))
}

/// GET /games/:id
pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Game>, ApiError> {
    let game = load_game(&state, id, "get").await?;
    Ok(Json(game))
}

/// POST /games
pub async fn create_game(
    State(state): State<AppState>,
    Json(request): Json<CreateGameRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Title is required".to_string()))?;

    let platform = request
        .platform
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or("Unknown");

    let mut game = Game::new(
        truncate(title, MAX_TITLE_LEN),
        truncate(platform, MAX_PLATFORM_LEN),
    );
    game.genre = request.genre;
    game.status = request.status.unwrap_or_default();
    game.start_date = request.start_date.or_else(|| Some(Utc::now()));
    game.end_date = request.end_date;
    game.hours_played = request.hours_played;
    game.rating = request.rating;
    game.comments = request.comments;
    game.owner_id = request.owner_id;

    match games::insert_game(&state.db, &game).await {
        Ok(()) => {}
        Err(e) if games::is_unique_violation(&e) => {
            return Err(ApiError::BadRequest(format!(
                "A game titled '{}' already exists on platform '{}'",
                game.title, game.platform
            )));
        }
        Err(e) => {
            error!("Failed to create game '{}': {}", game.title, e);
            return Err(ApiError::Internal("Failed to create game".to_string()));
        }
    }

    info!("New game registered: {}", game.title);

    let location = format!("/games/{}", game.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(game),
    ))
}

/// PUT /games/:id
pub async fn update_game(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(game): Json<Game>,
) -> Result<StatusCode, ApiError> {
    if game.id != id {
        return Err(ApiError::BadRequest(
            "Payload id does not match the request path".to_string(),
        ));
    }
    if game.title.trim().is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }

    let updated = games::update_game(&state.db, &game).await.map_err(|e| {
        error!("Failed to update game {}: {}", id, e);
        ApiError::Internal("Failed to update game".to_string())
    })?;

    if !updated {
        return Err(ApiError::NotFound(format!("Game {} not found", id)));
    }

    info!("Game updated: {}", game.title);
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /games/:id
pub async fn patch_game(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<GamePatch>,
) -> Result<Json<Game>, ApiError> {
    let mut game = load_game(&state, id, "patch").await?;

    if let Some(rating) = patch.rating {
        game.rating = Some(rating);
    }
    if let Some(hours) = patch.hours_played {
        game.hours_played = Some(hours);
    }
    if let Some(end_date) = patch.end_date {
        game.end_date = Some(end_date);
    }
    if let Some(comments) = patch.comments {
        game.comments = Some(comments);
    }
    if let Some(status) = patch.status {
        game.status = status;
    }

    // Transitioning to Finished without an explicit end date stamps it now
    if game.status == GameStatus::Finished && game.end_date.is_none() {
        game.end_date = Some(Utc::now());
    }

    let updated = games::update_game(&state.db, &game).await.map_err(|e| {
        error!("Failed to patch game {}: {}", id, e);
        ApiError::Internal("Failed to update game".to_string())
    })?;
    if !updated {
        return Err(ApiError::NotFound(format!("Game {} not found", id)));
    }

    Ok(Json(game))
}

/// DELETE /games/:id
pub async fn delete_game(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = games::delete_game(&state.db, id).await.map_err(|e| {
        error!("Failed to delete game {}: {}", id, e);
        ApiError::Internal("Failed to delete game".to_string())
    })?;

    if !deleted {
        return Err(ApiError::NotFound(format!("Game {} not found", id)));
    }

    info!("Game deleted: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /games/without-hours
pub async fn list_games_without_hours(
    State(state): State<AppState>,
) -> Result<Json<Vec<GameWithoutHours>>, ApiError> {
    let result = games::list_games_without_hours(&state.db)
        .await
        .map_err(|e| {
            error!("Failed to list games without hours: {}", e);
            ApiError::Internal("Failed to list games without hours".to_string())
        })?;

    let slim = result
        .into_iter()
        .map(|g| GameWithoutHours {
            id: g.id,
            title: g.title,
            platform: g.platform,
            status: g.status,
            rating: g.rating,
            hours_played: g.hours_played,
        })
        .collect();

    Ok(Json(slim))
}

/// POST /games/:id/fetch-cover
///
/// Looks the title up on the cover service and persists the image URL,
/// but never overwrites a cover that is already set.
pub async fn fetch_cover(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let game = load_game(&state, id, "fetch-cover").await?;

    if game.cover_url.as_deref().is_some_and(|u| !u.is_empty()) {
        return Err(ApiError::BadRequest(
            "This game already has a cover".to_string(),
        ));
    }

    let cover = state.covers.find_cover(&game.title).await.map_err(|e| {
        error!("Cover lookup failed for '{}': {}", game.title, e);
        ApiError::Common(e)
    })?;

    let Some(cover_url) = cover else {
        return Err(ApiError::NotFound(format!(
            "No cover found for '{}'",
            game.title
        )));
    };

    games::set_cover_url(&state.db, id, &cover_url)
        .await
        .map_err(|e| {
            error!("Failed to store cover for '{}': {}", game.title, e);
            ApiError::Internal("Failed to store game cover".to_string())
        })?;

    info!("Cover stored for game: {}", game.title);

    Ok(Json(json!({
        "id": id,
        "title": game.title,
        "cover_url": cover_url,
    })))
}

/// Load a game or map the miss to a 404, logging the failing operation
async fn load_game(state: &AppState, id: Uuid, operation: &str) -> Result<Game, ApiError> {
    games::get_game(&state.db, id)
        .await
        .map_err(|e| {
            error!("Failed to load game {} for {}: {}", id, operation, e);
            ApiError::Internal("Failed to load game".to_string())
        })?
        .ok_or_else(|| ApiError::NotFound(format!("Game {} not found", id)))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
