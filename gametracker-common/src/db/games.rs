//! Game record database operations

use crate::db::models::{Game, GameStatus};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

const GAME_COLUMNS: &str = "id, title, platform, genre, status, start_date, end_date, \
                            hours_played, rating, comments, cover_url, owner_id";

/// Insert a new game record
///
/// Fails with a unique violation when a record with the same
/// (title, platform) already exists; see [`is_unique_violation`].
pub async fn insert_game(pool: &SqlitePool, game: &Game) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO games (id, title, platform, genre, status, start_date, end_date,
                           hours_played, rating, comments, cover_url, owner_id,
                           created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(game.id.to_string())
    .bind(&game.title)
    .bind(&game.platform)
    .bind(&game.genre)
    .bind(game.status.as_str())
    .bind(game.start_date.map(|d| d.to_rfc3339()))
    .bind(game.end_date.map(|d| d.to_rfc3339()))
    .bind(game.hours_played)
    .bind(game.rating)
    .bind(&game.comments)
    .bind(&game.cover_url)
    .bind(game.owner_id.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    Ok(())
}

/// True when the error is a store-level (title, platform) uniqueness conflict
pub fn is_unique_violation(err: &Error) -> bool {
    match err {
        Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
        _ => false,
    }
}

/// Load one game by identifier
pub async fn get_game(pool: &SqlitePool, id: Uuid) -> Result<Option<Game>> {
    let row = sqlx::query(&format!("SELECT {} FROM games WHERE id = ?", GAME_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.map(|r| row_to_game(&r)).transpose()
}

/// List games, optionally filtered by status and title substring,
/// ordered by title
pub async fn list_games(
    pool: &SqlitePool,
    status: Option<GameStatus>,
    title: Option<&str>,
) -> Result<Vec<Game>> {
    let mut sql = format!("SELECT {} FROM games WHERE 1=1", GAME_COLUMNS);
    if status.is_some() {
        sql.push_str(" AND status = ?");
    }
    if title.is_some() {
        sql.push_str(" AND title LIKE '%' || ? || '%'");
    }
    sql.push_str(" ORDER BY title COLLATE NOCASE");

    let mut query = sqlx::query(&sql);
    if let Some(status) = status {
        query = query.bind(status.as_str());
    }
    if let Some(title) = title {
        query = query.bind(title);
    }

    let rows = query.fetch_all(pool).await?;
    rows.iter().map(row_to_game).collect()
}

/// Load the full record set (dashboard aggregation input)
pub async fn list_all_games(pool: &SqlitePool) -> Result<Vec<Game>> {
    let rows = sqlx::query(&format!("SELECT {} FROM games", GAME_COLUMNS))
        .fetch_all(pool)
        .await?;
    rows.iter().map(row_to_game).collect()
}

/// List games with no recorded hours (null or zero), ordered by title
pub async fn list_games_without_hours(pool: &SqlitePool) -> Result<Vec<Game>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM games WHERE hours_played IS NULL OR hours_played = 0 \
         ORDER BY title COLLATE NOCASE",
        GAME_COLUMNS
    ))
    .fetch_all(pool)
    .await?;
    rows.iter().map(row_to_game).collect()
}

/// Full update of an existing record; returns false when the id is unknown
pub async fn update_game(pool: &SqlitePool, game: &Game) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE games SET
            title = ?, platform = ?, genre = ?, status = ?, start_date = ?,
            end_date = ?, hours_played = ?, rating = ?, comments = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&game.title)
    .bind(&game.platform)
    .bind(&game.genre)
    .bind(game.status.as_str())
    .bind(game.start_date.map(|d| d.to_rfc3339()))
    .bind(game.end_date.map(|d| d.to_rfc3339()))
    .bind(game.hours_played)
    .bind(game.rating)
    .bind(&game.comments)
    .bind(game.id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete a record; returns false when the id is unknown
pub async fn delete_game(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM games WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Check whether a (title, platform) pair already exists
pub async fn game_exists(pool: &SqlitePool, title: &str, platform: &str) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM games WHERE title = ? AND platform = ?")
            .bind(title)
            .bind(platform)
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// Persist a cover-art URL onto a record
pub async fn set_cover_url(pool: &SqlitePool, id: Uuid, url: &str) -> Result<()> {
    sqlx::query("UPDATE games SET cover_url = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?")
        .bind(url)
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Map a database row onto the domain model
fn row_to_game(row: &SqliteRow) -> Result<Game> {
    let id_str: String = row.get("id");
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| Error::Internal(format!("Corrupt game id {}: {}", id_str, e)))?;

    let status_str: String = row.get("status");
    let status = status_str
        .parse::<GameStatus>()
        .map_err(Error::Internal)?;

    let owner_id = row
        .get::<Option<String>, _>("owner_id")
        .map(|s| {
            Uuid::parse_str(&s)
                .map_err(|e| Error::Internal(format!("Corrupt owner id {}: {}", s, e)))
        })
        .transpose()?;

    Ok(Game {
        id,
        title: row.get("title"),
        platform: row.get("platform"),
        genre: row.get("genre"),
        status,
        start_date: parse_stored_date(row.get("start_date"))?,
        end_date: parse_stored_date(row.get("end_date"))?,
        hours_played: row.get("hours_played"),
        rating: row.get("rating"),
        comments: row.get("comments"),
        cover_url: row.get("cover_url"),
        owner_id,
    })
}

fn parse_stored_date(value: Option<String>) -> Result<Option<DateTime<Utc>>> {
    value
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|d| d.with_timezone(&Utc))
                .map_err(|e| Error::Internal(format!("Corrupt stored date {}: {}", s, e)))
        })
        .transpose()
}
