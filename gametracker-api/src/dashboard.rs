//! Dashboard aggregation engine
//!
//! All statistics are computed over an already-materialized slice of game
//! records, independent of how that slice was fetched. This keeps the math
//! testable without a live database and guarantees every figure in one
//! summary comes from the same snapshot.

use chrono::Datelike;
use gametracker_common::db::models::{Game, GameStatus};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::import::normalize::round2;

/// Bound for every top-N selection on the dashboard
const TOP_N: usize = 5;

/// Full dashboard summary
#[derive(Debug, Default, Serialize)]
pub struct DashboardSummary {
    pub total_games: usize,
    pub finished: usize,
    pub playing: usize,
    pub backlog: usize,
    pub platinum: usize,
    /// Games whose end date falls in the requested year
    pub finished_in_year: usize,
    pub total_hours: f64,
    /// Hours of the games finished in the requested year
    pub hours_in_year: f64,
    /// Mean rating over rated games, 0 when none are rated
    pub average_rating: f64,
    pub by_platform: Vec<Distribution>,
    pub by_genre: Vec<Distribution>,
    pub average_rating_by_platform: Vec<Distribution>,
    pub recently_finished: Vec<GameHighlight>,
    pub top_rated: Vec<GameHighlight>,
    pub percent_finished: f64,
    pub average_hours_per_game: f64,
}

/// Named category with a value and its share of the total
#[derive(Debug, Serialize)]
pub struct Distribution {
    pub name: String,
    pub value: f64,
    pub percent: f64,
}

/// Slim projection of a game for dashboard lists
#[derive(Debug, Serialize)]
pub struct GameHighlight {
    pub title: String,
    pub platform: String,
    pub genre: Option<String>,
    pub rating: Option<f64>,
    pub hours_played: Option<f64>,
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
    pub cover_url: Option<String>,
}

impl From<&Game> for GameHighlight {
    fn from(game: &Game) -> Self {
        Self {
            title: game.title.clone(),
            platform: game.platform.clone(),
            genre: game.genre.clone(),
            rating: game.rating,
            hours_played: game.hours_played,
            end_date: game.end_date,
            cover_url: game.cover_url.clone(),
        }
    }
}

/// One month bucket of the finishing time series
#[derive(Debug, Serialize, PartialEq)]
pub struct MonthlyCount {
    /// "YYYY-MM"
    pub month: String,
    pub count: u64,
}

/// Compute the full summary over a record snapshot
///
/// `year` selects which calendar year the year-scoped figures cover.
/// An empty snapshot yields an all-zero summary, never an error.
pub fn summarize(games: &[Game], year: i32) -> DashboardSummary {
    if games.is_empty() {
        return DashboardSummary::default();
    }

    let total = games.len();
    let count_status =
        |status: GameStatus| games.iter().filter(|g| g.status == status).count();

    let finished = count_status(GameStatus::Finished);
    let in_year: Vec<&Game> = games
        .iter()
        .filter(|g| g.end_date.map(|d| d.year()) == Some(year))
        .collect();

    let total_hours: f64 = games.iter().filter_map(|g| g.hours_played).sum();
    let hours_in_year: f64 = in_year.iter().filter_map(|g| g.hours_played).sum();

    let rated: Vec<&Game> = games.iter().filter(|g| g.rating.is_some()).collect();
    let average_rating = if rated.is_empty() {
        0.0
    } else {
        round2(rated.iter().filter_map(|g| g.rating).sum::<f64>() / rated.len() as f64)
    };

    let by_platform = distribution(
        games.iter().map(|g| g.platform.clone()),
        total,
        None,
    );
    let by_genre = distribution(
        games.iter().filter_map(|g| {
            g.genre
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }),
        total,
        Some(TOP_N),
    );

    let average_rating_by_platform = rating_by_platform(&rated);

    let mut finished_games: Vec<&Game> = games
        .iter()
        .filter(|g| {
            matches!(g.status, GameStatus::Finished | GameStatus::Platinum)
                && g.end_date.is_some()
        })
        .collect();
    finished_games.sort_by(|a, b| b.end_date.cmp(&a.end_date));
    let recently_finished = finished_games
        .iter()
        .take(TOP_N)
        .map(|g| GameHighlight::from(*g))
        .collect();

    let mut rated_sorted = rated.clone();
    rated_sorted.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.end_date.cmp(&a.end_date))
    });
    let top_rated = rated_sorted
        .iter()
        .take(TOP_N)
        .map(|g| GameHighlight::from(*g))
        .collect();

    DashboardSummary {
        total_games: total,
        finished,
        playing: count_status(GameStatus::Playing),
        backlog: count_status(GameStatus::Backlog),
        platinum: count_status(GameStatus::Platinum),
        finished_in_year: in_year.len(),
        total_hours,
        hours_in_year,
        average_rating,
        by_platform,
        by_genre,
        average_rating_by_platform,
        recently_finished,
        top_rated,
        percent_finished: round2(finished as f64 / total as f64 * 100.0),
        average_hours_per_game: round2(total_hours / total as f64),
    }
}

/// Month-bucketed finishing time series, ascending, one entry per month
/// with at least one end-dated game
pub fn monthly_evolution(games: &[Game]) -> Vec<MonthlyCount> {
    let mut buckets: BTreeMap<(i32, u32), u64> = BTreeMap::new();
    for game in games {
        if let Some(end) = game.end_date {
            *buckets.entry((end.year(), end.month())).or_default() += 1;
        }
    }

    buckets
        .into_iter()
        .map(|((year, month), count)| MonthlyCount {
            month: format!("{:04}-{:02}", year, month),
            count,
        })
        .collect()
}

/// Count-and-percentage breakdown, sorted descending by count
fn distribution(
    names: impl Iterator<Item = String>,
    total: usize,
    limit: Option<usize>,
) -> Vec<Distribution> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in names {
        *counts.entry(name).or_default() += 1;
    }

    let mut entries: Vec<Distribution> = counts
        .into_iter()
        .map(|(name, count)| Distribution {
            name,
            value: count as f64,
            percent: round2(count as f64 / total as f64 * 100.0),
        })
        .collect();

    // Name as tie-break keeps the order stable across runs
    entries.sort_by(|a, b| {
        b.value
            .partial_cmp(&a.value)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });

    if let Some(limit) = limit {
        entries.truncate(limit);
    }
    entries
}

/// Mean rating per platform over rated games (no percentage component)
fn rating_by_platform(rated: &[&Game]) -> Vec<Distribution> {
    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for game in rated {
        if let Some(rating) = game.rating {
            let entry = sums.entry(game.platform.clone()).or_default();
            entry.0 += rating;
            entry.1 += 1;
        }
    }

    let mut entries: Vec<Distribution> = sums
        .into_iter()
        .map(|(name, (sum, count))| Distribution {
            name,
            value: round2(sum / count as f64),
            percent: 0.0,
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}
