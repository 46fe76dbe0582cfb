//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Progress state of a tracked game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    Backlog,
    Playing,
    Finished,
    Platinum,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Backlog => "Backlog",
            GameStatus::Playing => "Playing",
            GameStatus::Finished => "Finished",
            GameStatus::Platinum => "Platinum",
        }
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        GameStatus::Backlog
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = String;

    /// Case-insensitive parse, used for query parameters and stored values
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backlog" => Ok(GameStatus::Backlog),
            "playing" => Ok(GameStatus::Playing),
            "finished" => Ok(GameStatus::Finished),
            "platinum" => Ok(GameStatus::Platinum),
            other => Err(format!("Unknown game status: {}", other)),
        }
    }
}

/// One tracked title/platform combination and its play state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: Uuid,
    pub title: String,
    pub platform: String,
    pub genre: Option<String>,
    pub status: GameStatus,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub hours_played: Option<f64>,
    pub rating: Option<f64>,
    pub comments: Option<String>,
    pub cover_url: Option<String>,
    pub owner_id: Option<Uuid>,
}

impl Game {
    /// Create a new record with a fresh identifier and default status
    pub fn new(title: String, platform: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            platform,
            genre: None,
            status: GameStatus::default(),
            start_date: None,
            end_date: None,
            hours_played: None,
            rating: None,
            comments: None,
            cover_url: None,
            owner_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("finished".parse::<GameStatus>().unwrap(), GameStatus::Finished);
        assert_eq!("BACKLOG".parse::<GameStatus>().unwrap(), GameStatus::Backlog);
        assert_eq!(" Platinum ".parse::<GameStatus>().unwrap(), GameStatus::Platinum);
        assert!("done".parse::<GameStatus>().is_err());
    }

    #[test]
    fn status_round_trips_through_as_str() {
        for status in [
            GameStatus::Backlog,
            GameStatus::Playing,
            GameStatus::Finished,
            GameStatus::Platinum,
        ] {
            assert_eq!(status.as_str().parse::<GameStatus>().unwrap(), status);
        }
    }
}
