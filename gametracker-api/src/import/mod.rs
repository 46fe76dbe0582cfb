//! CSV import pipeline
//!
//! Ingests third-party export files row by row: each row is normalized,
//! checked against existing records, and persisted individually so that one
//! bad row can never abort the batch. The outcome carries a full tally with
//! one error entry per rejected row.

pub mod normalize;

use chrono::Utc;
use csv::StringRecord;
use gametracker_common::db::games;
use gametracker_common::db::models::{Game, GameStatus};
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use normalize::{normalize_header, parse_completion_date, parse_hours, parse_rating};

/// Positional fallback for the completion date when the header is absent
/// (13th column in the known export layout)
const COMPLETION_DATE_FALLBACK_INDEX: usize = 12;

const MAX_TITLE_LEN: usize = 200;
const MAX_PLATFORM_LEN: usize = 50;

/// Structured outcome of one import run
#[derive(Debug, Default, Serialize)]
pub struct ImportOutcome {
    /// Rows actually read from the file (header excluded)
    pub total_read: u64,
    /// Rows persisted as new game records
    pub inserted: u64,
    /// Rows not persisted (duplicates, bad data, failed writes)
    pub skipped: u64,
    /// One entry per rejected row; duplicates are skipped silently
    pub errors: Vec<ImportRowError>,
}

/// One rejected row
#[derive(Debug, Serialize)]
pub struct ImportRowError {
    /// 1-based file row number (row 1 is the header)
    pub row: u64,
    pub title: Option<String>,
    pub message: String,
    pub detail: Option<String>,
}

/// Header-name to column-position map with tolerant matching
struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    fn new(headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (normalize_header(name), i))
            .collect();
        Self { positions }
    }

    /// Field value for a normalized header name, empty when the column is
    /// missing from the file
    fn field<'a>(&self, record: &'a StringRecord, name: &str) -> &'a str {
        self.positions
            .get(name)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }

    fn has(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }
}

/// Import game records from CSV bytes
///
/// Rows are processed strictly sequentially, one insert per row. The
/// cancellation token is checked at each row boundary; when signaled,
/// processing stops without erroring the remaining rows.
pub async fn import_csv(
    pool: &SqlitePool,
    data: &[u8],
    cancel: &CancellationToken,
) -> anyhow::Result<ImportOutcome> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let index = HeaderIndex::new(&headers);

    let mut outcome = ImportOutcome::default();
    let mut row = 1; // row 1 is the header

    for record in reader.records() {
        row += 1;
        if cancel.is_cancelled() {
            info!("Import cancelled at row {}", row);
            break;
        }
        outcome.total_read += 1;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                outcome.skipped += 1;
                outcome.errors.push(ImportRowError {
                    row,
                    title: None,
                    message: "Failed to parse row".to_string(),
                    detail: Some(e.to_string()),
                });
                continue;
            }
        };

        process_row(pool, &index, &record, row, &mut outcome).await;
    }

    info!(
        "CSV import finished: read={} inserted={} skipped={} errors={}",
        outcome.total_read,
        outcome.inserted,
        outcome.skipped,
        outcome.errors.len()
    );

    Ok(outcome)
}

/// Normalize and persist one row, updating the tally
async fn process_row(
    pool: &SqlitePool,
    index: &HeaderIndex,
    record: &StringRecord,
    row: u64,
    outcome: &mut ImportOutcome,
) {
    let raw_title = index.field(record, "title").trim();
    if raw_title.is_empty() {
        outcome.skipped += 1;
        outcome.errors.push(ImportRowError {
            row,
            title: None,
            message: "Empty title".to_string(),
            detail: None,
        });
        return;
    }

    let title = truncate(raw_title, MAX_TITLE_LEN);

    let raw_platform = index.field(record, "platform").trim();
    let platform = if raw_platform.is_empty() {
        "Unknown".to_string()
    } else {
        truncate(raw_platform, MAX_PLATFORM_LEN)
    };

    // Dedupe fast path; the unique index on (title, platform) still catches
    // anything that slips between this check and the insert
    match games::game_exists(pool, &title, &platform).await {
        Ok(true) => {
            outcome.skipped += 1;
            return;
        }
        Ok(false) => {}
        Err(e) => {
            error!("Duplicate check failed for row {} ({}): {}", row, title, e);
            outcome.skipped += 1;
            outcome.errors.push(ImportRowError {
                row,
                title: Some(title),
                message: "Failed to check for duplicates".to_string(),
                detail: Some(e.to_string()),
            });
            return;
        }
    }

    let mut game = Game::new(title.clone(), platform);

    let review_notes = index.field(record, "reviewnotes").trim();
    let storefront = index.field(record, "storefront").trim();
    game.comments = if !review_notes.is_empty() {
        Some(review_notes.to_string())
    } else if !storefront.is_empty() {
        Some(format!("Origem: {}", storefront))
    } else {
        None
    };

    game.rating = parse_rating(index.field(record, "review"));

    game.status = derive_status(
        index.field(record, "completed"),
        index.field(record, "backlog"),
    );

    game.hours_played = Some(
        parse_hours(index.field(record, "mainstory"))
            + parse_hours(index.field(record, "mainextras"))
            + parse_hours(index.field(record, "completionist")),
    );

    let raw_date = if index.has("completiondate") {
        index.field(record, "completiondate")
    } else {
        // Older export layout without the header; the completion date sits
        // at a fixed position
        record.get(COMPLETION_DATE_FALLBACK_INDEX).unwrap_or("")
    };
    game.end_date = parse_completion_date(raw_date);
    if game.end_date.is_none() && game.status == GameStatus::Finished {
        game.end_date = Some(Utc::now());
    }

    match games::insert_game(pool, &game).await {
        Ok(()) => outcome.inserted += 1,
        Err(e) if games::is_unique_violation(&e) => {
            // Concurrent writer won the race; same outcome as the pre-check
            outcome.skipped += 1;
        }
        Err(e) => {
            error!("Failed to save row {} ({}): {}", row, title, e);
            outcome.skipped += 1;
            outcome.errors.push(ImportRowError {
                row,
                title: Some(title),
                message: "Failed to save record".to_string(),
                detail: Some(e.to_string()),
            });
        }
    }
}

/// Status derivation: Completed "X" wins over Backlog "X"; everything else
/// is in progress
fn derive_status(completed: &str, backlog: &str) -> GameStatus {
    if completed.trim().eq_ignore_ascii_case("x") {
        GameStatus::Finished
    } else if backlog.trim().eq_ignore_ascii_case("x") {
        GameStatus::Backlog
    } else {
        GameStatus::Playing
    }
}

/// Truncate to at most `max` characters, respecting char boundaries
fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_derivation_precedence() {
        assert_eq!(derive_status("X", ""), GameStatus::Finished);
        assert_eq!(derive_status("x", "X"), GameStatus::Finished);
        assert_eq!(derive_status("", "X"), GameStatus::Backlog);
        assert_eq!(derive_status("", " x "), GameStatus::Backlog);
        assert_eq!(derive_status("", ""), GameStatus::Playing);
        assert_eq!(derive_status("no", "no"), GameStatus::Playing);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 10), "ab");
        // Multi-byte characters count as one
        assert_eq!(truncate("ééééé", 3), "ééé");
    }

    #[test]
    fn header_index_matches_tolerantly() {
        let headers = StringRecord::from(vec!["Title", " Main Story ", "Completion Date"]);
        let index = HeaderIndex::new(&headers);
        let record = StringRecord::from(vec!["Hades", "21 Hours", "2023-01-01"]);

        assert_eq!(index.field(&record, "title"), "Hades");
        assert_eq!(index.field(&record, "mainstory"), "21 Hours");
        assert!(index.has("completiondate"));
        assert!(!index.has("storefront"));
        assert_eq!(index.field(&record, "storefront"), "");
    }
}
