//! Integration tests for the CSV import pipeline
//!
//! Covers the multipart endpoint end-to-end plus pipeline-level behavior
//! (deduplication, normalization, cancellation) against in-memory SQLite.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use gametracker_api::{build_router, covers::CoverClient, import, AppState};
use gametracker_common::db::{games, init_memory_database};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::util::ServiceExt;

const CSV_HEADER: &str =
    "Title,Platform,Backlog,Completed,Completion Date,Review,Review Notes,Main Story,Main + Extras,Completionist,Storefront";

async fn setup_app() -> (Router, sqlx::SqlitePool) {
    let pool = init_memory_database().await.expect("schema should apply");
    let covers = CoverClient::new(None).expect("client should build");
    let state = AppState::new(pool.clone(), covers);
    (build_router(state), pool)
}

fn multipart_request(field_name: &str, csv: &str) -> Request<Body> {
    let boundary = "gt-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; \
             name=\"{field_name}\"; filename=\"import.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(csv.as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/import/csv")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("should read body");
    serde_json::from_slice(&bytes).expect("should parse JSON")
}

#[tokio::test]
async fn three_row_scenario_valid_duplicate_empty() {
    let (app, pool) = setup_app().await;

    let csv = format!(
        "{CSV_HEADER}\n\
         Hades,PC,,X,2023-05-01,95,,21 Hours,40 Hours,90 Hours,Steam\n\
         Hades,PC,,X,2023-05-01,95,,21 Hours,40 Hours,90 Hours,Steam\n\
         ,PC,,,,,,,,,\n"
    );

    let response = app.oneshot(multipart_request("File", &csv)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let outcome = extract_json(response.into_body()).await;
    assert_eq!(outcome["total_read"], 3);
    assert_eq!(outcome["inserted"], 1);
    assert_eq!(outcome["skipped"], 2);
    let errors = outcome["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    // Row 1 is the header, so the empty-title row is row 4
    assert_eq!(errors[0]["row"], 4);
    assert_eq!(errors[0]["message"], "Empty title");

    let stored = games::list_all_games(&pool).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "Hades");
}

#[tokio::test]
async fn imported_row_fields_are_normalized() {
    let (app, pool) = setup_app().await;

    let csv = format!(
        "{CSV_HEADER}\n\
         Elden Ring,  PS5 ,,X,2023-05-01,95,,55 Hours,10-12 Hours,8½ Hours,\n"
    );

    let response = app.oneshot(multipart_request("File", &csv)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = games::list_all_games(&pool).await.unwrap();
    assert_eq!(stored.len(), 1);
    let game = &stored[0];
    assert_eq!(game.platform, "PS5");
    // 95 on a 0-100 scale becomes 9.5
    assert_eq!(game.rating, Some(9.5));
    // 55 + mean(10,12) + 8.5
    assert_eq!(game.hours_played, Some(74.5));
    assert_eq!(game.status.as_str(), "Finished");
    let end = game.end_date.expect("completion date parsed");
    assert_eq!(end.format("%Y-%m-%d").to_string(), "2023-05-01");
    // No review notes and no storefront: no comments
    assert!(game.comments.is_none());
}

#[tokio::test]
async fn storefront_becomes_origin_comment_when_no_notes() {
    let (app, pool) = setup_app().await;

    let csv = format!(
        "{CSV_HEADER}\n\
         Portal 2,PC,X,,,,,,,,Steam\n\
         Braid,PC,,,,,Loved the ending,,,,GOG\n"
    );

    let response = app.oneshot(multipart_request("File", &csv)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = games::list_all_games(&pool).await.unwrap();
    let portal = stored.iter().find(|g| g.title == "Portal 2").unwrap();
    assert_eq!(portal.comments.as_deref(), Some("Origem: Steam"));
    assert_eq!(portal.status.as_str(), "Backlog");

    let braid = stored.iter().find(|g| g.title == "Braid").unwrap();
    assert_eq!(braid.comments.as_deref(), Some("Loved the ending"));
    assert_eq!(braid.status.as_str(), "Playing");
}

#[tokio::test]
async fn finished_without_parseable_date_is_stamped_now() {
    let (app, pool) = setup_app().await;
    let before = Utc::now();

    let csv = format!(
        "{CSV_HEADER}\n\
         Stray,PS5,,X,--,,,,,,\n"
    );

    let response = app.oneshot(multipart_request("File", &csv)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = games::list_all_games(&pool).await.unwrap();
    let end = stored[0].end_date.expect("end date stamped");
    assert!(end >= before && end <= Utc::now());
}

#[tokio::test]
async fn missing_platform_defaults_to_unknown() {
    let (app, pool) = setup_app().await;

    let csv = format!(
        "{CSV_HEADER}\n\
         Minesweeper,,,,,,,,,,\n"
    );

    app.oneshot(multipart_request("File", &csv)).await.unwrap();

    let stored = games::list_all_games(&pool).await.unwrap();
    assert_eq!(stored[0].platform, "Unknown");
}

#[tokio::test]
async fn reimporting_the_same_file_skips_everything() {
    let (app, pool) = setup_app().await;

    let csv = format!(
        "{CSV_HEADER}\n\
         Hades,PC,,X,2023-05-01,,,,,,\n\
         Celeste,Switch,X,,,,,,,,\n"
    );

    let response = app
        .clone()
        .oneshot(multipart_request("File", &csv))
        .await
        .unwrap();
    let outcome = extract_json(response.into_body()).await;
    assert_eq!(outcome["inserted"], 2);

    let response = app.oneshot(multipart_request("File", &csv)).await.unwrap();
    let outcome = extract_json(response.into_body()).await;
    assert_eq!(outcome["total_read"], 2);
    assert_eq!(outcome["inserted"], 0);
    assert_eq!(outcome["skipped"], 2);
    assert_eq!(outcome["errors"].as_array().unwrap().len(), 0);

    assert_eq!(games::list_all_games(&pool).await.unwrap().len(), 2);
}

#[tokio::test]
async fn field_name_is_matched_case_insensitively() {
    let (app, _pool) = setup_app().await;

    let csv = format!("{CSV_HEADER}\nHades,PC,,,,,,,,,\n");
    let response = app.oneshot(multipart_request("file", &csv)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_without_file_field_is_rejected() {
    let (app, _pool) = setup_app().await;

    let csv = format!("{CSV_HEADER}\nHades,PC,,,,,,,,,\n");
    let response = app
        .clone()
        .oneshot(multipart_request("attachment", &csv))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(multipart_request("File", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn positional_fallback_for_completion_date() {
    let (app, pool) = setup_app().await;

    // Layout without a completion-date header; the date sits at the 13th
    // column of the row
    let header = "Title,Platform,Backlog,Completed,Review,Review Notes,Main Story,Main + Extras,Completionist,Storefront,Extra1,Extra2,Extra3";
    let csv = format!(
        "{header}\n\
         Ico,PS2,,X,,,,,,,a,b,2022-11-20\n"
    );

    let response = app.oneshot(multipart_request("File", &csv)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = games::list_all_games(&pool).await.unwrap();
    let end = stored[0].end_date.expect("date from positional column");
    assert_eq!(end.format("%Y-%m-%d").to_string(), "2022-11-20");
}

#[tokio::test]
async fn cancellation_stops_at_the_row_boundary() {
    let pool = init_memory_database().await.unwrap();

    let csv = format!("{CSV_HEADER}\nHades,PC,,,,,,,,,\nCeleste,PC,,,,,,,,,\n");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = import::import_csv(&pool, csv.as_bytes(), &cancel)
        .await
        .unwrap();
    assert_eq!(outcome.total_read, 0);
    assert_eq!(outcome.inserted, 0);
    assert!(outcome.errors.is_empty());
    assert!(games::list_all_games(&pool).await.unwrap().is_empty());
}

#[tokio::test]
async fn long_title_and_platform_are_truncated() {
    let (app, pool) = setup_app().await;

    let long_title = "T".repeat(250);
    let long_platform = "P".repeat(80);
    let csv = format!("{CSV_HEADER}\n{long_title},{long_platform},,,,,,,,,\n");

    let response = app.oneshot(multipart_request("File", &csv)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = games::list_all_games(&pool).await.unwrap();
    assert_eq!(stored[0].title.chars().count(), 200);
    assert_eq!(stored[0].platform.chars().count(), 50);
}
