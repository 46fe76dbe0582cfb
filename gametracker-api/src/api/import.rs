//! CSV upload endpoint

use axum::extract::{Multipart, State};
use axum::Json;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::error::ApiError;
use crate::import::{self, ImportOutcome};
use crate::AppState;

/// POST /import/csv
///
/// Multipart upload; the CSV bytes are expected under the form field
/// "File" (matched case-insensitively).
pub async fn import_csv(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImportOutcome>, ApiError> {
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        let is_file_field = field
            .name()
            .is_some_and(|name| name.eq_ignore_ascii_case("file"));
        if is_file_field {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
            data = Some(bytes.to_vec());
            break;
        }
    }

    let Some(data) = data else {
        return Err(ApiError::BadRequest(
            "No CSV file was uploaded".to_string(),
        ));
    };
    if data.is_empty() {
        return Err(ApiError::BadRequest(
            "Uploaded CSV file is empty".to_string(),
        ));
    }

    // Imports are request-scoped; the token exists so the pipeline can be
    // stopped cooperatively at a row boundary
    let cancel = CancellationToken::new();
    let outcome = import::import_csv(&state.db, &data, &cancel)
        .await
        .map_err(|e| {
            error!("CSV import failed: {}", e);
            ApiError::Internal("Failed to import the CSV file".to_string())
        })?;

    Ok(Json(outcome))
}
