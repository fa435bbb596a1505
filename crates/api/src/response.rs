//! Shared response envelope types for API handlers.
//!
//! Resource responses use a `{ "data": ... }` envelope. Use [`DataResponse`]
//! instead of ad-hoc `serde_json::json!({ "data": ... })`.

use axum::http::header;
use axum::response::IntoResponse;
use serde::Serialize;
use shopdesk_core::csv::CsvLineError;
use shopdesk_db::models::customer::UpsertOutcome;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Counts returned by CSV imports.
#[derive(Debug, Default, Serialize)]
pub struct ImportSummary {
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<CsvLineError>,
}

impl ImportSummary {
    pub fn new(outcomes: &[UpsertOutcome], errors: Vec<CsvLineError>) -> Self {
        let created = outcomes
            .iter()
            .filter(|o| **o == UpsertOutcome::Created)
            .count();
        Self {
            created,
            updated: outcomes.len() - created,
            errors,
        }
    }
}

/// A `text/csv` download with a suggested file name.
pub fn csv_attachment(filename: &str, body: String) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
}
