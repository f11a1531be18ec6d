//! Export Routes

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse},
};
use chrono::Utc;
use storage::now_ms;

use crate::error::{ApiError, ApiResult, QueryParams};
use crate::export::{readings_to_csv, readings_to_html};
use crate::routes::readings::{load_history, HistoryQuery};
use crate::SharedState;

/// Download the history query as CSV
pub async fn export_csv(
    State(state): State<SharedState>,
    QueryParams(query): QueryParams<HistoryQuery>,
) -> ApiResult<impl IntoResponse> {
    let readings = load_history(&state, &query).await?;
    if readings.is_empty() {
        return Err(ApiError::NotFound("No data available to export".to_string()));
    }

    let body = readings_to_csv(&readings)?;
    let disposition = format!(
        "attachment; filename=\"air-quality-data-{}.csv\"",
        Utc::now().format("%Y-%m-%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Printable HTML report of the history query
pub async fn export_report(
    State(state): State<SharedState>,
    QueryParams(query): QueryParams<HistoryQuery>,
) -> ApiResult<Html<String>> {
    let readings = load_history(&state, &query).await?;
    if readings.is_empty() {
        return Err(ApiError::NotFound("No data available to export".to_string()));
    }
    Ok(Html(readings_to_html(&readings, now_ms())))
}
