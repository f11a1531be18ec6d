//! Alert Routes

use alerting::AlertType;
use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use storage::{AlertLogRecord, AlertRecord, ChangeEvent};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::info;

use crate::auth::Claims;
use crate::error::{ApiError, ApiResult, JsonBody, PathParam, QueryParams};
use crate::SharedState;

/// Query parameters for the logs endpoint
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    /// Maximum number of records
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    10
}

#[derive(Debug, Deserialize)]
pub struct CreateAlertRequest {
    pub alert_type: String,
    pub threshold_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAlertRequest {
    pub is_enabled: bool,
}

/// Response for the logs endpoint
#[derive(Debug, Serialize)]
pub struct AlertLogResponse {
    pub data: Vec<AlertLogRecord>,
    pub count: usize,
    pub unread_count: usize,
}

/// Caller's alert rules
pub async fn list_alerts(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Json<Vec<AlertRecord>>> {
    let user_id = claims.user_id()?;
    Ok(Json(state.repository.alerts_for_user(user_id).await?))
}

pub async fn create_alert(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    JsonBody(req): JsonBody<CreateAlertRequest>,
) -> ApiResult<(StatusCode, Json<AlertRecord>)> {
    let user_id = claims.user_id()?;
    let alert_type: AlertType = req
        .alert_type
        .parse()
        .map_err(|e: alerting::ParseAlertTypeError| ApiError::BadRequest(e.to_string()))?;
    let threshold = req
        .threshold_value
        .filter(|t| t.is_finite())
        .ok_or_else(|| ApiError::BadRequest("A numeric threshold_value is required".to_string()))?;

    let alert = state
        .repository
        .create_alert(user_id, alert_type.as_str(), threshold)
        .await?;
    info!(user_id, alert_id = alert.id, "{} alert created", alert_type.label());
    Ok((StatusCode::CREATED, Json(alert)))
}

pub async fn update_alert(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    PathParam(alert_id): PathParam<i64>,
    JsonBody(req): JsonBody<UpdateAlertRequest>,
) -> ApiResult<Json<AlertRecord>> {
    let user_id = claims.user_id()?;
    let alert = state
        .repository
        .set_alert_enabled(user_id, alert_id, req.is_enabled)
        .await
        .map_err(not_found("Alert not found"))?;
    Ok(Json(alert))
}

pub async fn delete_alert(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    PathParam(alert_id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    let user_id = claims.user_id()?;
    state
        .repository
        .delete_alert(user_id, alert_id)
        .await
        .map_err(not_found("Alert not found"))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Caller's alert history, newest first
pub async fn list_logs(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    QueryParams(params): QueryParams<LogQuery>,
) -> ApiResult<Json<AlertLogResponse>> {
    let user_id = claims.user_id()?;
    let logs = state
        .repository
        .recent_alert_logs(user_id, params.limit.clamp(1, 100))
        .await?;
    let unread = logs.iter().filter(|l| !l.is_read).count();

    Ok(Json(AlertLogResponse {
        count: logs.len(),
        unread_count: unread,
        data: logs,
    }))
}

pub async fn mark_log_read(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
    PathParam(log_id): PathParam<i64>,
) -> ApiResult<StatusCode> {
    let user_id = claims.user_id()?;
    state
        .repository
        .mark_alert_log_read(user_id, log_id)
        .await
        .map_err(not_found("Alert log not found"))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Live stream of the caller's new alert logs
pub async fn stream_alerts(
    State(state): State<SharedState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let user_id = claims.user_id()?;
    let stream = BroadcastStream::new(state.repository.subscribe()).filter_map(move |change| {
        match change {
            Ok(ChangeEvent::AlertLogInserted(log)) if log.user_id == user_id => {
                Event::default().event("alert").json_data(&log).ok().map(Ok)
            }
            // Readings, other users' logs and lag notices are skipped
            _ => None,
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn not_found(msg: &'static str) -> impl Fn(storage::StorageError) -> ApiError {
    move |e| match e {
        storage::StorageError::NotFound => ApiError::NotFound(msg.to_string()),
        other => other.into(),
    }
}
