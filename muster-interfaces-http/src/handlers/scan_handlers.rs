use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use tracing::error;

use muster_application::commands::{checkin_token_commands, scan_commands, sync_commands};
use muster_application::queries::scan_queries;
use muster_application::{AppState, ReportedLocationSampler};
use muster_domain::{
    CheckinTokenRequest, CheckinTokenResponse, ScanQuery, ScanReceipt, ScanRecord, ScanSubmission,
    SyncReport,
};

use crate::error::HttpError;
use crate::middleware::{authorize, parse_sync_envelope};

#[derive(serde::Deserialize)]
pub struct LatestScanQuery {
    pub volunteer: String,
}

pub async fn record_scan(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    Json(submission): Json<ScanSubmission>,
) -> Result<Json<ScanReceipt>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let captured_fallback = submission.recorded_at.unwrap_or_else(Utc::now);
    let sampler = ReportedLocationSampler::new(submission.location.clone(), captured_fallback);
    let receipt = scan_commands::record_scan(&state, &event_id, submission, &sampler).await?;
    Ok(Json(receipt))
}

pub async fn list_scans(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<ScanQuery>,
) -> Result<Json<Vec<ScanRecord>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let rows = scan_queries::list_scans(&state, &event_id, query).await?;
    Ok(Json(rows))
}

pub async fn latest_scan(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<LatestScanQuery>,
) -> Result<Json<ScanRecord>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    scan_queries::latest_scan(&state, &event_id, &query.volunteer)
        .await?
        .map(Json)
        .ok_or_else(|| HttpError::NotFound(format!("no scans for '{}'", query.volunteer)))
}

pub async fn sync_scans(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<SyncReport>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let envelope = parse_sync_envelope(&headers, &body, state.config.max_body_bytes).map_err(|err| {
        error!("failed to parse sync body: {}", err);
        HttpError::BadRequest(err.to_string())
    })?;
    let report = sync_commands::sync_offline_scans(&state, envelope).await?;
    Ok(Json(report))
}

pub async fn issue_checkin_token(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    payload: Option<Json<CheckinTokenRequest>>,
) -> Result<Json<CheckinTokenResponse>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let response = checkin_token_commands::issue_checkin_token(&state, &event_id, request).await?;
    Ok(Json(response))
}
