use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use tokio::time::{timeout, Duration};
use tracing::error;

use muster_application::AppState;
use muster_domain::ReviewDeliveryRecord;

use crate::error::HttpError;
use crate::middleware::authorize;

#[derive(serde::Serialize)]
struct ReviewTargetStatus {
    status: String,
    mode: String,
}

#[derive(serde::Deserialize)]
pub struct ReviewDeliveryQuery {
    pub limit: Option<usize>,
}

fn review_target_response(status: StatusCode, label: &str, mode: &str) -> axum::response::Response {
    (
        status,
        Json(ReviewTargetStatus {
            status: label.to_string(),
            mode: mode.to_string(),
        }),
    )
        .into_response()
}

pub async fn review_target_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return review_target_response(StatusCode::UNAUTHORIZED, "unauthorized", "unset");
    }

    let timeout_secs = state.config.request_timeout_seconds.max(1);
    let mode = match state.config.review_webhook_url.as_deref() {
        Some(url) if url.starts_with("ws://") || url.starts_with("wss://") => "ws",
        Some(_) => "http",
        None => "unset",
    };

    match timeout(
        Duration::from_secs(timeout_secs),
        state.review_notifier.check_review_target(&state.config),
    )
    .await
    {
        Ok(Ok(_)) => review_target_response(StatusCode::OK, "ok", mode),
        Ok(Err(err)) => {
            error!("review target check failed: {}", err);
            review_target_response(StatusCode::SERVICE_UNAVAILABLE, "error", mode)
        }
        Err(_) => {
            error!("review target check timeout after {}s", timeout_secs);
            review_target_response(StatusCode::SERVICE_UNAVAILABLE, "timeout", mode)
        }
    }
}

pub async fn list_review_deliveries(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReviewDeliveryQuery>,
) -> Result<Json<Vec<ReviewDeliveryRecord>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let deliveries = state.review_notifier.list_review_deliveries(limit).await;
    Ok(Json(deliveries))
}

pub async fn get_last_review_delivery(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Option<ReviewDeliveryRecord>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let last = state.review_notifier.last_review_delivery().await;
    Ok(Json(last))
}

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

pub async fn health_ready(State(state): State<AppState>) -> StatusCode {
    let timeout_secs = state.config.request_timeout_seconds.max(1);
    match timeout(Duration::from_secs(timeout_secs), state.scan_repo.ping()).await {
        Ok(Ok(_)) => StatusCode::OK,
        Ok(Err(err)) => {
            error!("ready check failed: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(_) => {
            error!("ready check timeout after {}s", timeout_secs);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !authorize(&state.config, &headers) {
        return (StatusCode::UNAUTHORIZED, "unauthorized".to_string()).into_response();
    }
    let payload = state.metrics.render_prometheus();
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    (headers, payload).into_response()
}
