use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;

use muster_application::commands::policy_commands;
use muster_application::queries::policy_queries;
use muster_application::AppState;
use muster_domain::EventPolicy;

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn get_event_policy(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<EventPolicy>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let policy = policy_queries::get_event_policy(&state, &event_id).await?;
    Ok(Json(policy))
}

pub async fn put_event_policy(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<EventPolicy>,
) -> Result<Json<EventPolicy>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let policy = policy_commands::upsert_event_policy(&state, &event_id, payload).await?;
    Ok(Json(policy))
}

pub async fn delete_event_policy(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    policy_commands::remove_event_policy(&state, &event_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_event_policies(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<EventPolicy>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(policy_queries::list_event_policies(&state).await))
}
