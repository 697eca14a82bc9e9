use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;

use muster_application::queries::attendance_queries;
use muster_application::AppState;
use muster_domain::{AttendanceQuery, AttendanceSummary};

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn attendance_summary(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
    headers: HeaderMap,
    Query(query): Query<AttendanceQuery>,
) -> Result<Json<Vec<AttendanceSummary>>, HttpError> {
    if !authorize(&state.config, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let summaries = attendance_queries::attendance_summary(&state, &event_id, query).await?;
    Ok(Json(summaries))
}
