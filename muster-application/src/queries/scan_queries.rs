use tracing::error;

use crate::commands::scan_commands::normalize_required_id;
use crate::{AppError, AppState};
use muster_domain::{EventId, HistoryKey, ScanQuery, ScanRecord, VolunteerId};

const MAX_HISTORY_LIMIT: usize = 2000;

pub async fn list_scans(
    state: &AppState,
    event_id: &str,
    query: ScanQuery,
) -> Result<Vec<ScanRecord>, AppError> {
    let event_id = EventId(normalize_required_id(event_id, "event_id")?);
    let limit = query
        .limit
        .unwrap_or(state.config.history_limit)
        .clamp(1, MAX_HISTORY_LIMIT);

    let rows = match query.volunteer.as_deref() {
        Some(volunteer) => {
            let volunteer_id = VolunteerId(normalize_required_id(volunteer, "volunteer")?);
            let key = HistoryKey::new(volunteer_id, event_id);
            state.scan_repo.history(&key, limit).await
        }
        None => state.scan_repo.event_history(&event_id, limit).await,
    };
    rows.map_err(|err| {
        error!("failed to fetch scans: {}", err);
        AppError::Internal(err)
    })
}

pub async fn latest_scan(
    state: &AppState,
    event_id: &str,
    volunteer: &str,
) -> Result<Option<ScanRecord>, AppError> {
    let event_id = EventId(normalize_required_id(event_id, "event_id")?);
    let volunteer_id = VolunteerId(normalize_required_id(volunteer, "volunteer")?);
    state
        .scan_repo
        .latest(&HistoryKey::new(volunteer_id, event_id))
        .await
        .map_err(|err| {
            error!("failed to fetch latest scan: {}", err);
            AppError::Internal(err)
        })
}
