use std::collections::BTreeMap;

use tracing::error;

use crate::commands::scan_commands::normalize_required_id;
use crate::{AppError, AppState};
use muster_domain::{
    summarize_attendance, AttendanceQuery, AttendanceSummary, EventId, HistoryKey, ScanRecord,
    VolunteerId,
};

const MAX_EVENT_RECORDS: usize = 50_000;

/// Attendance derived from stored scans, one summary per volunteer.
pub async fn attendance_summary(
    state: &AppState,
    event_id: &str,
    query: AttendanceQuery,
) -> Result<Vec<AttendanceSummary>, AppError> {
    let event_id = EventId(normalize_required_id(event_id, "event_id")?);

    if let Some(volunteer) = query.volunteer.as_deref() {
        let volunteer_id = VolunteerId(normalize_required_id(volunteer, "volunteer")?);
        let key = HistoryKey::new(volunteer_id.clone(), event_id.clone());
        let records = state
            .scan_repo
            .history(&key, MAX_EVENT_RECORDS)
            .await
            .map_err(|err| {
                error!("failed to fetch attendance history: {}", err);
                AppError::Internal(err)
            })?;
        return Ok(vec![summarize_attendance(&volunteer_id, &event_id, &records)]);
    }

    let records = state
        .scan_repo
        .event_history(&event_id, MAX_EVENT_RECORDS)
        .await
        .map_err(|err| {
            error!("failed to fetch event attendance: {}", err);
            AppError::Internal(err)
        })?;

    let mut by_volunteer: BTreeMap<VolunteerId, Vec<ScanRecord>> = BTreeMap::new();
    for record in records {
        by_volunteer
            .entry(record.scan.volunteer_id.clone())
            .or_default()
            .push(record);
    }
    Ok(by_volunteer
        .iter()
        .map(|(volunteer_id, records)| summarize_attendance(volunteer_id, &event_id, records))
        .collect())
}
