use crate::entities::{AttendanceSession, AttendanceSummary, ScanRecord};
use crate::value_objects::{EventId, ScanAction, VolunteerId};

/// Pairs accepted check-ins with the next accepted check-out. Rejected scans
/// only count towards `flagged_scans`; a repeated check-in keeps the earlier one.
pub fn summarize_attendance(
    volunteer_id: &VolunteerId,
    event_id: &EventId,
    records: &[ScanRecord],
) -> AttendanceSummary {
    let mut sessions = Vec::new();
    let mut open = None;
    let mut flagged_scans = 0;

    for record in records {
        if !record.result.accepted {
            flagged_scans += 1;
            continue;
        }
        match record.scan.action {
            ScanAction::CheckIn => {
                if open.is_none() {
                    open = Some(record.scan.recorded_at);
                }
            }
            ScanAction::CheckOut => {
                let Some(checked_in_at) = open.take() else {
                    continue;
                };
                let checked_out_at = record.scan.recorded_at;
                sessions.push(AttendanceSession {
                    checked_in_at,
                    checked_out_at: Some(checked_out_at),
                    minutes: (checked_out_at - checked_in_at).num_minutes().max(0),
                });
            }
        }
    }

    let open_session = open.is_some();
    if let Some(checked_in_at) = open {
        sessions.push(AttendanceSession {
            checked_in_at,
            checked_out_at: None,
            minutes: 0,
        });
    }

    AttendanceSummary {
        volunteer_id: volunteer_id.clone(),
        event_id: event_id.clone(),
        total_minutes: sessions.iter().map(|session| session.minutes).sum(),
        sessions,
        flagged_scans,
        open_session,
    }
}
