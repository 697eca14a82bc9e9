// Attendance entities
// Derived from accepted check-in/check-out pairs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{EventId, VolunteerId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSession {
    pub checked_in_at: DateTime<Utc>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub volunteer_id: VolunteerId,
    pub event_id: EventId,
    pub sessions: Vec<AttendanceSession>,
    pub total_minutes: i64,
    pub flagged_scans: usize,
    pub open_session: bool,
}
