// Scan event entity
// One physical check-in/check-out scan; immutable once created

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::LocationSample;
use crate::value_objects::{EventId, HistoryKey, ScanAction, ScanMethod, VolunteerId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub scan_id: Uuid,
    pub volunteer_id: VolunteerId,
    pub event_id: EventId,
    pub action: ScanAction,
    pub method: ScanMethod,
    pub sample: LocationSample,
    pub recorded_at: DateTime<Utc>,
}

impl ScanEvent {
    pub fn new(
        volunteer_id: VolunteerId,
        event_id: EventId,
        action: ScanAction,
        method: ScanMethod,
        sample: LocationSample,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            scan_id: Uuid::new_v4(),
            volunteer_id,
            event_id,
            action,
            method,
            sample,
            recorded_at,
        }
    }

    pub fn history_key(&self) -> HistoryKey {
        HistoryKey::new(self.volunteer_id.clone(), self.event_id.clone())
    }
}
