// Event policy entity
// Per-event check-in configuration

use serde::{Deserialize, Serialize};

use crate::entities::GeofenceConfig;
use crate::error::DomainError;
use crate::services::DEFAULT_SPEED_THRESHOLD_KMH;
use crate::value_objects::EventId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPolicy {
    pub event_id: EventId,
    pub geofence: GeofenceConfig,
    #[serde(default = "default_true")]
    pub enable_geofence: bool,
    #[serde(default = "default_true")]
    pub enable_speed_check: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_threshold_kmh: Option<f64>,
    #[serde(default)]
    pub require_checkin_token: bool,
}

impl EventPolicy {
    pub fn effective_threshold(&self, fallback: f64) -> f64 {
        self.speed_threshold_kmh.unwrap_or(if fallback > 0.0 {
            fallback
        } else {
            DEFAULT_SPEED_THRESHOLD_KMH
        })
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.geofence.validate()?;
        if let Some(threshold) = self.speed_threshold_kmh {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(DomainError::InvalidThreshold(threshold));
            }
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}
