// Verification entities

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::entities::ScanEvent;
use crate::value_objects::ReasonCode;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceOutcome {
    pub within_radius: bool,
    pub distance_meters: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibilityOutcome {
    pub plausible: bool,
    pub implied_speed_kmh: Option<f64>,
}

/// Which checks an event has switched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CheckToggles {
    pub geofence: bool,
    pub speed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub accepted: bool,
    pub reason_codes: BTreeSet<ReasonCode>,
    pub distance_meters: f64,
    pub implied_speed_kmh: Option<f64>,
}

impl VerificationResult {
    pub fn invalid_sample() -> Self {
        Self {
            accepted: false,
            reason_codes: BTreeSet::from([ReasonCode::InvalidSample]),
            distance_meters: 0.0,
            implied_speed_kmh: None,
        }
    }

    pub fn has(&self, code: ReasonCode) -> bool {
        self.reason_codes.contains(&code)
    }

    pub fn needs_review(&self) -> bool {
        self.reason_codes.iter().any(ReasonCode::needs_review)
    }
}

/// A scan together with the verdict it received. This is the audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub scan: ScanEvent,
    pub result: VerificationResult,
}
