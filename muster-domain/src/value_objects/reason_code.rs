// Reason code value object

use serde::{Deserialize, Serialize};

/// Why a scan was not accepted. Carried as data, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReasonCode {
    InvalidSample,
    OutsideGeofence,
    ImplausibleSpeed,
    /// Arrived after a scan that was recorded later, typically an offline
    /// replay. The speed check is skipped since there is no true predecessor.
    OutOfOrder,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::InvalidSample => "InvalidSample",
            ReasonCode::OutsideGeofence => "OutsideGeofence",
            ReasonCode::ImplausibleSpeed => "ImplausibleSpeed",
            ReasonCode::OutOfOrder => "OutOfOrder",
        }
    }

    /// Codes that send the stored scan to a human reviewer.
    pub fn needs_review(&self) -> bool {
        matches!(
            self,
            ReasonCode::OutsideGeofence | ReasonCode::ImplausibleSpeed | ReasonCode::OutOfOrder
        )
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ReasonCode::InvalidSample => "location reading was invalid, please scan again",
            ReasonCode::OutsideGeofence => "you are too far from the event location",
            ReasonCode::ImplausibleSpeed => "scan flagged for manual review",
            ReasonCode::OutOfOrder => "scan arrived after a later scan and was sent for review",
        }
    }
}

impl TryFrom<&str> for ReasonCode {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim() {
            "InvalidSample" => Ok(ReasonCode::InvalidSample),
            "OutsideGeofence" => Ok(ReasonCode::OutsideGeofence),
            "ImplausibleSpeed" => Ok(ReasonCode::ImplausibleSpeed),
            "OutOfOrder" => Ok(ReasonCode::OutOfOrder),
            other => Err(format!("unknown reason code '{}'", other)),
        }
    }
}
