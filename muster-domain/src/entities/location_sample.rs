// Location sample entity
// A single device position reading captured at scan time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::Coordinates;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub coordinates: Coordinates,
    pub accuracy_meters: f64,
    pub captured_at: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(coordinates: Coordinates, accuracy_meters: f64, captured_at: DateTime<Utc>) -> Self {
        Self {
            coordinates,
            accuracy_meters,
            captured_at,
        }
    }

    /// Describes the first problem that makes this sample unusable.
    pub fn defect(&self) -> Option<String> {
        if !self.coordinates.is_valid() {
            return Some(format!(
                "coordinates out of range ({}, {})",
                self.coordinates.latitude, self.coordinates.longitude
            ));
        }
        if !self.accuracy_meters.is_finite() || self.accuracy_meters < 0.0 {
            return Some(format!("invalid accuracy {}", self.accuracy_meters));
        }
        None
    }

    pub fn is_valid(&self) -> bool {
        self.defect().is_none()
    }
}
