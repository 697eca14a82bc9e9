// Geofence entity

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Coordinates;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceConfig {
    pub center: Coordinates,
    pub radius_meters: f64,
}

impl GeofenceConfig {
    pub fn new(center: Coordinates, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.center.validate()?;
        if !self.radius_meters.is_finite() || self.radius_meters <= 0.0 {
            return Err(DomainError::InvalidRadius(self.radius_meters));
        }
        Ok(())
    }
}
