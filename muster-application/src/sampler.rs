use async_trait::async_trait;
use chrono::{DateTime, Utc};

use muster_domain::ports::LocationSampler;
use muster_domain::{Coordinates, LocationSample, ReportedLocation};

/// Sampler backed by the position the client device already measured and
/// submitted with the scan.
pub struct ReportedLocationSampler {
    location: ReportedLocation,
    fallback_captured_at: DateTime<Utc>,
}

impl ReportedLocationSampler {
    pub fn new(location: ReportedLocation, fallback_captured_at: DateTime<Utc>) -> Self {
        Self {
            location,
            fallback_captured_at,
        }
    }
}

#[async_trait]
impl LocationSampler for ReportedLocationSampler {
    async fn current_location(&self) -> anyhow::Result<LocationSample> {
        Ok(LocationSample::new(
            Coordinates::new(self.location.latitude, self.location.longitude),
            self.location.accuracy_meters,
            self.location.captured_at.unwrap_or(self.fallback_captured_at),
        ))
    }
}
