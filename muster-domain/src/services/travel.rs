use crate::entities::{PlausibilityOutcome, ScanEvent};
use crate::error::DomainError;
use crate::services::geo::haversine_meters;

/// Urban ground-travel ceiling used when an event sets no threshold of its own.
pub const DEFAULT_SPEED_THRESHOLD_KMH: f64 = 50.0;

/// Flags consecutive scans whose implied travel speed is physically unlikely.
#[derive(Debug, Clone, Copy)]
pub struct TravelPlausibilityChecker {
    threshold_kmh: f64,
}

impl Default for TravelPlausibilityChecker {
    fn default() -> Self {
        Self {
            threshold_kmh: DEFAULT_SPEED_THRESHOLD_KMH,
        }
    }
}

impl TravelPlausibilityChecker {
    pub fn new(threshold_kmh: f64) -> Result<Self, DomainError> {
        if !threshold_kmh.is_finite() || threshold_kmh <= 0.0 {
            return Err(DomainError::InvalidThreshold(threshold_kmh));
        }
        Ok(Self { threshold_kmh })
    }

    pub fn threshold_kmh(&self) -> f64 {
        self.threshold_kmh
    }

    pub fn check(
        &self,
        previous: Option<&ScanEvent>,
        current: &ScanEvent,
    ) -> Result<PlausibilityOutcome, DomainError> {
        let Some(previous) = previous else {
            return Ok(PlausibilityOutcome {
                plausible: true,
                implied_speed_kmh: None,
            });
        };

        previous.sample.coordinates.validate()?;
        current.sample.coordinates.validate()?;
        let distance_meters =
            haversine_meters(&previous.sample.coordinates, &current.sample.coordinates);

        let elapsed_ms = (current.recorded_at - previous.recorded_at).num_milliseconds();
        if elapsed_ms <= 0 {
            // non-causal or duplicate timestamp: only a scan in the same spot is acceptable
            if distance_meters > 0.0 {
                return Ok(PlausibilityOutcome {
                    plausible: false,
                    implied_speed_kmh: None,
                });
            }
            return Ok(PlausibilityOutcome {
                plausible: true,
                implied_speed_kmh: Some(0.0),
            });
        }

        let elapsed_minutes = elapsed_ms as f64 / 60_000.0;
        let implied_speed_kmh = (distance_meters / 1000.0) / (elapsed_minutes / 60.0);
        Ok(PlausibilityOutcome {
            plausible: implied_speed_kmh <= self.threshold_kmh,
            implied_speed_kmh: Some(implied_speed_kmh),
        })
    }
}
