use std::collections::BTreeSet;

use crate::entities::{CheckToggles, GeofenceConfig, ScanEvent, VerificationResult};
use crate::error::DomainError;
use crate::services::{GeofenceEvaluator, TravelPlausibilityChecker};
use crate::value_objects::ReasonCode;

/// Accepts or rejects one scan against an event geofence and the volunteer's
/// previous scan. Rejection is an ordinary outcome; only malformed
/// configuration or history produces an `Err`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttendanceVerifier {
    geofence: GeofenceEvaluator,
    travel: TravelPlausibilityChecker,
}

impl AttendanceVerifier {
    pub fn new(travel: TravelPlausibilityChecker) -> Self {
        Self {
            geofence: GeofenceEvaluator,
            travel,
        }
    }

    pub fn with_threshold(threshold_kmh: f64) -> Result<Self, DomainError> {
        Ok(Self::new(TravelPlausibilityChecker::new(threshold_kmh)?))
    }

    /// `history` is the ordered scan history of the candidate's
    /// (volunteer, event) pair, oldest first. A candidate recorded before the
    /// last entry is flagged `OutOfOrder` whatever the toggles.
    pub fn verify(
        &self,
        config: &GeofenceConfig,
        history: &[ScanEvent],
        candidate: &ScanEvent,
        toggles: CheckToggles,
    ) -> Result<VerificationResult, DomainError> {
        config.validate()?;
        ensure_ordered(history)?;

        if !candidate.sample.is_valid() {
            return Ok(VerificationResult::invalid_sample());
        }

        let mut reason_codes = BTreeSet::new();

        let fence = self.geofence.evaluate(config, &candidate.sample)?;
        if toggles.geofence && !fence.within_radius {
            reason_codes.insert(ReasonCode::OutsideGeofence);
        }

        let mut implied_speed_kmh = None;
        match history.last() {
            Some(latest) if candidate.recorded_at < latest.recorded_at => {
                reason_codes.insert(ReasonCode::OutOfOrder);
            }
            Some(previous) if toggles.speed => {
                let travel = self.travel.check(Some(previous), candidate)?;
                implied_speed_kmh = travel.implied_speed_kmh;
                if !travel.plausible {
                    reason_codes.insert(ReasonCode::ImplausibleSpeed);
                }
            }
            _ => {}
        }

        Ok(VerificationResult {
            accepted: reason_codes.is_empty(),
            reason_codes,
            distance_meters: fence.distance_meters,
            implied_speed_kmh,
        })
    }
}

fn ensure_ordered(history: &[ScanEvent]) -> Result<(), DomainError> {
    for (index, pair) in history.windows(2).enumerate() {
        if pair[1].recorded_at < pair[0].recorded_at {
            return Err(DomainError::HistoryOutOfOrder { index: index + 1 });
        }
    }
    Ok(())
}
