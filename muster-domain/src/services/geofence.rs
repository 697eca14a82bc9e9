use crate::entities::{GeofenceConfig, GeofenceOutcome, LocationSample};
use crate::error::DomainError;
use crate::services::geo::haversine_meters;

/// Classifies a sample as inside or outside an event's geofence.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeofenceEvaluator;

impl GeofenceEvaluator {
    pub fn evaluate(
        &self,
        config: &GeofenceConfig,
        sample: &LocationSample,
    ) -> Result<GeofenceOutcome, DomainError> {
        config.center.validate()?;
        sample.coordinates.validate()?;
        let distance_meters = haversine_meters(&config.center, &sample.coordinates);
        Ok(GeofenceOutcome {
            within_radius: distance_meters <= config.radius_meters,
            distance_meters,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::Coordinates;
    use chrono::Utc;

    fn sample_at(lat: f64, lon: f64) -> LocationSample {
        LocationSample::new(Coordinates::new(lat, lon), 5.0, Utc::now())
    }

    fn dubai_fence() -> GeofenceConfig {
        GeofenceConfig::new(Coordinates::new(25.2048, 55.2708), 150.0)
    }

    #[test]
    fn sample_at_center_is_inside_for_any_radius() {
        for radius in [0.001, 1.0, 150.0, 10_000.0] {
            let config = GeofenceConfig::new(Coordinates::new(25.2048, 55.2708), radius);
            let outcome = GeofenceEvaluator
                .evaluate(&config, &sample_at(25.2048, 55.2708))
                .expect("evaluate");
            assert_eq!(outcome.distance_meters, 0.0);
            assert!(outcome.within_radius);
        }
    }

    #[test]
    fn sample_a_kilometre_north_is_outside() {
        let outcome = GeofenceEvaluator
            .evaluate(&dubai_fence(), &sample_at(25.2148, 55.2708))
            .expect("evaluate");
        assert!(!outcome.within_radius);
        assert!(outcome.distance_meters > 1_100.0 && outcome.distance_meters < 1_125.0);
    }

    #[test]
    fn boundary_distance_counts_as_inside() {
        let center = Coordinates::new(10.0, 10.0);
        let edge = sample_at(10.001, 10.0);
        let exact = haversine_meters(&center, &edge.coordinates);
        let config = GeofenceConfig::new(center, exact);
        assert!(GeofenceEvaluator.evaluate(&config, &edge).expect("evaluate").within_radius);
    }

    #[test]
    fn out_of_range_input_is_an_error() {
        let err = GeofenceEvaluator
            .evaluate(&dubai_fence(), &sample_at(91.0, 55.0))
            .expect_err("latitude out of range");
        assert!(matches!(err, DomainError::InvalidCoordinates { .. }));

        let bad_center = GeofenceConfig::new(Coordinates::new(0.0, 200.0), 100.0);
        assert!(GeofenceEvaluator.evaluate(&bad_center, &sample_at(0.0, 0.0)).is_err());
    }
}
