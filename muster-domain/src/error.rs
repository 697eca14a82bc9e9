use thiserror::Error;

/// Malformed input to the verification core. A rejected scan is not an error.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    #[error("coordinates out of range: latitude={latitude}, longitude={longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("geofence radius must be positive, got {0}")]
    InvalidRadius(f64),

    #[error("speed threshold must be positive, got {0}")]
    InvalidThreshold(f64),

    #[error("scan history is not ordered by recorded_at at index {index}")]
    HistoryOutOfOrder { index: usize },
}

impl DomainError {
    /// Errors caused by event configuration rather than by the submitted scan.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidCoordinates { .. }
                | DomainError::InvalidRadius(_)
                | DomainError::InvalidThreshold(_)
        )
    }
}
