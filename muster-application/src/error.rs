use muster_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

// Domain errors reaching this layer come from stored policy or stored history,
// never from the submitted scan, so they are server-side faults.
impl From<DomainError> for AppError {
    fn from(value: DomainError) -> Self {
        AppError::Internal(anyhow::Error::new(value))
    }
}
