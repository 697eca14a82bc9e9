// Muster Application Layer

pub mod commands;
pub mod error;
pub mod metrics;
pub mod ops;
pub mod queries;
pub mod sampler;
pub mod state;

pub use error::AppError;
pub use metrics::Metrics;
pub use sampler::ReportedLocationSampler;
pub use state::AppState;

#[cfg(test)]
mod testing;
