// Domain entities
pub mod attendance;
pub mod event_policy;
pub mod geofence;
pub mod location_sample;
pub mod requests;
pub mod review;
pub mod runtime_config;
pub mod scan_event;
pub mod verification;

pub use attendance::*;
pub use event_policy::*;
pub use geofence::*;
pub use location_sample::*;
pub use requests::*;
pub use review::*;
pub use runtime_config::*;
pub use scan_event::*;
pub use verification::*;
