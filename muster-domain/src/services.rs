// Domain services
pub mod attendance;
pub mod geo;
pub mod geofence;
pub mod travel;
pub mod verifier;

pub use attendance::*;
pub use geo::*;
pub use geofence::*;
pub use travel::*;
pub use verifier::*;
