pub mod attendance_handlers;
pub mod ops_handlers;
pub mod policy_handlers;
pub mod scan_handlers;

pub use attendance_handlers::*;
pub use ops_handlers::*;
pub use policy_handlers::*;
pub use scan_handlers::*;
