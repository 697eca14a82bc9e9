// Domain value objects
pub mod coordinates;
pub mod identifiers;
pub mod reason_code;
pub mod scan_action;
pub mod scan_method;

pub use coordinates::*;
pub use identifiers::*;
pub use reason_code::*;
pub use scan_action::*;
pub use scan_method::*;
