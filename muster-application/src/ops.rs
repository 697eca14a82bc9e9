pub mod history_locks;

pub use history_locks::*;
