pub mod clickhouse_scans;
pub mod memory_scans;
pub mod policy_files;

pub use clickhouse_scans::*;
pub use memory_scans::*;
pub use policy_files::*;
