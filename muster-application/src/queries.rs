pub mod attendance_queries;
pub mod policy_queries;
pub mod scan_queries;
