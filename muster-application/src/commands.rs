pub mod checkin_token_commands;
pub mod policy_commands;
pub mod scan_commands;
pub mod sync_commands;
