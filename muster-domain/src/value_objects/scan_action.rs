// Scan action value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanAction {
    CheckIn,
    CheckOut,
}

impl ScanAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanAction::CheckIn => "check_in",
            ScanAction::CheckOut => "check_out",
        }
    }
}

impl TryFrom<&str> for ScanAction {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "check_in" | "checkin" => Ok(ScanAction::CheckIn),
            "check_out" | "checkout" => Ok(ScanAction::CheckOut),
            other => Err(format!("unknown scan action '{}'", other)),
        }
    }
}
