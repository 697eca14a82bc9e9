// Scan method value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMethod {
    Qr,
    Manual,
    Bluetooth,
    Nfc,
}

impl ScanMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMethod::Qr => "qr",
            ScanMethod::Manual => "manual",
            ScanMethod::Bluetooth => "bluetooth",
            ScanMethod::Nfc => "nfc",
        }
    }
}

impl TryFrom<&str> for ScanMethod {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s.trim().to_lowercase().as_str() {
            "qr" => Ok(ScanMethod::Qr),
            "manual" => Ok(ScanMethod::Manual),
            "bluetooth" | "ble" => Ok(ScanMethod::Bluetooth),
            "nfc" => Ok(ScanMethod::Nfc),
            other => Err(format!("unknown scan method '{}'", other)),
        }
    }
}
