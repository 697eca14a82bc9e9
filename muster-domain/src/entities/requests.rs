// Request / response payloads shared by the application and HTTP layers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{ScanEvent, VerificationResult};
use crate::value_objects::{ScanAction, ScanMethod};

/// Position as reported by the scanning device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy_meters: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSubmission {
    pub volunteer_id: String,
    pub action: ScanAction,
    pub method: ScanMethod,
    pub location: ReportedLocation,
    /// Set by offline clients replaying queued scans; live scans use server time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkin_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReceipt {
    pub scan: ScanEvent,
    pub result: VerificationResult,
    pub stored: bool,
    pub messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScanQuery {
    pub volunteer: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AttendanceQuery {
    pub volunteer: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncScanItem {
    pub event_id: String,
    #[serde(default)]
    pub client_ref: Option<String>,
    #[serde(flatten)]
    pub submission: ScanSubmission,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncEnvelope {
    #[serde(default)]
    pub schema_version: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub scans: Vec<SyncScanItem>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncItemOutcome {
    pub client_ref: Option<String>,
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<ScanReceipt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct SyncReport {
    pub processed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
    pub items: Vec<SyncItemOutcome>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CheckinTokenRequest {
    #[serde(default)]
    pub day: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinTokenResponse {
    pub token: String,
    pub event_id: String,
    pub day: String,
    pub expires_at: String,
}
