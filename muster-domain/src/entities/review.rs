// Review delivery entity
// Record of one attempt to route flagged scans to reviewers

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDeliveryRecord {
    pub delivered_at: i64,
    pub mode: String,
    pub scan_count: usize,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
