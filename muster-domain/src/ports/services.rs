use async_trait::async_trait;

use crate::entities::{LocationSample, ReviewDeliveryRecord, RuntimeConfig, ScanRecord};

/// Source of the device position for a scan.
#[async_trait]
pub trait LocationSampler: Send + Sync {
    async fn current_location(&self) -> anyhow::Result<LocationSample>;
}

/// Routes flagged scans to human reviewers.
#[async_trait]
pub trait ReviewNotifier: Send + Sync {
    fn spawn_review(&self, config: RuntimeConfig, records: Vec<ScanRecord>);
    async fn check_review_target(&self, config: &RuntimeConfig) -> anyhow::Result<()>;
    async fn list_review_deliveries(&self, limit: usize) -> Vec<ReviewDeliveryRecord>;
    async fn last_review_delivery(&self) -> Option<ReviewDeliveryRecord>;
}
