use async_trait::async_trait;
use std::collections::HashMap;

use crate::entities::{EventPolicy, ScanRecord};
use crate::value_objects::{EventId, HistoryKey};

/// Append-only scan history keyed by (volunteer, event).
/// Implementations return records oldest first.
#[async_trait]
pub trait ScanHistoryRepository: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    async fn append(&self, record: &ScanRecord) -> anyhow::Result<()>;
    async fn latest(&self, key: &HistoryKey) -> anyhow::Result<Option<ScanRecord>>;
    /// The most recent `limit` records of one history.
    async fn history(&self, key: &HistoryKey, limit: usize) -> anyhow::Result<Vec<ScanRecord>>;
    /// The most recent `limit` records of an event across volunteers.
    async fn event_history(&self, event_id: &EventId, limit: usize) -> anyhow::Result<Vec<ScanRecord>>;
    async fn ping(&self) -> anyhow::Result<()>;
}

#[async_trait]
pub trait PolicyRepository: Send + Sync {
    async fn load_policies(&self, path: &str) -> anyhow::Result<HashMap<EventId, EventPolicy>>;
    async fn save_policies(&self, path: &str, policies: &[EventPolicy]) -> anyhow::Result<()>;
}
