use std::collections::HashMap;
use std::sync::Arc;

use muster_domain::ports::{PolicyRepository, ReviewNotifier, ScanHistoryRepository};
use muster_domain::{EventId, EventPolicy, RuntimeConfig};
use tokio::sync::RwLock;

use crate::ops::HistoryLocks;
use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub scan_repo: Arc<dyn ScanHistoryRepository>,
    pub policy_repo: Arc<dyn PolicyRepository>,
    pub review_notifier: Arc<dyn ReviewNotifier>,
    pub policies: Arc<RwLock<HashMap<EventId, EventPolicy>>>,
    pub history_locks: Arc<HistoryLocks>,
    pub metrics: Arc<Metrics>,
}
