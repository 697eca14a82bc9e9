// In-memory port fakes shared by the command and query tests

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use muster_domain::ports::{LocationSampler, PolicyRepository, ReviewNotifier, ScanHistoryRepository};
use muster_domain::{
    Coordinates, EventId, EventPolicy, GeofenceConfig, HistoryKey, LocationSample,
    ReportedLocation, ReviewDeliveryRecord, RuntimeConfig, ScanAction, ScanMethod, ScanRecord,
    ScanSubmission,
};

use crate::ops::HistoryLocks;
use crate::{AppState, Metrics};

#[derive(Default)]
pub struct MemoryScans {
    records: Mutex<Vec<ScanRecord>>,
}

impl MemoryScans {
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl ScanHistoryRepository for MemoryScans {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn append(&self, record: &ScanRecord) -> anyhow::Result<()> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }

    async fn latest(&self, key: &HistoryKey) -> anyhow::Result<Option<ScanRecord>> {
        let records = self.records.lock().await;
        // max_by_key keeps the last of equal timestamps
        Ok(records
            .iter()
            .filter(|record| &record.scan.history_key() == key)
            .max_by_key(|record| record.scan.recorded_at)
            .cloned())
    }

    async fn history(&self, key: &HistoryKey, limit: usize) -> anyhow::Result<Vec<ScanRecord>> {
        let records = self.records.lock().await;
        let mut matching = records
            .iter()
            .filter(|record| &record.scan.history_key() == key)
            .cloned()
            .collect::<Vec<_>>();
        matching.sort_by_key(|record| record.scan.recorded_at);
        let skip = matching.len().saturating_sub(limit);
        Ok(matching.into_iter().skip(skip).collect())
    }

    async fn event_history(&self, event_id: &EventId, limit: usize) -> anyhow::Result<Vec<ScanRecord>> {
        let records = self.records.lock().await;
        let mut matching = records
            .iter()
            .filter(|record| &record.scan.event_id == event_id)
            .cloned()
            .collect::<Vec<_>>();
        matching.sort_by_key(|record| record.scan.recorded_at);
        let skip = matching.len().saturating_sub(limit);
        Ok(matching.into_iter().skip(skip).collect())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPolicies {
    saved: Mutex<Vec<EventPolicy>>,
}

impl MemoryPolicies {
    pub async fn saved(&self) -> Vec<EventPolicy> {
        self.saved.lock().await.clone()
    }
}

#[async_trait]
impl PolicyRepository for MemoryPolicies {
    async fn load_policies(&self, _path: &str) -> anyhow::Result<HashMap<EventId, EventPolicy>> {
        Ok(self
            .saved
            .lock()
            .await
            .iter()
            .map(|policy| (policy.event_id.clone(), policy.clone()))
            .collect())
    }

    async fn save_policies(&self, _path: &str, policies: &[EventPolicy]) -> anyhow::Result<()> {
        *self.saved.lock().await = policies.to_vec();
        Ok(())
    }
}

#[derive(Default)]
pub struct CountingNotifier {
    records: Mutex<Vec<ScanRecord>>,
}

impl CountingNotifier {
    pub async fn sent(&self) -> usize {
        self.records.lock().await.len()
    }
}

#[async_trait]
impl ReviewNotifier for CountingNotifier {
    fn spawn_review(&self, _config: RuntimeConfig, records: Vec<ScanRecord>) {
        self.records
            .try_lock()
            .expect("notifier lock is uncontended in tests")
            .extend(records);
    }

    async fn check_review_target(&self, _config: &RuntimeConfig) -> anyhow::Result<()> {
        Ok(())
    }

    async fn list_review_deliveries(&self, _limit: usize) -> Vec<ReviewDeliveryRecord> {
        Vec::new()
    }

    async fn last_review_delivery(&self) -> Option<ReviewDeliveryRecord> {
        None
    }
}

pub struct ConstantSampler {
    latitude: f64,
    longitude: f64,
    accuracy_meters: f64,
}

impl ConstantSampler {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::with_accuracy(latitude, longitude, 5.0)
    }

    pub fn with_accuracy(latitude: f64, longitude: f64, accuracy_meters: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
        }
    }
}

#[async_trait]
impl LocationSampler for ConstantSampler {
    async fn current_location(&self) -> anyhow::Result<LocationSample> {
        Ok(LocationSample::new(
            Coordinates::new(self.latitude, self.longitude),
            self.accuracy_meters,
            Utc::now(),
        ))
    }
}

/// Policy centred on downtown Dubai.
pub fn policy(event_id: &str, radius_meters: f64) -> EventPolicy {
    EventPolicy {
        event_id: EventId(event_id.to_string()),
        geofence: GeofenceConfig::new(Coordinates::new(25.2048, 55.2708), radius_meters),
        enable_geofence: true,
        enable_speed_check: true,
        speed_threshold_kmh: None,
        require_checkin_token: false,
    }
}

pub fn submission(
    volunteer_id: &str,
    action: ScanAction,
    recorded_at: Option<DateTime<Utc>>,
) -> ScanSubmission {
    ScanSubmission {
        volunteer_id: volunteer_id.to_string(),
        action,
        method: ScanMethod::Qr,
        location: ReportedLocation {
            latitude: 25.2048,
            longitude: 55.2708,
            accuracy_meters: 5.0,
            captured_at: recorded_at,
        },
        recorded_at,
        checkin_token: None,
    }
}

pub fn state_with_policies(
    policies: Vec<EventPolicy>,
) -> (AppState, Arc<MemoryScans>, Arc<CountingNotifier>) {
    let scans = Arc::new(MemoryScans::default());
    let notifier = Arc::new(CountingNotifier::default());
    let state = AppState {
        config: RuntimeConfig::default(),
        scan_repo: scans.clone(),
        policy_repo: Arc::new(MemoryPolicies::default()),
        review_notifier: notifier.clone(),
        policies: Arc::new(RwLock::new(
            policies
                .into_iter()
                .map(|policy| (policy.event_id.clone(), policy))
                .collect(),
        )),
        history_locks: Arc::new(HistoryLocks::default()),
        metrics: Arc::new(Metrics::default()),
    };
    (state, scans, notifier)
}
