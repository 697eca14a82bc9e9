use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use muster_domain::{EventId, HistoryKey, ScanHistoryRepository, ScanRecord};

/// Process-local scan history. Used when `storage = "memory"`.
#[derive(Default)]
pub struct InMemoryScanRepository {
    inner: RwLock<Store>,
}

#[derive(Default)]
struct Store {
    next_seq: u64,
    histories: HashMap<HistoryKey, Vec<(u64, ScanRecord)>>,
}

impl InMemoryScanRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn tail(records: &[(u64, ScanRecord)], limit: usize) -> Vec<ScanRecord> {
    let start = records.len().saturating_sub(limit);
    records[start..].iter().map(|(_, record)| record.clone()).collect()
}

#[async_trait]
impl ScanHistoryRepository for InMemoryScanRepository {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn append(&self, record: &ScanRecord) -> Result<()> {
        let mut store = self.inner.write().await;
        let seq = store.next_seq;
        store.next_seq += 1;
        let history = store.histories.entry(record.scan.history_key()).or_default();
        // ordered by recorded_at; a late arrival lands before later scans, ties keep arrival order
        let position = history.partition_point(|(_, existing)| {
            existing.scan.recorded_at <= record.scan.recorded_at
        });
        history.insert(position, (seq, record.clone()));
        Ok(())
    }

    async fn latest(&self, key: &HistoryKey) -> Result<Option<ScanRecord>> {
        let store = self.inner.read().await;
        Ok(store
            .histories
            .get(key)
            .and_then(|records| records.last())
            .map(|(_, record)| record.clone()))
    }

    async fn history(&self, key: &HistoryKey, limit: usize) -> Result<Vec<ScanRecord>> {
        let store = self.inner.read().await;
        Ok(store
            .histories
            .get(key)
            .map(|records| tail(records, limit))
            .unwrap_or_default())
    }

    async fn event_history(&self, event_id: &EventId, limit: usize) -> Result<Vec<ScanRecord>> {
        let store = self.inner.read().await;
        let mut merged = store
            .histories
            .iter()
            .filter(|(key, _)| &key.event_id == event_id)
            .flat_map(|(_, records)| records.iter().cloned())
            .collect::<Vec<_>>();
        // recorded_at first, insertion order breaks ties
        merged.sort_by(|(seq_a, a), (seq_b, b)| {
            a.scan
                .recorded_at
                .cmp(&b.scan.recorded_at)
                .then(seq_a.cmp(seq_b))
        });
        Ok(tail(&merged, limit))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use muster_domain::{
        Coordinates, LocationSample, ScanAction, ScanEvent, ScanMethod, VerificationResult, VolunteerId,
    };
    use std::collections::BTreeSet;

    fn record(volunteer: &str, event: &str, minute: i64) -> ScanRecord {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("time") + Duration::minutes(minute);
        ScanRecord {
            scan: ScanEvent::new(
                VolunteerId(volunteer.to_string()),
                EventId(event.to_string()),
                ScanAction::CheckIn,
                ScanMethod::Qr,
                LocationSample::new(Coordinates::new(25.2, 55.27), 5.0, at),
                at,
            ),
            result: VerificationResult {
                accepted: true,
                reason_codes: BTreeSet::new(),
                distance_meters: 0.0,
                implied_speed_kmh: None,
            },
        }
    }

    #[tokio::test]
    async fn history_returns_most_recent_oldest_first() {
        let repo = InMemoryScanRepository::new();
        for minute in 0..5 {
            repo.append(&record("a", "e1", minute)).await.expect("append");
        }
        let key = HistoryKey::new(VolunteerId("a".to_string()), EventId("e1".to_string()));
        let records = repo.history(&key, 2).await.expect("history");
        let minutes = records
            .iter()
            .map(|r| r.scan.recorded_at.format("%M").to_string())
            .collect::<Vec<_>>();
        assert_eq!(minutes, vec!["03", "04"]);
        let latest = repo.latest(&key).await.expect("latest").expect("some");
        assert_eq!(latest.scan.recorded_at, records[1].scan.recorded_at);
    }

    #[tokio::test]
    async fn event_history_merges_volunteers_in_time_order() {
        let repo = InMemoryScanRepository::new();
        repo.append(&record("a", "e1", 10)).await.expect("append");
        repo.append(&record("b", "e1", 5)).await.expect("append");
        repo.append(&record("c", "e2", 7)).await.expect("append");
        repo.append(&record("b", "e1", 20)).await.expect("append");

        let records = repo
            .event_history(&EventId("e1".to_string()), 10)
            .await
            .expect("history");
        let volunteers = records
            .iter()
            .map(|r| r.scan.volunteer_id.as_str().to_string())
            .collect::<Vec<_>>();
        assert_eq!(volunteers, vec!["b", "a", "b"]);
    }

    #[tokio::test]
    async fn late_record_is_inserted_in_time_order() {
        let repo = InMemoryScanRepository::new();
        repo.append(&record("a", "e1", 30)).await.expect("append");
        repo.append(&record("a", "e1", 10)).await.expect("append");
        let key = HistoryKey::new(VolunteerId("a".to_string()), EventId("e1".to_string()));
        let latest = repo.latest(&key).await.expect("latest").expect("some");
        assert_eq!(latest.scan.recorded_at.format("%M").to_string(), "30");
        let minutes = repo
            .history(&key, 10)
            .await
            .expect("history")
            .iter()
            .map(|r| r.scan.recorded_at.format("%M").to_string())
            .collect::<Vec<_>>();
        assert_eq!(minutes, vec!["10", "30"]);
    }

    #[tokio::test]
    async fn equal_timestamps_keep_arrival_order() {
        let repo = InMemoryScanRepository::new();
        let first = record("a", "e1", 5);
        let second = record("a", "e1", 5);
        repo.append(&first).await.expect("append");
        repo.append(&second).await.expect("append");
        let latest = repo
            .latest(&first.scan.history_key())
            .await
            .expect("latest")
            .expect("some");
        assert_eq!(latest.scan.scan_id, second.scan.scan_id);
    }

    #[tokio::test]
    async fn unknown_key_is_empty() {
        let repo = InMemoryScanRepository::new();
        let key = HistoryKey::new(VolunteerId("x".to_string()), EventId("y".to_string()));
        assert!(repo.latest(&key).await.expect("latest").is_none());
        assert!(repo.history(&key, 10).await.expect("history").is_empty());
    }
}
