use std::collections::BTreeSet;

use anyhow::Result;
use async_trait::async_trait;
use clickhouse::{Client, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use muster_domain::{
    Coordinates, DbConfig, EventId, HistoryKey, LocationSample, ReasonCode, ScanAction, ScanEvent,
    ScanHistoryRepository, ScanMethod, ScanRecord, VerificationResult, VolunteerId,
};

use crate::utils::{from_offset, to_offset};

const SCAN_TABLE: &str = "scan_records";

#[derive(Debug, Error)]
pub enum ScanRowError {
    #[error("invalid scan id '{0}'")]
    ScanId(String),
    #[error("{0}")]
    Column(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
pub struct ScanRow {
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub recorded_at: OffsetDateTime,
    pub scan_id: String,
    pub event_id: String,
    pub volunteer_id: String,
    pub action: String,
    pub method: String,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: f64,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub captured_at: OffsetDateTime,
    pub accepted: u8,
    pub reason_codes: Vec<String>,
    pub distance_meters: f64,
    pub implied_speed_kmh: Option<f64>,
    /// Breaks ties between rows sharing a `recorded_at` millisecond.
    #[serde(with = "clickhouse::serde::time::datetime64::nanos")]
    pub inserted_at: OffsetDateTime,
}

impl ScanRow {
    pub fn new(record: &ScanRecord, inserted_at: OffsetDateTime) -> Self {
        let scan = &record.scan;
        Self {
            recorded_at: to_offset(&scan.recorded_at),
            scan_id: scan.scan_id.to_string(),
            event_id: scan.event_id.to_string(),
            volunteer_id: scan.volunteer_id.to_string(),
            action: scan.action.as_str().to_string(),
            method: scan.method.as_str().to_string(),
            latitude: scan.sample.coordinates.latitude,
            longitude: scan.sample.coordinates.longitude,
            accuracy_meters: scan.sample.accuracy_meters,
            captured_at: to_offset(&scan.sample.captured_at),
            accepted: u8::from(record.result.accepted),
            reason_codes: record
                .result
                .reason_codes
                .iter()
                .map(|code| code.as_str().to_string())
                .collect(),
            distance_meters: record.result.distance_meters,
            implied_speed_kmh: record.result.implied_speed_kmh,
            inserted_at,
        }
    }
}

impl TryFrom<ScanRow> for ScanRecord {
    type Error = ScanRowError;

    fn try_from(row: ScanRow) -> Result<Self, Self::Error> {
        let scan_id = Uuid::parse_str(&row.scan_id).map_err(|_| ScanRowError::ScanId(row.scan_id.clone()))?;
        let action = ScanAction::try_from(row.action.as_str()).map_err(ScanRowError::Column)?;
        let method = ScanMethod::try_from(row.method.as_str()).map_err(ScanRowError::Column)?;
        let reason_codes = row
            .reason_codes
            .iter()
            .map(|code| ReasonCode::try_from(code.as_str()))
            .collect::<Result<BTreeSet<_>, _>>()
            .map_err(ScanRowError::Column)?;

        Ok(ScanRecord {
            scan: ScanEvent {
                scan_id,
                volunteer_id: VolunteerId(row.volunteer_id),
                event_id: EventId(row.event_id),
                action,
                method,
                sample: LocationSample::new(
                    Coordinates::new(row.latitude, row.longitude),
                    row.accuracy_meters,
                    from_offset(row.captured_at),
                ),
                recorded_at: from_offset(row.recorded_at),
            },
            result: VerificationResult {
                accepted: row.accepted != 0,
                reason_codes,
                distance_meters: row.distance_meters,
                implied_speed_kmh: row.implied_speed_kmh,
            },
        })
    }
}

// newest first; inserted_at orders rows recorded in the same millisecond
fn recent_scans_sql(filter: &str, limit: usize) -> String {
    format!(
        "SELECT ?fields FROM {} WHERE {} ORDER BY recorded_at DESC, inserted_at DESC LIMIT {}",
        SCAN_TABLE, filter, limit
    )
}

#[derive(Clone)]
pub struct ClickhouseScanRepository {
    client: Client,
    database: String,
}

impl ClickhouseScanRepository {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn from_config(config: &DbConfig) -> Self {
        let mut client = Client::default()
            .with_url(&config.clickhouse_url)
            .with_database(&config.clickhouse_database);
        if let Some(user) = &config.clickhouse_user {
            client = client.with_user(user);
        }
        if let Some(password) = &config.clickhouse_password {
            client = client.with_password(password);
        }
        Self::new(client, config.clickhouse_database.clone())
    }

    async fn fetch_recent(&self, filter: &str, binds: &[&str], limit: usize) -> Result<Vec<ScanRecord>> {
        let sql = recent_scans_sql(filter, limit);
        let mut query = self.client.query(&sql);
        for value in binds {
            query = query.bind(*value);
        }
        let rows = query.fetch_all::<ScanRow>().await?;
        let mut records = rows
            .into_iter()
            .map(ScanRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        records.reverse();
        Ok(records)
    }
}

#[async_trait]
impl ScanHistoryRepository for ClickhouseScanRepository {
    async fn ensure_schema(&self) -> Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;

        let create_scans = r#"
CREATE TABLE IF NOT EXISTS scan_records (
    recorded_at DateTime64(3),
    scan_id String,
    event_id String,
    volunteer_id String,
    action LowCardinality(String),
    method LowCardinality(String),
    latitude Float64,
    longitude Float64,
    accuracy_meters Float64,
    captured_at DateTime64(3),
    accepted UInt8,
    reason_codes Array(String),
    distance_meters Float64,
    implied_speed_kmh Nullable(Float64),
    inserted_at DateTime64(9)
) ENGINE = MergeTree
PARTITION BY toYYYYMM(recorded_at)
ORDER BY (event_id, volunteer_id, recorded_at)
"#;

        self.client.query(create_scans).execute().await?;
        Ok(())
    }

    async fn append(&self, record: &ScanRecord) -> Result<()> {
        let mut insert = self.client.insert(SCAN_TABLE)?;
        insert
            .write(&ScanRow::new(record, OffsetDateTime::now_utc()))
            .await?;
        insert.end().await?;
        Ok(())
    }

    async fn latest(&self, key: &HistoryKey) -> Result<Option<ScanRecord>> {
        let mut records = self.history(key, 1).await?;
        Ok(records.pop())
    }

    async fn history(&self, key: &HistoryKey, limit: usize) -> Result<Vec<ScanRecord>> {
        self.fetch_recent(
            "event_id = ? AND volunteer_id = ?",
            &[key.event_id.as_str(), key.volunteer_id.as_str()],
            limit.max(1),
        )
        .await
    }

    async fn event_history(&self, event_id: &EventId, limit: usize) -> Result<Vec<ScanRecord>> {
        self.fetch_recent("event_id = ?", &[event_id.as_str()], limit.max(1))
            .await
    }

    async fn ping(&self) -> Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }
}
