use tracing::{info, warn};

use crate::commands::scan_commands;
use crate::{AppError, AppState, ReportedLocationSampler};
use muster_domain::{SyncEnvelope, SyncItemOutcome, SyncReport};

pub const SYNC_SCHEMA_VERSION: &str = "v1";
pub const MAX_SYNC_BATCH: usize = 500;

/// Replays scans queued on a device while it was offline. Items are applied
/// in `recorded_at` order; a failing item never aborts the batch.
pub async fn sync_offline_scans(
    state: &AppState,
    envelope: SyncEnvelope,
) -> Result<SyncReport, AppError> {
    if envelope.schema_version.trim() != SYNC_SCHEMA_VERSION {
        return Err(AppError::BadRequest(format!(
            "unsupported schema_version '{}', expected '{}'",
            envelope.schema_version, SYNC_SCHEMA_VERSION
        )));
    }
    if envelope.scans.len() > MAX_SYNC_BATCH {
        return Err(AppError::BadRequest(format!(
            "batch of {} scans exceeds limit of {}",
            envelope.scans.len(),
            MAX_SYNC_BATCH
        )));
    }

    let mut scans = envelope.scans;
    // stable: items sharing a timestamp keep their queue order
    scans.sort_by_key(|item| item.submission.recorded_at);

    let mut report = SyncReport::default();
    for item in scans {
        report.processed += 1;
        let Some(recorded_at) = item.submission.recorded_at else {
            report.failed += 1;
            report.items.push(SyncItemOutcome {
                client_ref: item.client_ref,
                event_id: item.event_id,
                receipt: None,
                error: Some("offline scans must carry recorded_at".to_string()),
            });
            continue;
        };

        let sampler = ReportedLocationSampler::new(item.submission.location.clone(), recorded_at);
        match scan_commands::record_scan(state, &item.event_id, item.submission, &sampler).await {
            Ok(receipt) => {
                if receipt.result.accepted {
                    report.accepted += 1;
                } else {
                    report.rejected += 1;
                }
                report.items.push(SyncItemOutcome {
                    client_ref: item.client_ref,
                    event_id: item.event_id,
                    receipt: Some(receipt),
                    error: None,
                });
            }
            Err(err) => {
                warn!(
                    "offline scan failed: event={}, client_ref={:?}, err={}",
                    item.event_id, item.client_ref, err
                );
                report.failed += 1;
                report.items.push(SyncItemOutcome {
                    client_ref: item.client_ref,
                    event_id: item.event_id,
                    receipt: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    state.metrics.record_sync_batch();
    info!(
        "offline sync applied: device={}, processed={}, accepted={}, rejected={}, failed={}",
        envelope.device_id.as_deref().unwrap_or("unknown"),
        report.processed,
        report.accepted,
        report.rejected,
        report.failed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{policy, state_with_policies, submission, ConstantSampler};
    use chrono::{Duration, Utc};
    use muster_domain::{ReasonCode, ReportedLocation, ScanAction, SyncScanItem};

    fn item(
        client_ref: &str,
        event_id: &str,
        action: ScanAction,
        minutes_ago: Option<i64>,
        latitude: f64,
    ) -> SyncScanItem {
        let recorded_at = minutes_ago.map(|minutes| Utc::now() - Duration::minutes(minutes));
        let mut submission = submission("vol-9", action, recorded_at);
        submission.location = ReportedLocation {
            latitude,
            longitude: 55.2708,
            accuracy_meters: 10.0,
            captured_at: recorded_at,
        };
        SyncScanItem {
            event_id: event_id.to_string(),
            client_ref: Some(client_ref.to_string()),
            submission,
        }
    }

    fn envelope(scans: Vec<SyncScanItem>) -> SyncEnvelope {
        SyncEnvelope {
            schema_version: "v1".to_string(),
            device_id: Some("tablet-3".to_string()),
            scans,
        }
    }

    #[tokio::test]
    async fn batch_is_applied_in_chronological_order() {
        let (state, repo, _notifier) = state_with_policies(vec![policy("shelter", 200.0)]);
        // queued out of order: the check-out was synced first
        let report = sync_offline_scans(
            &state,
            envelope(vec![
                item("out", "shelter", ScanAction::CheckOut, Some(10), 25.2048),
                item("in", "shelter", ScanAction::CheckIn, Some(190), 25.2048),
            ]),
        )
        .await
        .expect("sync");
        assert_eq!(report.processed, 2);
        assert_eq!(report.accepted, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.items[0].client_ref.as_deref(), Some("in"));
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn failures_do_not_abort_the_batch() {
        let (state, repo, _notifier) = state_with_policies(vec![policy("shelter", 200.0)]);
        let report = sync_offline_scans(
            &state,
            envelope(vec![
                item("no-time", "shelter", ScanAction::CheckIn, None, 25.2048),
                item("unknown", "elsewhere", ScanAction::CheckIn, Some(30), 25.2048),
                item("far", "shelter", ScanAction::CheckIn, Some(20), 25.2148),
            ]),
        )
        .await
        .expect("sync");
        assert_eq!(report.processed, 3);
        assert_eq!(report.failed, 2);
        assert_eq!(report.rejected, 1);
        assert_eq!(repo.len().await, 1);
        let far = report
            .items
            .iter()
            .find(|outcome| outcome.client_ref.as_deref() == Some("far"))
            .expect("far item");
        assert!(far.receipt.as_ref().is_some_and(|receipt| !receipt.result.accepted));
    }

    #[tokio::test]
    async fn offline_check_in_after_live_check_out_is_kept_for_review() {
        let (state, repo, notifier) = state_with_policies(vec![policy("shelter", 200.0)]);
        scan_commands::record_scan(
            &state,
            "shelter",
            submission("vol-9", ScanAction::CheckOut, Some(Utc::now() - Duration::minutes(1))),
            &ConstantSampler::at(25.2048, 55.2708),
        )
        .await
        .expect("live check-out");

        let report = sync_offline_scans(
            &state,
            envelope(vec![item("late-in", "shelter", ScanAction::CheckIn, Some(180), 25.2048)]),
        )
        .await
        .expect("sync");
        assert_eq!(report.failed, 0);
        assert_eq!(report.rejected, 1);
        let receipt = report.items[0].receipt.as_ref().expect("receipt");
        assert!(receipt.stored);
        assert!(receipt.result.has(ReasonCode::OutOfOrder));
        assert_eq!(repo.len().await, 2);
        assert_eq!(notifier.sent().await, 1);
    }

    #[tokio::test]
    async fn wrong_schema_version_is_refused() {
        let (state, _repo, _notifier) = state_with_policies(Vec::new());
        let mut bad = envelope(Vec::new());
        bad.schema_version = "v0".to_string();
        assert!(matches!(
            sync_offline_scans(&state, bad).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
