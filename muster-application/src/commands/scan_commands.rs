use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use muster_domain::ports::LocationSampler;
use muster_domain::{
    normalize_identifier, is_valid_identifier, AttendanceVerifier, CheckToggles, EventId,
    ReasonCode, ScanEvent, ScanMethod, ScanReceipt, ScanRecord, ScanSubmission, VolunteerId,
};

use crate::commands::checkin_token_commands;
use crate::{AppError, AppState};

/// Offline clients may run slightly ahead of the server clock.
const MAX_CLOCK_SKEW_SECONDS: i64 = 120;

pub async fn record_scan(
    state: &AppState,
    event_id: &str,
    submission: ScanSubmission,
    sampler: &dyn LocationSampler,
) -> Result<ScanReceipt, AppError> {
    let event_id = EventId(normalize_required_id(event_id, "event_id")?);
    let volunteer_id = VolunteerId(normalize_required_id(&submission.volunteer_id, "volunteer_id")?);

    let policy = {
        let policies = state.policies.read().await;
        policies.get(&event_id).cloned()
    }
    .ok_or_else(|| AppError::NotFound(format!("no check-in policy for event '{}'", event_id)))?;

    let now = Utc::now();
    let recorded_at = submission.recorded_at.unwrap_or(now);
    if recorded_at > now + Duration::seconds(MAX_CLOCK_SKEW_SECONDS) {
        return Err(AppError::BadRequest(format!(
            "recorded_at {} is in the future",
            recorded_at.to_rfc3339()
        )));
    }

    if policy.require_checkin_token && submission.method == ScanMethod::Qr {
        let token = submission
            .checkin_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::BadRequest("checkin_token is required".to_string()))?;
        checkin_token_commands::verify_checkin_token(
            &state.config,
            &event_id,
            token,
            recorded_at.date_naive(),
        )?;
    }

    let sample = sampler
        .current_location()
        .await
        .map_err(|err| AppError::BadRequest(format!("location unavailable: {}", err)))?;
    let candidate = ScanEvent::new(
        volunteer_id,
        event_id,
        submission.action,
        submission.method,
        sample,
        recorded_at,
    );
    let key = candidate.history_key();

    let record = {
        let _guard = state.history_locks.acquire(&key).await;

        let previous = state.scan_repo.latest(&key).await.map_err(|err| {
            error!("failed to load scan history: {}", err);
            state.metrics.record_scan_error();
            AppError::Internal(err)
        })?;
        let history = previous.into_iter().map(|record| record.scan).collect::<Vec<_>>();

        let verifier = AttendanceVerifier::with_threshold(
            policy.effective_threshold(state.config.default_speed_threshold_kmh),
        )?;
        let toggles = CheckToggles {
            geofence: policy.enable_geofence,
            speed: policy.enable_speed_check,
        };
        let result = verifier.verify(&policy.geofence, &history, &candidate, toggles)?;

        if result.has(ReasonCode::InvalidSample) {
            state.metrics.record_result(&result);
            warn!(
                "discarded malformed sample: volunteer={}, event={}, defect={}",
                candidate.volunteer_id,
                candidate.event_id,
                candidate.sample.defect().unwrap_or_default()
            );
            let messages = user_messages(&result.reason_codes);
            return Ok(ScanReceipt {
                scan: candidate,
                result,
                stored: false,
                messages,
            });
        }

        let record = ScanRecord {
            scan: candidate,
            result,
        };
        state.scan_repo.append(&record).await.map_err(|err| {
            error!("failed to append scan: {}", err);
            state.metrics.record_scan_error();
            AppError::Internal(err)
        })?;
        record
    };

    state.metrics.record_result(&record.result);
    if record.result.needs_review() {
        info!(
            "scan flagged for review: volunteer={}, event={}, reasons={:?}, distance_m={:.1}",
            record.scan.volunteer_id,
            record.scan.event_id,
            record.result.reason_codes,
            record.result.distance_meters
        );
        state
            .review_notifier
            .spawn_review(state.config.clone(), vec![record.clone()]);
    }

    let messages = user_messages(&record.result.reason_codes);
    Ok(ScanReceipt {
        scan: record.scan,
        result: record.result,
        stored: true,
        messages,
    })
}

pub(crate) fn normalize_required_id(raw: &str, field: &str) -> Result<String, AppError> {
    let value = normalize_identifier(raw)
        .ok_or_else(|| AppError::BadRequest(format!("{} must not be empty", field)))?;
    if !is_valid_identifier(&value) {
        return Err(AppError::BadRequest(format!(
            "{} '{}' contains invalid characters",
            field, value
        )));
    }
    Ok(value)
}

fn user_messages<'a>(codes: impl IntoIterator<Item = &'a ReasonCode>) -> Vec<String> {
    codes
        .into_iter()
        .map(|code| code.user_message().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{policy, state_with_policies, submission, ConstantSampler};
    use muster_domain::{ScanAction, ScanHistoryRepository};

    #[tokio::test]
    async fn accepted_scan_is_stored() {
        let (state, repo, notifier) = state_with_policies(vec![policy("park-day", 150.0)]);
        let receipt = record_scan(
            &state,
            "Park-Day",
            submission("vol-1", ScanAction::CheckIn, None),
            &ConstantSampler::at(25.2048, 55.2708),
        )
        .await
        .expect("record");
        assert!(receipt.stored);
        assert!(receipt.result.accepted);
        assert!(receipt.messages.is_empty());
        assert_eq!(receipt.scan.event_id, EventId("park-day".to_string()));
        assert_eq!(repo.len().await, 1);
        assert_eq!(notifier.sent().await, 0);
        assert_eq!(state.metrics.accepted(), 1);
    }

    #[tokio::test]
    async fn rejected_scan_is_kept_for_review() {
        let (state, repo, notifier) = state_with_policies(vec![policy("park-day", 150.0)]);
        let receipt = record_scan(
            &state,
            "park-day",
            submission("vol-1", ScanAction::CheckIn, None),
            &ConstantSampler::at(25.2148, 55.2708),
        )
        .await
        .expect("record");
        assert!(receipt.stored);
        assert!(!receipt.result.accepted);
        assert!(receipt.result.has(ReasonCode::OutsideGeofence));
        assert_eq!(receipt.messages, vec!["you are too far from the event location".to_string()]);
        assert_eq!(repo.len().await, 1);
        assert_eq!(notifier.sent().await, 1);
        assert_eq!(state.metrics.rejected(), 1);
    }

    #[tokio::test]
    async fn invalid_sample_is_not_stored() {
        let (state, repo, notifier) = state_with_policies(vec![policy("park-day", 150.0)]);
        let receipt = record_scan(
            &state,
            "park-day",
            submission("vol-1", ScanAction::CheckIn, None),
            &ConstantSampler::with_accuracy(25.2048, 55.2708, -4.0),
        )
        .await
        .expect("record");
        assert!(!receipt.stored);
        assert!(receipt.result.has(ReasonCode::InvalidSample));
        assert_eq!(repo.len().await, 0);
        assert_eq!(notifier.sent().await, 0);
    }

    #[tokio::test]
    async fn speed_check_compares_with_previous_scan() {
        let (state, repo, _notifier) = state_with_policies(vec![policy("river", 50_000.0)]);
        let start = Utc::now() - Duration::minutes(10);
        record_scan(
            &state,
            "river",
            submission("vol-2", ScanAction::CheckIn, Some(start)),
            &ConstantSampler::at(25.2048, 55.2708),
        )
        .await
        .expect("first scan");
        let receipt = record_scan(
            &state,
            "river",
            submission("vol-2", ScanAction::CheckOut, Some(start + Duration::minutes(1))),
            &ConstantSampler::at(25.3048, 55.2708),
        )
        .await
        .expect("second scan");
        assert!(receipt.result.has(ReasonCode::ImplausibleSpeed));
        assert!(receipt.stored);
        let key = receipt.scan.history_key();
        assert_eq!(repo.history(&key, 10).await.expect("history").len(), 2);
    }

    #[tokio::test]
    async fn histories_are_per_volunteer() {
        let (state, _repo, _notifier) = state_with_policies(vec![policy("river", 50_000.0)]);
        let at = Utc::now() - Duration::minutes(5);
        record_scan(
            &state,
            "river",
            submission("vol-a", ScanAction::CheckIn, Some(at)),
            &ConstantSampler::at(25.2048, 55.2708),
        )
        .await
        .expect("vol-a");
        let receipt = record_scan(
            &state,
            "river",
            submission("vol-b", ScanAction::CheckIn, Some(at + Duration::seconds(10))),
            &ConstantSampler::at(25.3048, 55.2708),
        )
        .await
        .expect("vol-b");
        assert!(receipt.result.accepted);
        assert_eq!(receipt.result.implied_speed_kmh, None);
    }

    #[tokio::test]
    async fn late_submission_is_stored_and_sent_for_review() {
        let (state, repo, notifier) = state_with_policies(vec![policy("river", 500.0)]);
        let at = Utc::now() - Duration::minutes(5);
        record_scan(
            &state,
            "river",
            submission("vol-1", ScanAction::CheckOut, Some(at)),
            &ConstantSampler::at(25.2048, 55.2708),
        )
        .await
        .expect("live");
        let receipt = record_scan(
            &state,
            "river",
            submission("vol-1", ScanAction::CheckIn, Some(at - Duration::hours(2))),
            &ConstantSampler::at(25.2048, 55.2708),
        )
        .await
        .expect("late");
        assert!(receipt.stored);
        assert!(!receipt.result.accepted);
        assert!(receipt.result.has(ReasonCode::OutOfOrder));
        assert_eq!(repo.len().await, 2);
        assert_eq!(notifier.sent().await, 1);

        // the later live scan stays the latest entry
        let latest = repo
            .latest(&receipt.scan.history_key())
            .await
            .expect("latest")
            .expect("some");
        assert_eq!(latest.scan.recorded_at, at);
    }

    #[tokio::test]
    async fn unknown_event_and_bad_ids_are_rejected() {
        let (state, _repo, _notifier) = state_with_policies(vec![policy("river", 500.0)]);
        let sampler = ConstantSampler::at(25.2048, 55.2708);
        let err = record_scan(&state, "lake", submission("vol-1", ScanAction::CheckIn, None), &sampler)
            .await
            .expect_err("unknown event");
        assert!(matches!(err, AppError::NotFound(_)));

        let err = record_scan(&state, "river", submission("  ", ScanAction::CheckIn, None), &sampler)
            .await
            .expect_err("blank volunteer");
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = record_scan(
            &state,
            "river",
            submission("vol-1", ScanAction::CheckIn, Some(Utc::now() + Duration::hours(1))),
            &sampler,
        )
        .await
        .expect_err("future timestamp");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn qr_scans_need_a_token_when_required() {
        let mut guarded = policy("gala", 150.0);
        guarded.require_checkin_token = true;
        let (mut state, _repo, _notifier) = state_with_policies(vec![guarded]);
        state.config.checkin_token_secret = Some("s3cret".to_string());
        let sampler = ConstantSampler::at(25.2048, 55.2708);

        let err = record_scan(&state, "gala", submission("vol-1", ScanAction::CheckIn, None), &sampler)
            .await
            .expect_err("missing token");
        assert!(matches!(err, AppError::BadRequest(message) if message.contains("checkin_token")));

        let today = Utc::now().date_naive();
        let token = checkin_token_commands::build_token("s3cret", "gala", today).expect("token");
        let mut with_token = submission("vol-1", ScanAction::CheckIn, None);
        with_token.checkin_token = Some(token);
        let receipt = record_scan(&state, "gala", with_token, &sampler)
            .await
            .expect("token accepted");
        assert!(receipt.result.accepted);
    }
}
