use tracing::{error, info};

use crate::commands::scan_commands::normalize_required_id;
use crate::{AppError, AppState};
use muster_domain::{EventId, EventPolicy};

pub async fn upsert_event_policy(
    state: &AppState,
    event_id: &str,
    mut policy: EventPolicy,
) -> Result<EventPolicy, AppError> {
    let event_id = EventId(normalize_required_id(event_id, "event_id")?);
    let body_event = policy.event_id.0.trim().to_lowercase();
    if !body_event.is_empty() && body_event != event_id.0 {
        return Err(AppError::BadRequest(format!(
            "policy event_id '{}' does not match path '{}'",
            body_event, event_id
        )));
    }
    policy.event_id = event_id.clone();
    policy
        .validate()
        .map_err(|err| AppError::BadRequest(err.to_string()))?;

    let mut policies = state.policies.write().await;
    let mut next = policies.clone();
    next.insert(event_id.clone(), policy.clone());
    persist(state, &next).await?;
    *policies = next;
    info!(
        "event policy updated: event={}, radius_m={}, geofence={}, speed_check={}",
        event_id, policy.geofence.radius_meters, policy.enable_geofence, policy.enable_speed_check
    );
    Ok(policy)
}

pub async fn remove_event_policy(state: &AppState, event_id: &str) -> Result<(), AppError> {
    let event_id = EventId(normalize_required_id(event_id, "event_id")?);
    let mut policies = state.policies.write().await;
    if !policies.contains_key(&event_id) {
        return Err(AppError::NotFound(format!(
            "no check-in policy for event '{}'",
            event_id
        )));
    }
    let mut next = policies.clone();
    next.remove(&event_id);
    persist(state, &next).await?;
    *policies = next;
    info!("event policy removed: event={}", event_id);
    Ok(())
}

async fn persist(
    state: &AppState,
    policies: &std::collections::HashMap<EventId, EventPolicy>,
) -> Result<(), AppError> {
    let mut list = policies.values().cloned().collect::<Vec<_>>();
    list.sort_by(|a, b| a.event_id.cmp(&b.event_id));
    state
        .policy_repo
        .save_policies(&state.config.policies_path, &list)
        .await
        .map_err(|err| {
            error!("failed to save event policies: {}", err);
            AppError::Internal(err)
        })
}
