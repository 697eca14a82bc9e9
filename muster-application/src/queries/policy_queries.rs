use crate::commands::scan_commands::normalize_required_id;
use crate::{AppError, AppState};
use muster_domain::{EventId, EventPolicy};

pub async fn get_event_policy(state: &AppState, event_id: &str) -> Result<EventPolicy, AppError> {
    let event_id = EventId(normalize_required_id(event_id, "event_id")?);
    state
        .policies
        .read()
        .await
        .get(&event_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("no check-in policy for event '{}'", event_id)))
}

pub async fn list_event_policies(state: &AppState) -> Vec<EventPolicy> {
    let policies = state.policies.read().await;
    let mut list = policies.values().cloned().collect::<Vec<_>>();
    list.sort_by(|a, b| a.event_id.cmp(&b.event_id));
    list
}
