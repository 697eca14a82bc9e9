use axum::routing::{get, post};
use axum::Router;

use muster_application::AppState;

use crate::handlers::{attendance_handlers, ops_handlers, policy_handlers, scan_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/events/:event_id/scans",
            post(scan_handlers::record_scan).get(scan_handlers::list_scans),
        )
        .route(
            "/v1/events/:event_id/scans/latest",
            get(scan_handlers::latest_scan),
        )
        .route(
            "/v1/events/:event_id/attendance",
            get(attendance_handlers::attendance_summary),
        )
        .route(
            "/v1/events/:event_id/policy",
            get(policy_handlers::get_event_policy)
                .put(policy_handlers::put_event_policy)
                .delete(policy_handlers::delete_event_policy),
        )
        .route(
            "/v1/events/:event_id/checkin-token",
            post(scan_handlers::issue_checkin_token),
        )
        .route("/v1/policies", get(policy_handlers::list_event_policies))
        .route("/v1/sync/scans", post(scan_handlers::sync_scans))
        .route(
            "/v1/ops/review-target/check",
            get(ops_handlers::review_target_check),
        )
        .route(
            "/v1/ops/review-deliveries",
            get(ops_handlers::list_review_deliveries),
        )
        .route(
            "/v1/ops/review-deliveries/last",
            get(ops_handlers::get_last_review_delivery),
        )
        .route("/v1/ops/health/live", get(ops_handlers::health_live))
        .route("/v1/ops/health/ready", get(ops_handlers::health_ready))
        .route(
            "/v1/ops/metrics/prometheus",
            get(ops_handlers::metrics_prometheus),
        )
        .with_state(state)
}
