use std::sync::atomic::{AtomicU64, Ordering};

use muster_domain::{ReasonCode, VerificationResult};

#[derive(Debug, Default)]
pub struct Metrics {
    scans: AtomicU64,
    accepted: AtomicU64,
    rejected: AtomicU64,
    invalid_samples: AtomicU64,
    outside_geofence: AtomicU64,
    implausible_speed: AtomicU64,
    out_of_order: AtomicU64,
    scan_errors: AtomicU64,
    sync_batches: AtomicU64,
}

impl Metrics {
    pub fn record_result(&self, result: &VerificationResult) {
        self.scans.fetch_add(1, Ordering::Relaxed);
        if result.accepted {
            self.accepted.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rejected.fetch_add(1, Ordering::Relaxed);
        }
        for code in &result.reason_codes {
            let counter = match code {
                ReasonCode::InvalidSample => &self.invalid_samples,
                ReasonCode::OutsideGeofence => &self.outside_geofence,
                ReasonCode::ImplausibleSpeed => &self.implausible_speed,
                ReasonCode::OutOfOrder => &self.out_of_order,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_scan_error(&self) {
        self.scan_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_sync_batch(&self) {
        self.sync_batches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn render_prometheus(&self) -> String {
        let scans = self.scans.load(Ordering::Relaxed);
        let accepted = self.accepted.load(Ordering::Relaxed);
        let rejected = self.rejected.load(Ordering::Relaxed);
        let invalid = self.invalid_samples.load(Ordering::Relaxed);
        let outside = self.outside_geofence.load(Ordering::Relaxed);
        let speed = self.implausible_speed.load(Ordering::Relaxed);
        let late = self.out_of_order.load(Ordering::Relaxed);
        let errors = self.scan_errors.load(Ordering::Relaxed);
        let batches = self.sync_batches.load(Ordering::Relaxed);

        format!(
            "# TYPE muster_scans_total counter\n\
muster_scans_total {}\n\
# TYPE muster_scans_accepted_total counter\n\
muster_scans_accepted_total {}\n\
# TYPE muster_scans_rejected_total counter\n\
muster_scans_rejected_total {}\n\
# TYPE muster_scan_reasons_total counter\n\
muster_scan_reasons_total{{reason=\"InvalidSample\"}} {}\n\
muster_scan_reasons_total{{reason=\"OutsideGeofence\"}} {}\n\
muster_scan_reasons_total{{reason=\"ImplausibleSpeed\"}} {}\n\
muster_scan_reasons_total{{reason=\"OutOfOrder\"}} {}\n\
# TYPE muster_scan_errors_total counter\n\
muster_scan_errors_total {}\n\
# TYPE muster_sync_batches_total counter\n\
muster_sync_batches_total {}\n",
            scans, accepted, rejected, invalid, outside, speed, late, errors, batches
        )
    }
}
