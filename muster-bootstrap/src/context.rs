use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::RwLock;
use tracing::{info, warn};

use muster_application::ops::HistoryLocks;
use muster_application::{AppState, Metrics};
use muster_domain::{PolicyRepository, ScanHistoryRepository, StorageBackend};
use muster_infrastructure::{
    AppConfig, ClickhouseScanRepository, DefaultReviewNotifier, InMemoryScanRepository,
    PolicyFileRepository,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let runtime_config = config.to_runtime_config();

        let scan_repo: Arc<dyn ScanHistoryRepository> = match runtime_config.storage {
            StorageBackend::Memory => {
                warn!("using in-memory scan storage; history is lost on restart");
                Arc::new(InMemoryScanRepository::new())
            }
            StorageBackend::Clickhouse => {
                let db_config = config.to_db_config();
                info!(
                    clickhouse_url = %db_config.clickhouse_url,
                    clickhouse_database = %db_config.clickhouse_database,
                    clickhouse_user = %db_config.clickhouse_user.as_deref().unwrap_or("<default>"),
                    clickhouse_password_set = db_config.clickhouse_password.is_some(),
                    "connecting scan storage"
                );
                Arc::new(ClickhouseScanRepository::from_config(&db_config))
            }
        };
        scan_repo.ensure_schema().await?;

        let policy_repo = Arc::new(PolicyFileRepository::new());
        let policies = match policy_repo.load_policies(&runtime_config.policies_path).await {
            Ok(policies) => policies,
            Err(err) => {
                warn!("failed to load event policies from {}: {}", runtime_config.policies_path, err);
                HashMap::new()
            }
        };
        info!("loaded {} event policies", policies.len());

        let state = AppState {
            config: runtime_config,
            scan_repo,
            policy_repo,
            review_notifier: Arc::new(DefaultReviewNotifier::new()),
            policies: Arc::new(RwLock::new(policies)),
            history_locks: Arc::new(HistoryLocks::default()),
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state })
    }
}
