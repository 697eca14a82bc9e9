// Runtime configuration shared with the application layer

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Clickhouse,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub storage: StorageBackend,
    pub policies_path: String,
    pub default_speed_threshold_kmh: f64,
    pub checkin_token_secret: Option<String>,
    pub review_webhook_url: Option<String>,
    pub review_webhook_template: Option<String>,
    pub review_webhook_token: Option<String>,
    pub review_group_id: Option<i64>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub history_limit: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            storage: StorageBackend::Memory,
            policies_path: "./event_policies.yaml".to_string(),
            default_speed_threshold_kmh: crate::services::DEFAULT_SPEED_THRESHOLD_KMH,
            checkin_token_secret: None,
            review_webhook_url: None,
            review_webhook_template: None,
            review_webhook_token: None,
            review_group_id: None,
            max_body_bytes: 2 * 1024 * 1024,
            request_timeout_seconds: 15,
            history_limit: 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
}
