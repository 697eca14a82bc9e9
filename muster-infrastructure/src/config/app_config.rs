use std::env;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use muster_domain::{DbConfig, RuntimeConfig, StorageBackend, DEFAULT_SPEED_THRESHOLD_KMH};

use crate::config::validation::{validate_database_name, validate_webhook_url};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub storage: StorageBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3240".to_string(),
            api_token: None,
            storage: StorageBackend::Memory,
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "muster".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            policies_path: "./event_policies.yaml".to_string(),
            default_speed_threshold_kmh: DEFAULT_SPEED_THRESHOLD_KMH,
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

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("MUSTER_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let base_dir = file_path.parent();
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            Self::from_toml(&content)?
        } else {
            warn!("{} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.resolve_paths(base_dir);
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| anyhow!("invalid config: {}", err))
    }

    pub fn normalize(&mut self) {
        self.api_token = non_blank(self.api_token.take());
        self.clickhouse_user = non_blank(self.clickhouse_user.take());
        self.clickhouse_password = non_blank(self.clickhouse_password.take());
        self.checkin_token_secret = non_blank(self.checkin_token_secret.take());
        self.review_webhook_url = non_blank(self.review_webhook_url.take());
        self.review_webhook_template = non_blank(self.review_webhook_template.take());
        self.review_webhook_token = non_blank(self.review_webhook_token.take());
        if let Some(group_id) = self.review_group_id {
            if group_id <= 0 {
                self.review_group_id = None;
            }
        }
        self.clickhouse_database = self.clickhouse_database.trim().to_string();
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        self.policies_path = resolve_path(base, &self.policies_path);
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.policies_path.trim().is_empty() {
            return Err(anyhow!("policies_path must not be empty"));
        }
        if !self.default_speed_threshold_kmh.is_finite() || self.default_speed_threshold_kmh <= 0.0 {
            return Err(anyhow!("default_speed_threshold_kmh must be greater than 0"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.history_limit == 0 {
            return Err(anyhow!("history_limit must be greater than 0"));
        }
        if let Some(url) = &self.review_webhook_url {
            validate_webhook_url(url)?;
        }
        if self.storage == StorageBackend::Clickhouse {
            validate_database_name(&self.clickhouse_database)?;
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            storage: self.storage,
            policies_path: self.policies_path.clone(),
            default_speed_threshold_kmh: self.default_speed_threshold_kmh,
            checkin_token_secret: self.checkin_token_secret.clone(),
            review_webhook_url: self.review_webhook_url.clone(),
            review_webhook_template: self.review_webhook_template.clone(),
            review_webhook_token: self.review_webhook_token.clone(),
            review_group_id: self.review_group_id,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            history_limit: self.history_limit,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            clickhouse_url: self.clickhouse_url.clone(),
            clickhouse_database: self.clickhouse_database.clone(),
            clickhouse_user: self.clickhouse_user.clone(),
            clickhouse_password: self.clickhouse_password.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("MUSTER_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("MUSTER_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Some(value) = lookup("MUSTER_STORAGE") {
            match value.trim().to_lowercase().as_str() {
                "memory" => self.storage = StorageBackend::Memory,
                "clickhouse" => self.storage = StorageBackend::Clickhouse,
                other => warn!("ignoring unknown MUSTER_STORAGE '{}'", other),
            }
        }
        if let Some(value) = lookup("MUSTER_CLICKHOUSE_URL") {
            self.clickhouse_url = value;
        }
        if let Some(value) = lookup("MUSTER_CLICKHOUSE_DATABASE") {
            self.clickhouse_database = value;
        }
        if let Some(value) = lookup("MUSTER_CLICKHOUSE_USER") {
            self.clickhouse_user = Some(value);
        }
        if let Some(value) = lookup("MUSTER_CLICKHOUSE_PASSWORD") {
            self.clickhouse_password = Some(value);
        }
        if let Some(value) = lookup("MUSTER_POLICIES_PATH") {
            self.policies_path = value;
        }
        if let Some(value) = lookup("MUSTER_DEFAULT_SPEED_THRESHOLD_KMH") {
            self.default_speed_threshold_kmh = parse_override(
                "MUSTER_DEFAULT_SPEED_THRESHOLD_KMH",
                &value,
                self.default_speed_threshold_kmh,
            );
        }
        if let Some(value) = lookup("MUSTER_CHECKIN_TOKEN_SECRET") {
            self.checkin_token_secret = Some(value);
        }
        if let Some(value) = lookup("MUSTER_REVIEW_WEBHOOK_URL") {
            self.review_webhook_url = Some(value);
        }
        if let Some(value) = lookup("MUSTER_REVIEW_WEBHOOK_TEMPLATE") {
            self.review_webhook_template = Some(value);
        }
        if let Some(value) = lookup("MUSTER_REVIEW_WEBHOOK_TOKEN") {
            self.review_webhook_token = Some(value);
        }
        if let Some(value) = lookup("MUSTER_REVIEW_GROUP_ID") {
            match value.trim().parse() {
                Ok(group_id) => self.review_group_id = Some(group_id),
                Err(_) => warn!(
                    "ignoring MUSTER_REVIEW_GROUP_ID='{}': not a valid group id",
                    value
                ),
            }
        }
        if let Some(value) = lookup("MUSTER_MAX_BODY_BYTES") {
            self.max_body_bytes = parse_override("MUSTER_MAX_BODY_BYTES", &value, self.max_body_bytes);
        }
        if let Some(value) = lookup("MUSTER_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = parse_override(
                "MUSTER_REQUEST_TIMEOUT_SECONDS",
                &value,
                self.request_timeout_seconds,
            );
        }
        if let Some(value) = lookup("MUSTER_HISTORY_LIMIT") {
            self.history_limit = parse_override("MUSTER_HISTORY_LIMIT", &value, self.history_limit);
        }
    }
}

fn parse_override<T>(key: &str, value: &str, current: T) -> T
where
    T: FromStr + Display,
{
    match value.trim().parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            warn!("ignoring {}='{}': not a valid value, keeping {}", key, value, current);
            current
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|item| !item.trim().is_empty())
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}
