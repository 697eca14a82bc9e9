use anyhow::{anyhow, Result};

pub fn validate_webhook_url(value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("webhook url is empty"));
    }
    let supported = ["http://", "https://", "ws://", "wss://"];
    if !supported.iter().any(|scheme| trimmed.starts_with(scheme)) {
        return Err(anyhow!(
            "webhook url must start with http://, https://, ws:// or wss://"
        ));
    }
    Ok(())
}

pub fn validate_database_name(value: &str) -> Result<()> {
    if value.is_empty() || !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(anyhow!("clickhouse_database must be alphanumeric or '_'"));
    }
    Ok(())
}
