use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use muster_domain::{normalize_identifier, EventId, EventPolicy, PolicyRepository};

/// Event policies kept as a YAML list on disk.
pub struct PolicyFileRepository;

impl PolicyFileRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PolicyFileRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_policies(content: &str) -> anyhow::Result<HashMap<EventId, EventPolicy>> {
    if content.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let entries: Vec<serde_yaml::Value> = serde_yaml::from_str(content)?;
    let mut policies = HashMap::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let mut policy: EventPolicy = match serde_yaml::from_value(entry) {
            Ok(policy) => policy,
            Err(err) => {
                warn!("skipping policy #{}: {}", index, err);
                continue;
            }
        };
        let Some(event_id) = normalize_identifier(policy.event_id.as_str()) else {
            warn!("skipping policy #{}: empty event_id", index);
            continue;
        };
        policy.event_id = EventId(event_id);
        if let Err(err) = policy.validate() {
            warn!("skipping policy {}: {}", policy.event_id, err);
            continue;
        }
        policies.insert(policy.event_id.clone(), policy);
    }
    Ok(policies)
}

#[async_trait]
impl PolicyRepository for PolicyFileRepository {
    async fn load_policies(&self, path: &str) -> anyhow::Result<HashMap<EventId, EventPolicy>> {
        if !Path::new(path).exists() {
            warn!("{} not found, starting without event policies", path);
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(path).await?;
        parse_policies(&content)
    }

    async fn save_policies(&self, path: &str, policies: &[EventPolicy]) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_yaml::to_string(policies)?;
        let tmp_path = format!("{}.tmp", path);
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, path).await?;
        Ok(())
    }
}
