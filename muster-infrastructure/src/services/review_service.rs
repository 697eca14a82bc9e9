use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::json;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tracing::{info, warn};

use muster_domain::ports::ReviewNotifier;
use muster_domain::{current_millis, ReviewDeliveryRecord, RuntimeConfig, ScanRecord};

const MAX_DELIVERY_RECORDS: usize = 200;
const MAX_MESSAGE_LINES: usize = 8;
const DEFAULT_TEMPLATE: &str = r#"{"message":"{total} check-in scan(s) need review\n{lines}"}"#;

/// Sends flagged scans to the configured review webhook (HTTP or WebSocket)
/// and keeps a short log of delivery attempts.
#[derive(Default, Clone)]
pub struct DefaultReviewNotifier {
    deliveries: Arc<Mutex<VecDeque<ReviewDeliveryRecord>>>,
}

impl DefaultReviewNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewNotifier for DefaultReviewNotifier {
    fn spawn_review(&self, config: RuntimeConfig, records: Vec<ScanRecord>) {
        let flagged = records
            .into_iter()
            .filter(|record| record.result.needs_review())
            .collect::<Vec<_>>();
        if flagged.is_empty() {
            return;
        }
        if config.review_webhook_url.is_none() {
            info!("{} scan(s) flagged for review, no review webhook configured", flagged.len());
            return;
        }
        let deliveries = self.deliveries.clone();
        tokio::spawn(async move {
            let mode = delivery_mode(&config);
            let result = send_review(&config, &flagged).await;
            if let Err(err) = &result {
                warn!("review webhook failed: {}", err);
            }
            let record = ReviewDeliveryRecord {
                delivered_at: current_millis(),
                mode: mode.to_string(),
                scan_count: flagged.len(),
                success: result.is_ok(),
                error: result.err().map(|err| err.to_string()),
            };
            let mut guard = deliveries.lock().await;
            guard.push_back(record);
            while guard.len() > MAX_DELIVERY_RECORDS {
                guard.pop_front();
            }
        });
    }

    async fn check_review_target(&self, config: &RuntimeConfig) -> Result<()> {
        check_review_target(config).await
    }

    async fn list_review_deliveries(&self, limit: usize) -> Vec<ReviewDeliveryRecord> {
        let guard = self.deliveries.lock().await;
        guard.iter().rev().take(limit).cloned().collect()
    }

    async fn last_review_delivery(&self) -> Option<ReviewDeliveryRecord> {
        self.deliveries.lock().await.back().cloned()
    }
}

pub async fn check_review_target(config: &RuntimeConfig) -> Result<()> {
    let url = resolve_review_url(config)?;
    if is_ws_url(&url) {
        check_ws_target(config, &url).await
    } else {
        check_http_target(config, &url).await
    }
}

fn is_ws_url(url: &str) -> bool {
    url.starts_with("ws://") || url.starts_with("wss://")
}

fn delivery_mode(config: &RuntimeConfig) -> &'static str {
    match config.review_webhook_url.as_deref() {
        Some(url) if is_ws_url(url) => "websocket",
        _ => "http",
    }
}

async fn send_review(config: &RuntimeConfig, records: &[ScanRecord]) -> Result<()> {
    let url = resolve_review_url(config)?;
    if is_ws_url(&url) {
        send_ws_review(config, &url, records).await
    } else {
        send_http_review(config, &url, records).await
    }
}

async fn send_http_review(config: &RuntimeConfig, url: &str, records: &[ScanRecord]) -> Result<()> {
    let template = config
        .review_webhook_template
        .as_deref()
        .unwrap_or(DEFAULT_TEMPLATE);

    let payload = build_payload(records, template);
    let client = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds.max(3)))
        .build()?;

    let mut request = client
        .post(url)
        .header("Content-Type", "application/json")
        .body(payload);
    if let Some(token) = &config.review_webhook_token {
        request = request.header(AUTHORIZATION, format!("Bearer {}", token));
    }
    request.send().await?.error_for_status()?;
    Ok(())
}

async fn check_http_target(config: &RuntimeConfig, url: &str) -> Result<()> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds.max(3)))
        .build()?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        anyhow::bail!("review webhook responded {}", response.status());
    }
    Ok(())
}

async fn check_ws_target(config: &RuntimeConfig, url: &str) -> Result<()> {
    let token = config.review_webhook_token.as_deref();
    let payload = json!({
        "action": "get_status",
        "params": {},
        "echo": format!("muster-check-{}", current_millis()),
    })
    .to_string();
    if let Err(err) = try_ws_send(url, token, &payload, false).await {
        if token.is_some() {
            return try_ws_send(url, token, &payload, true).await;
        }
        return Err(err);
    }
    Ok(())
}

async fn send_ws_review(config: &RuntimeConfig, url: &str, records: &[ScanRecord]) -> Result<()> {
    let group_id = config
        .review_group_id
        .ok_or_else(|| anyhow::anyhow!("review_group_id not configured"))?;
    let payload = json!({
        "action": "send_group_msg",
        "params": {
            "group_id": group_id,
            "message": build_message(records),
        },
        "echo": format!("muster-{}", current_millis()),
    })
    .to_string();

    let token = config.review_webhook_token.as_deref();
    if let Err(err) = try_ws_send(url, token, &payload, false).await {
        if token.is_some() {
            try_ws_send(url, token, &payload, true).await?;
        } else {
            return Err(err);
        }
    }
    Ok(())
}

// Header auth first; some gateways only accept the token as a query parameter.
async fn try_ws_send(url: &str, token: Option<&str>, payload: &str, use_query: bool) -> Result<()> {
    let mut request = if use_query {
        add_access_token_query(url, token).into_client_request()?
    } else {
        url.into_client_request()?
    };

    if let Some(token) = token {
        if !use_query {
            request
                .headers_mut()
                .insert(AUTHORIZATION, format!("Bearer {}", token).parse()?);
        }
    }

    let (mut ws, _) = tokio_tungstenite::connect_async(request).await?;
    ws.send(Message::Text(payload.to_string())).await?;
    let _ = timeout(Duration::from_secs(2), ws.next()).await.ok();
    let _ = ws.close(None).await;
    Ok(())
}

fn add_access_token_query(url: &str, token: Option<&str>) -> String {
    let token = match token {
        Some(value) if !value.trim().is_empty() => value,
        _ => return url.to_string(),
    };
    if url.contains("access_token=") {
        return url.to_string();
    }
    if url.contains('?') {
        format!("{}&access_token={}", url, token)
    } else {
        format!("{}?access_token={}", url, token)
    }
}

fn resolve_review_url(config: &RuntimeConfig) -> Result<String> {
    match &config.review_webhook_url {
        Some(url) if !url.trim().is_empty() => Ok(url.clone()),
        _ => anyhow::bail!("review webhook url not configured"),
    }
}

fn format_line(record: &ScanRecord) -> String {
    let reasons = record
        .result
        .reason_codes
        .iter()
        .map(|code| code.as_str())
        .collect::<Vec<_>>()
        .join(",");
    let speed = record
        .result
        .implied_speed_kmh
        .map(|value| format!("{:.0} km/h", value))
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} | {} {} | {} | {:.0} m | {}",
        record.scan.volunteer_id,
        record.scan.event_id,
        record.scan.action.as_str(),
        reasons,
        record.result.distance_meters,
        speed
    )
}

fn build_lines(records: &[ScanRecord]) -> Vec<String> {
    let mut lines = records
        .iter()
        .take(MAX_MESSAGE_LINES)
        .map(format_line)
        .collect::<Vec<_>>();
    if records.len() > MAX_MESSAGE_LINES {
        lines.push(format!("...and {} more", records.len() - MAX_MESSAGE_LINES));
    }
    lines
}

fn build_message(records: &[ScanRecord]) -> String {
    let mut lines = vec![format!("{} check-in scan(s) need review", records.len())];
    lines.extend(build_lines(records));
    lines.join("\n")
}

fn build_payload(records: &[ScanRecord], template: &str) -> String {
    template
        .replace("{total}", &records.len().to_string())
        .replace("{lines}", &build_lines(records).join("\\n"))
}
