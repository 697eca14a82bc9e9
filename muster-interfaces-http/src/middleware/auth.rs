use std::io::Read;

use anyhow::{bail, Result};
use axum::http::HeaderMap;
use flate2::read::GzDecoder;

use muster_domain::{RuntimeConfig, SyncEnvelope};

pub fn authorize(config: &RuntimeConfig, headers: &HeaderMap) -> bool {
    if let Some(api_token) = &config.api_token {
        return extract_bearer(headers)
            .map(|v| v == *api_token)
            .unwrap_or(false);
    }
    true
}

/// Decodes an offline sync body, gzip-compressed or plain JSON. The decoded
/// body may not exceed `max_bytes`. Schema version and batch size are checked
/// by the sync command.
pub fn parse_sync_envelope(
    headers: &HeaderMap,
    body: &[u8],
    max_bytes: u64,
) -> Result<SyncEnvelope> {
    let content = maybe_gunzip(headers, body, max_bytes)?;
    Ok(serde_json::from_str(&content)?)
}

fn maybe_gunzip(headers: &HeaderMap, body: &[u8], max_bytes: u64) -> Result<String> {
    let gzipped = headers
        .get("Content-Encoding")
        .and_then(|encoding| encoding.to_str().ok())
        .is_some_and(|encoding| encoding.trim().eq_ignore_ascii_case("gzip"));
    let mut out = Vec::new();
    if gzipped {
        GzDecoder::new(body)
            .take(max_bytes.saturating_add(1))
            .read_to_end(&mut out)?;
    } else {
        out.extend_from_slice(body);
    }
    if out.len() as u64 > max_bytes {
        bail!("sync body exceeds the {} byte limit", max_bytes);
    }
    Ok(String::from_utf8(out)?)
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const LIMIT: u64 = 1024 * 1024;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).expect("write");
        encoder.finish().expect("finish")
    }

    const BODY: &str = r#"{
        "schema_version": "v1",
        "device_id": "tablet-3",
        "scans": [{
            "event_id": "beach-cleanup",
            "client_ref": "q-1",
            "volunteer_id": "vol-1",
            "action": "check_in",
            "method": "qr",
            "location": {"latitude": 25.2048, "longitude": 55.2708, "accuracy_meters": 8.0},
            "recorded_at": "2026-03-01T09:00:00Z"
        }]
    }"#;

    fn config_with_token(token: Option<&str>) -> RuntimeConfig {
        RuntimeConfig {
            api_token: token.map(str::to_string),
            ..RuntimeConfig::default()
        }
    }

    #[test]
    fn open_when_no_token_configured() {
        assert!(authorize(&config_with_token(None), &HeaderMap::new()));
    }

    #[test]
    fn bearer_token_must_match() {
        let config = config_with_token(Some("s3cret"));
        let mut headers = HeaderMap::new();
        assert!(!authorize(&config, &headers));

        headers.insert("Authorization", HeaderValue::from_static("Bearer wrong"));
        assert!(!authorize(&config, &headers));

        headers.insert("Authorization", HeaderValue::from_static("Basic s3cret"));
        assert!(!authorize(&config, &headers));

        headers.insert("Authorization", HeaderValue::from_static("Bearer s3cret"));
        assert!(authorize(&config, &headers));
    }

    #[test]
    fn plain_sync_body_parses() {
        let envelope = parse_sync_envelope(&HeaderMap::new(), BODY.as_bytes(), LIMIT).expect("parse");
        assert_eq!(envelope.schema_version, "v1");
        assert_eq!(envelope.scans.len(), 1);
        assert_eq!(envelope.scans[0].client_ref.as_deref(), Some("q-1"));
        assert_eq!(envelope.scans[0].submission.volunteer_id, "vol-1");
    }

    #[test]
    fn gzip_sync_body_parses() {
        let compressed = gzip(BODY.as_bytes());

        let mut headers = HeaderMap::new();
        headers.insert("Content-Encoding", HeaderValue::from_static("gzip"));
        let envelope = parse_sync_envelope(&headers, &compressed, LIMIT).expect("parse");
        assert_eq!(envelope.scans[0].event_id, "beach-cleanup");
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_sync_envelope(&HeaderMap::new(), b"{not json", LIMIT).is_err());
    }

    #[test]
    fn gzip_bomb_is_cut_off_at_the_limit() {
        let mut inflated = vec![b' '; 8 * LIMIT as usize];
        inflated.extend_from_slice(b"{not json");
        let compressed = gzip(&inflated);
        assert!((compressed.len() as u64) < LIMIT / 16);

        let mut headers = HeaderMap::new();
        headers.insert("Content-Encoding", HeaderValue::from_static("gzip"));
        let err = parse_sync_envelope(&headers, &compressed, LIMIT).expect_err("over limit");
        assert!(err.to_string().contains("byte limit"), "{}", err);
    }

    #[test]
    fn plain_body_over_the_limit_is_refused() {
        let err = parse_sync_envelope(&HeaderMap::new(), BODY.as_bytes(), 16).expect_err("over limit");
        assert!(err.to_string().contains("16 byte limit"), "{}", err);
    }
}
