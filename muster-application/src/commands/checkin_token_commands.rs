use anyhow::anyhow;
use chrono::{Duration, NaiveDate, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::commands::scan_commands::normalize_required_id;
use crate::{AppError, AppState};
use muster_domain::{CheckinTokenRequest, CheckinTokenResponse, EventId, RuntimeConfig};

const TOKEN_PREFIX: &str = "muster";
const TOKEN_VERSION: &str = "v1";
const DAY_FORMAT: &str = "%Y%m%d";

type HmacSha256 = Hmac<Sha256>;

/// Issues the day-scoped token printed into an event's check-in QR code.
pub async fn issue_checkin_token(
    state: &AppState,
    event_id: &str,
    request: CheckinTokenRequest,
) -> Result<CheckinTokenResponse, AppError> {
    let event_id = EventId(normalize_required_id(event_id, "event_id")?);
    if !state.policies.read().await.contains_key(&event_id) {
        return Err(AppError::NotFound(format!(
            "no check-in policy for event '{}'",
            event_id
        )));
    }
    let secret = configured_secret(&state.config).ok_or_else(|| {
        AppError::BadRequest("checkin_token_secret is not configured".to_string())
    })?;

    let day = match request.day.as_deref().map(str::trim).filter(|day| !day.is_empty()) {
        Some(raw) => parse_day(raw)?,
        None => Utc::now().date_naive(),
    };
    let token = build_token(secret, event_id.as_str(), day)?;
    let expires_at = day
        .succ_opt()
        .and_then(|next| next.and_hms_opt(0, 0, 0))
        .ok_or_else(|| AppError::Internal(anyhow!("failed to calculate token expiry")))?
        .and_utc();

    Ok(CheckinTokenResponse {
        token,
        event_id: event_id.0,
        day: day.format(DAY_FORMAT).to_string(),
        expires_at: expires_at.to_rfc3339(),
    })
}

pub fn verify_checkin_token(
    config: &RuntimeConfig,
    event_id: &EventId,
    token: &str,
    day: NaiveDate,
) -> Result<(), AppError> {
    let secret = configured_secret(config).ok_or_else(|| {
        AppError::Internal(anyhow!(
            "event '{}' requires a checkin token but no secret is configured",
            event_id
        ))
    })?;
    verify_token(secret, event_id.as_str(), token, day)
}

pub(crate) fn build_token(secret: &str, event_id: &str, day: NaiveDate) -> Result<String, AppError> {
    let day = day.format(DAY_FORMAT).to_string();
    let signature = sign_hmac_sha256(secret, &signing_payload(&day, event_id))?;
    Ok(format!(
        "{}.{}.{}.{}.{}",
        TOKEN_PREFIX, TOKEN_VERSION, day, event_id, signature
    ))
}

fn verify_token(secret: &str, event_id: &str, token: &str, day: NaiveDate) -> Result<(), AppError> {
    let malformed = || AppError::BadRequest("malformed checkin_token".to_string());

    let mut head = token.trim().splitn(4, '.');
    let prefix = head.next().ok_or_else(malformed)?;
    let version = head.next().ok_or_else(malformed)?;
    let token_day = head.next().ok_or_else(malformed)?;
    let rest = head.next().ok_or_else(malformed)?;
    // event ids may contain dots, so the signature is split from the right
    let (token_event, signature) = rest.rsplit_once('.').ok_or_else(malformed)?;

    if prefix != TOKEN_PREFIX || version != TOKEN_VERSION {
        return Err(malformed());
    }
    if token_event != event_id {
        return Err(AppError::BadRequest(
            "checkin_token was issued for another event".to_string(),
        ));
    }
    let expected_day = day.format(DAY_FORMAT).to_string();
    if token_day != expected_day {
        return Err(AppError::BadRequest("checkin_token has expired".to_string()));
    }

    let signature = decode_hex(signature).ok_or_else(malformed)?;
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| AppError::Internal(anyhow!("hmac init failed: {err}")))?;
    mac.update(signing_payload(token_day, token_event).as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AppError::BadRequest("checkin_token signature mismatch".to_string()))
}

fn signing_payload(day: &str, event_id: &str) -> String {
    format!("{}|{}|{}|{}", TOKEN_PREFIX, TOKEN_VERSION, day, event_id)
}

fn configured_secret(config: &RuntimeConfig) -> Option<&str> {
    config
        .checkin_token_secret
        .as_deref()
        .map(str::trim)
        .filter(|secret| !secret.is_empty())
}

fn parse_day(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, DAY_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .map_err(|_| AppError::BadRequest(format!("invalid day '{}', expected YYYYMMDD", raw)))
        .and_then(|day| {
            let today = Utc::now().date_naive();
            if day < today - Duration::days(1) {
                Err(AppError::BadRequest(format!("day '{}' is in the past", raw)))
            } else {
                Ok(day)
            }
        })
}

fn sign_hmac_sha256(secret: &str, payload: &str) -> Result<String, AppError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|err| AppError::Internal(anyhow!("hmac init failed: {err}")))?;
    mac.update(payload.as_bytes());
    let digest = mac.finalize().into_bytes();

    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    Ok(out)
}

fn decode_hex(value: &str) -> Option<Vec<u8>> {
    if value.len() % 2 != 0 {
        return None;
    }
    (0..value.len())
        .step_by(2)
        .map(|idx| u8::from_str_radix(value.get(idx..idx + 2)?, 16).ok())
        .collect()
}
