//! Worker→coordinator callback verification (spec.md §6): HMAC-signed body,
//! `X-<Brand>-Timestamp` / `X-<Brand>-Signature` headers, `±callback_ttl`
//! window (default 300s).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::DispatchError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    Completed,
    Failed,
    Progress,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackBody {
    pub job_id: uuid::Uuid,
    pub callback_token: String,
    pub execution_id: uuid::Uuid,
    pub status: CallbackStatus,
    #[serde(default)]
    pub nodes: Option<serde_json::Value>,
    #[serde(default)]
    pub duration_ms: Option<i64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub progress: Option<i32>,
}

fn sign(body: &[u8], shared_secret: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(shared_secret).expect("HMAC accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a callback's timestamp and signature headers against `body`.
/// `timestamp_header` is an RFC3339 string; `signature_header` is
/// `hex(HMAC_SHA256(body, shared_secret))`.
pub fn verify(
    body: &[u8],
    timestamp_header: &str,
    signature_header: &str,
    shared_secret: &[u8],
    ttl_seconds: i64,
) -> Result<(), DispatchError> {
    let timestamp: DateTime<Utc> = timestamp_header
        .parse()
        .map_err(|_| DispatchError::CallbackUnauthorized("malformed timestamp header"))?;

    let age = (Utc::now() - timestamp).num_seconds().abs();
    if age > ttl_seconds {
        return Err(DispatchError::CallbackUnauthorized("timestamp outside callback ttl"));
    }

    let expected = sign(body, shared_secret);
    if !constant_time_eq(expected.as_bytes(), signature_header.as_bytes()) {
        return Err(DispatchError::CallbackUnauthorized("signature mismatch"));
    }

    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_signature_and_fresh_timestamp_is_accepted() {
        let secret = b"shared-secret";
        let body = br#"{"job_id":"..."}"#;
        let ts = Utc::now().to_rfc3339();
        let sig = sign(body, secret);
        assert!(verify(body, &ts, &sig, secret, 300).is_ok());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let secret = b"shared-secret";
        let body = b"{}";
        let ts = (Utc::now() - chrono::Duration::seconds(600)).to_rfc3339();
        let sig = sign(body, secret);
        assert!(verify(body, &ts, &sig, secret, 300).is_err());
    }

    #[test]
    fn tampered_body_fails_signature_check() {
        let secret = b"shared-secret";
        let ts = Utc::now().to_rfc3339();
        let sig = sign(b"original", secret);
        assert!(verify(b"tampered", &ts, &sig, secret, 300).is_err());
    }
}
