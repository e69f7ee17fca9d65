//! Replay pack fixture shape (spec §6): `{request_fingerprint, response}`
//! where `request_fingerprint = hex(sha256(canonical_json(method, url, normalised_headers, body)))`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fixture {
    pub request_fingerprint: String,
    pub response: serde_json::Value,
}

/// Hash the normalised request shape. Header keys are lower-cased and
/// sorted so fingerprinting is insensitive to header ordering/casing.
pub fn request_fingerprint(method: &str, url: &str, headers: &[(String, String)], body: &[u8]) -> String {
    let normalised_headers: BTreeMap<String, String> =
        headers.iter().map(|(k, v)| (k.to_lowercase(), v.clone())).collect();

    let canonical = serde_json::json!({
        "method": method.to_uppercase(),
        "url": url,
        "headers": normalised_headers,
        "body": hex::encode(body),
    })
    .to_string();

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

/// Merge `incoming` into `existing` by `request_fingerprint`; on conflict
/// the incoming fixture wins.
pub fn merge_fixtures(existing: Vec<Fixture>, incoming: Vec<Fixture>) -> Vec<Fixture> {
    let mut by_fingerprint: BTreeMap<String, Fixture> =
        existing.into_iter().map(|f| (f.request_fingerprint.clone(), f)).collect();
    for fixture in incoming {
        by_fingerprint.insert(fixture.request_fingerprint.clone(), fixture);
    }
    by_fingerprint.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_under_header_reordering() {
        let headers_a = vec![("Content-Type".into(), "application/json".into()), ("X-Id".into(), "1".into())];
        let headers_b = vec![("x-id".into(), "1".into()), ("content-type".into(), "application/json".into())];
        let a = request_fingerprint("GET", "https://example.com", &headers_a, b"body");
        let b = request_fingerprint("GET", "https://example.com", &headers_b, b"body");
        assert_eq!(a, b);
    }

    #[test]
    fn merge_prefers_latest_on_conflict() {
        let existing = vec![Fixture { request_fingerprint: "f1".into(), response: serde_json::json!({"v": 1}) }];
        let incoming = vec![Fixture { request_fingerprint: "f1".into(), response: serde_json::json!({"v": 2}) }];
        let merged = merge_fixtures(existing, incoming);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].response, serde_json::json!({"v": 2}));
    }
}
