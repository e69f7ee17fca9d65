//! AEAD envelope sealing/opening with key-id-prefixed rotation.
//!
//! Envelope wire format: `"<key_id>:<base64(nonce || ciphertext)>"`. The key
//! id prefix lets a `KeyRing` hold several generations of master key at once
//! so old envelopes keep decrypting after a rotation, while new envelopes are
//! always sealed with the active key.

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chacha20poly1305::{ChaCha20Poly1305, Key, KeyInit, Nonce, aead::Aead};
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::CryptoError;

const NONCE_LEN: usize = 12;

/// A named ChaCha20-Poly1305 master key, identified by `key_id` so rotated
/// generations can coexist during a rollover window.
#[derive(Clone)]
struct MasterKey {
    cipher: ChaCha20Poly1305,
}

/// Holds every master key generation the service currently trusts, plus
/// which one new envelopes are sealed with.
#[derive(Clone)]
pub struct KeyRing {
    active_key_id: String,
    keys: HashMap<String, MasterKey>,
}

impl KeyRing {
    /// Build a ring from `(key_id, raw 32-byte key)` pairs. `active_key_id`
    /// must be one of the supplied ids.
    pub fn new(active_key_id: impl Into<String>, keys: Vec<(String, [u8; 32])>) -> Result<Self, CryptoError> {
        let active_key_id = active_key_id.into();
        let mut map = HashMap::with_capacity(keys.len());
        for (id, raw) in keys {
            let cipher = ChaCha20Poly1305::new(Key::from_slice(&raw));
            map.insert(id, MasterKey { cipher });
        }
        if !map.contains_key(&active_key_id) {
            return Err(CryptoError::UnknownKeyId(active_key_id));
        }
        Ok(Self { active_key_id, keys: map })
    }

    /// Single-key convenience constructor, the common case outside rotation.
    pub fn single(key_id: impl Into<String>, raw: [u8; 32]) -> Result<Self, CryptoError> {
        let key_id = key_id.into();
        Self::new(key_id.clone(), vec![(key_id, raw)])
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<String, CryptoError> {
        let key = self
            .keys
            .get(&self.active_key_id)
            .ok_or_else(|| CryptoError::UnknownKeyId(self.active_key_id.clone()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = key
            .cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);

        Ok(format!("{}:{}", self.active_key_id, B64.encode(payload)))
    }

    pub fn open(&self, envelope: &str) -> Result<Vec<u8>, CryptoError> {
        let (key_id, body) = envelope.split_once(':').ok_or(CryptoError::MalformedEnvelope)?;
        let key = self
            .keys
            .get(key_id)
            .ok_or_else(|| CryptoError::UnknownKeyId(key_id.to_string()))?;

        let payload = B64.decode(body).map_err(|_| CryptoError::MalformedEnvelope)?;
        if payload.len() < NONCE_LEN {
            return Err(CryptoError::MalformedEnvelope);
        }
        let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        key.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring() -> KeyRing {
        KeyRing::single("k1", [7u8; 32]).unwrap()
    }

    #[test]
    fn seal_then_open_roundtrips() {
        let ring = ring();
        let sealed = ring.seal(b"{\"api_key\":\"sk-test\"}").unwrap();
        assert!(sealed.starts_with("k1:"));
        let opened = ring.open(&sealed).unwrap();
        assert_eq!(opened, b"{\"api_key\":\"sk-test\"}");
    }

    #[test]
    fn open_with_wrong_key_id_fails() {
        let ring = ring();
        let sealed = ring.seal(b"secret").unwrap();
        let tampered = sealed.replacen("k1:", "k2:", 1);
        assert!(matches!(ring.open(&tampered), Err(CryptoError::UnknownKeyId(_))));
    }

    #[test]
    fn open_tampered_ciphertext_fails_mac() {
        let ring = ring();
        let mut sealed = ring.seal(b"secret").unwrap();
        sealed.push('x');
        assert!(matches!(ring.open(&sealed), Err(CryptoError::MalformedEnvelope) | Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn rotation_keeps_old_key_id_decryptable() {
        let ring = KeyRing::new("k2", vec![("k1".into(), [1u8; 32]), ("k2".into(), [2u8; 32])]).unwrap();
        let old_ring = KeyRing::single("k1", [1u8; 32]).unwrap();
        let sealed_with_old = old_ring.seal(b"legacy").unwrap();
        assert_eq!(ring.open(&sealed_with_old).unwrap(), b"legacy");
    }
}
