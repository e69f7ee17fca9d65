//! Credential resolver (C2) — decrypts and caches credentials by id or name.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use db::DbPool;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::envelope::KeyRing;
use crate::error::CryptoError;

/// A decrypted credential, ready for a connector to use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub name: String,
    pub credential_type: String,
    pub data: HashMap<String, String>,
    pub expires_at: Option<DateTime<Utc>>,
    /// `true` when `expires_at` has passed. Callers decide whether an
    /// expired credential is still usable; the resolver never filters it.
    pub expired: bool,
}

fn cache_key(workspace_id: Uuid, id: Uuid) -> String {
    format!("cred:{workspace_id}:{id}")
}

pub struct Resolver {
    pool: DbPool,
    keyring: KeyRing,
    cache: Arc<cache::Cache<Credential>>,
}

impl Resolver {
    pub fn new(pool: DbPool, keyring: KeyRing, cache: Arc<cache::Cache<Credential>>) -> Self {
        Self { pool, keyring, cache }
    }

    fn decrypt_row(&self, row: &db::models::CredentialRow) -> Result<Credential, CryptoError> {
        let plaintext = self.keyring.open(&row.data_encrypted)?;
        let data: HashMap<String, String> =
            serde_json::from_slice(&plaintext).map_err(|_| CryptoError::MalformedEnvelope)?;
        let expired = row.expires_at.map(|exp| exp <= Utc::now()).unwrap_or(false);
        Ok(Credential {
            id: row.id,
            name: row.name.clone(),
            credential_type: row.credential_type.clone(),
            data,
            expires_at: row.expires_at,
            expired,
        })
    }

    /// Resolve a batch of credential ids within a workspace namespace.
    /// Cache hits short-circuit per id; misses are fetched in one batch
    /// query. Ids with no matching row are simply absent from the result.
    pub async fn resolve(
        &self,
        workspace_id: Uuid,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Credential>, CryptoError> {
        let mut resolved = HashMap::with_capacity(ids.len());
        let mut missing = Vec::new();

        for &id in ids {
            match self.cache.get(&cache_key(workspace_id, id)).await {
                Some(cred) => {
                    resolved.insert(id, cred);
                }
                None => missing.push(id),
            }
        }

        if missing.is_empty() {
            return Ok(resolved);
        }

        let rows = db::repository::credentials::get_by_ids(&self.pool, workspace_id, &missing).await?;
        for row in rows {
            let cred = self.decrypt_row(&row)?;
            self.cache.set(&cache_key(workspace_id, row.id), cred.clone(), None).await;
            resolved.insert(row.id, cred);
        }

        Ok(resolved)
    }

    pub async fn resolve_by_name(&self, workspace_id: Uuid, name: &str) -> Result<Credential, CryptoError> {
        let row = db::repository::credentials::get_by_name(&self.pool, workspace_id, name)
            .await
            .map_err(|e| match e {
                db::DbError::NotFound => CryptoError::NotFound,
                other => CryptoError::Db(other),
            })?;
        let cred = self.decrypt_row(&row)?;
        self.cache.set(&cache_key(workspace_id, row.id), cred.clone(), None).await;
        Ok(cred)
    }

    pub async fn seal_for_storage(&self, data: &HashMap<String, String>) -> Result<String, CryptoError> {
        let plaintext = serde_json::to_vec(data).map_err(|_| CryptoError::MalformedEnvelope)?;
        self.keyring.seal(&plaintext)
    }

    /// Remove cached entries. An empty `ids` clears nothing here — callers
    /// wanting a full-namespace clear use [`Resolver::invalidate_namespace`].
    pub async fn invalidate(&self, workspace_id: Uuid, ids: &[Uuid]) {
        for &id in ids {
            self.cache.delete(&cache_key(workspace_id, id)).await;
        }
    }

    /// Clears every cached credential, regardless of workspace. The cache
    /// has no per-namespace index, so a full clear is the only option for
    /// "invalidate with an empty id list" (spec.md §4.2).
    pub async fn invalidate_namespace(&self) {
        self.cache.clear().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::KeyRing;

    #[test]
    fn decrypt_row_marks_expired_when_past() {
        let keyring = KeyRing::single("k1", [9u8; 32]).unwrap();
        let mut data = HashMap::new();
        data.insert("api_key".to_string(), "sk-test".to_string());
        let sealed = keyring.seal(&serde_json::to_vec(&data).unwrap()).unwrap();

        let row = db::models::CredentialRow {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            name: "stripe".into(),
            credential_type: "api_key".into(),
            data_encrypted: sealed,
            expires_at: Some(Utc::now() - chrono::Duration::seconds(1)),
            last_used_at: None,
        };

        // Exercised through a Resolver would need a live pool; the decrypt
        // path itself is pure, so test it directly via the keyring + parse.
        let plaintext = keyring.open(&row.data_encrypted).unwrap();
        let parsed: HashMap<String, String> = serde_json::from_slice(&plaintext).unwrap();
        assert_eq!(parsed.get("api_key"), Some(&"sk-test".to_string()));
        assert!(row.expires_at.unwrap() <= Utc::now());
    }
}
