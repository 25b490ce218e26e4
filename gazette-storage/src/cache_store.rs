//! Short-lived artifact cache with lazy logical expiry.
//!
//! Memoizes intermediate pipeline results (search hits, parsed article
//! bodies) keyed by artifact kind and content hash. Expiry is a read-time
//! predicate: a record past its TTL reads as absent while the physical
//! object stays in place for the backing store's own retention to
//! collect. No sweeper, no scheduler.

use crate::keys;
use crate::object_store::ObjectStore;
use chrono::Utc;
use gazette_core::{ArtifactKind, StorageError, StorageResult, Timestamp};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Metadata key carrying the expiry instant, RFC 3339, for inspection
/// without reading the object.
pub const META_EXPIRES_AT: &str = "expires-at";

/// Stored form of one cached artifact.
///
/// `expires_at` absent means the entry persists until explicitly deleted
/// or evicted by an external retention policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEnvelope<T> {
    pub data: T,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}

impl<T> CacheEnvelope<T> {
    /// Whether the entry is logically expired at `now`. A read at exactly
    /// `expires_at` still hits.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|expires_at| now > expires_at)
    }
}

/// Artifact cache over an object store adapter.
#[derive(Debug, Clone)]
pub struct CacheStore<S> {
    store: Arc<S>,
}

impl<S: ObjectStore> CacheStore<S> {
    /// Create a cache store over the given adapter.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Cache an artifact. With a TTL the entry expires `ttl` after now;
    /// without one it persists until deleted. Re-setting the same
    /// (kind, hash) pair silently overwrites.
    pub async fn set<T: Serialize>(
        &self,
        kind: ArtifactKind,
        hash: &str,
        data: &T,
        ttl: Option<Duration>,
    ) -> StorageResult<()> {
        let key = keys::cache_key(kind, hash);
        let created_at = Utc::now();
        // TTLs beyond chrono's representable range mean no practical
        // expiry, so they degrade to a persistent entry.
        let expires_at = ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
            .map(|ttl| created_at + ttl);
        let envelope = CacheEnvelope {
            data,
            created_at,
            expires_at,
        };
        let bytes = serde_json::to_vec(&envelope).map_err(|e| StorageError::Malformed {
            key: key.clone(),
            reason: e.to_string(),
        })?;

        let mut metadata = crate::object_store::ObjectMetadata::new();
        if let Some(expires_at) = expires_at {
            metadata.insert(META_EXPIRES_AT.to_string(), expires_at.to_rfc3339());
        }
        self.store.put(&key, bytes, metadata).await?;
        debug!(%key, kind = %kind, "cached artifact");
        Ok(())
    }

    /// Fetch a cached artifact. Absent and logically expired entries both
    /// read as `Ok(None)`; an expired entry's physical object is left in
    /// place rather than deleted here.
    pub async fn get<T: DeserializeOwned>(
        &self,
        kind: ArtifactKind,
        hash: &str,
    ) -> StorageResult<Option<T>> {
        let key = keys::cache_key(kind, hash);
        let Some(object) = self.store.get(&key).await? else {
            return Ok(None);
        };
        let envelope: CacheEnvelope<T> =
            serde_json::from_slice(&object.bytes).map_err(|e| StorageError::Malformed {
                key: key.clone(),
                reason: e.to_string(),
            })?;
        if envelope.is_expired_at(Utc::now()) {
            debug!(%key, "cache entry expired");
            return Ok(None);
        }
        Ok(Some(envelope.data))
    }

    /// Drop a cached artifact. Deleting an entry that does not exist
    /// succeeds.
    pub async fn delete(&self, kind: ArtifactKind, hash: &str) -> StorageResult<()> {
        let key = keys::cache_key(kind, hash);
        self.store.delete(&key).await?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
