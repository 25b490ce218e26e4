//! Digest persistence per user.
//!
//! Each digest serializes to one JSON document under the owner's
//! namespace. Writes attach the digest id and creation instant as object
//! metadata so listings can build summaries without reading any payloads.

use crate::keys;
use crate::object_store::{ListOptions, ObjectEntry, ObjectStore};
use chrono::{DateTime, Utc};
use gazette_core::{Digest, StorageError, StorageResult, Timestamp};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Metadata key carrying the caller-supplied digest id.
pub const META_DIGEST_ID: &str = "digest-id";
/// Metadata key carrying the record creation instant, RFC 3339.
pub const META_CREATED_AT: &str = "created-at";

/// Persisted unit for one generated digest.
///
/// `created_at` is set by the store at write time, never by the caller.
/// Records are written once and never mutated in place; re-storing the
/// same (user, digest id) pair silently overwrites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigestRecord {
    pub digest: Digest,
    pub markdown: String,
    pub created_at: Timestamp,
}

/// Borrowed view of a record for serialization at write time.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DigestRecordRef<'a> {
    digest: &'a Digest,
    markdown: &'a str,
    created_at: Timestamp,
}

/// Listing summary for one stored digest, built from metadata alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestSummary {
    pub digest_id: String,
    pub key: String,
    pub created_at: Timestamp,
}

/// One page of a user's digest listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DigestPage {
    pub digests: Vec<DigestSummary>,
    pub truncated: bool,
    pub cursor: Option<String>,
}

/// Digest store over an object store adapter.
#[derive(Debug, Clone)]
pub struct DigestStore<S> {
    store: Arc<S>,
}

impl<S: ObjectStore> DigestStore<S> {
    /// Create a digest store over the given adapter.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist a digest for a user and return the derived storage key.
    ///
    /// Overwrites any existing record at the same (user, digest id) pair;
    /// concurrent writers are last-writer-wins.
    pub async fn store(
        &self,
        user_id: &str,
        digest_id: &str,
        digest: &Digest,
        markdown: &str,
    ) -> StorageResult<String> {
        let key = keys::digest_key(user_id, digest_id);
        let created_at = Utc::now();
        let record = DigestRecordRef {
            digest,
            markdown,
            created_at,
        };
        let bytes = serde_json::to_vec(&record).map_err(|e| StorageError::Malformed {
            key: key.clone(),
            reason: e.to_string(),
        })?;

        let metadata = [
            (META_DIGEST_ID.to_string(), digest_id.to_string()),
            (META_CREATED_AT.to_string(), created_at.to_rfc3339()),
        ]
        .into_iter()
        .collect();
        self.store.put(&key, bytes, metadata).await?;
        debug!(%key, user_id, digest_id, "stored digest");
        Ok(key)
    }

    /// Fetch one digest record. A missing record is `Ok(None)`; stored
    /// bytes that fail to decode surface as [`StorageError::Malformed`].
    pub async fn get(&self, user_id: &str, digest_id: &str) -> StorageResult<Option<DigestRecord>> {
        let key = keys::digest_key(user_id, digest_id);
        match self.store.get(&key).await? {
            None => Ok(None),
            Some(object) => serde_json::from_slice(&object.bytes).map(Some).map_err(|e| {
                StorageError::Malformed {
                    key,
                    reason: e.to_string(),
                }
            }),
        }
    }

    /// List a user's digests as metadata-only summaries.
    ///
    /// Pagination is passed through from the adapter: when the page is
    /// truncated, the returned cursor continues the listing verbatim.
    /// An empty namespace yields an empty page.
    pub async fn list(&self, user_id: &str, options: &ListOptions) -> StorageResult<DigestPage> {
        let prefix = keys::digest_prefix(user_id);
        let page = self.store.list(&prefix, options).await?;
        let digests = page.entries.iter().map(summarize).collect();
        Ok(DigestPage {
            digests,
            truncated: page.truncated,
            cursor: page.cursor,
        })
    }

    /// Most recently created digest for a user, if any. Walks every
    /// listing page, so cost is linear in the user's digest count.
    pub async fn latest(&self, user_id: &str) -> StorageResult<Option<DigestSummary>> {
        let mut best: Option<DigestSummary> = None;
        let mut options = ListOptions::new();
        loop {
            let page = self.list(user_id, &options).await?;
            for summary in page.digests {
                if best
                    .as_ref()
                    .map_or(true, |b| summary.created_at > b.created_at)
                {
                    best = Some(summary);
                }
            }
            match (page.truncated, page.cursor) {
                (true, Some(cursor)) => options = ListOptions::new().with_cursor(cursor),
                _ => break,
            }
        }
        Ok(best)
    }

    /// Delete digests created before `cutoff`, returning how many were
    /// removed.
    pub async fn prune_older_than(
        &self,
        user_id: &str,
        cutoff: Timestamp,
    ) -> StorageResult<usize> {
        // Collect first so the cursor walk sees a stable view.
        let mut stale = Vec::new();
        let mut options = ListOptions::new();
        loop {
            let page = self.list(user_id, &options).await?;
            stale.extend(
                page.digests
                    .into_iter()
                    .filter(|s| s.created_at < cutoff)
                    .map(|s| s.key),
            );
            match (page.truncated, page.cursor) {
                (true, Some(cursor)) => options = ListOptions::new().with_cursor(cursor),
                _ => break,
            }
        }

        for key in &stale {
            self.store.delete(key).await?;
        }
        if !stale.is_empty() {
            debug!(user_id, pruned = stale.len(), "pruned old digests");
        }
        Ok(stale.len())
    }

    /// Delete one digest. Deleting a record that does not exist succeeds.
    pub async fn delete(&self, user_id: &str, digest_id: &str) -> StorageResult<()> {
        let key = keys::digest_key(user_id, digest_id);
        self.store.delete(&key).await?;
        debug!(%key, user_id, digest_id, "deleted digest");
        Ok(())
    }
}

/// Build a summary from a listing entry without reading the object.
/// Falls back to the key's file stem and the upload instant when the
/// metadata is absent (e.g. objects written by an older pipeline).
fn summarize(entry: &ObjectEntry) -> DigestSummary {
    let digest_id = entry
        .metadata
        .get(META_DIGEST_ID)
        .cloned()
        .unwrap_or_else(|| key_stem(&entry.key));
    let created_at = entry
        .metadata
        .get(META_CREATED_AT)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(entry.uploaded_at);
    DigestSummary {
        digest_id,
        key: entry.key.clone(),
        created_at,
    }
}

/// Final path segment of a key, without the `.json` suffix.
fn key_stem(key: &str) -> String {
    let name = key.rsplit('/').next().unwrap_or(key);
    name.strip_suffix(".json").unwrap_or(name).to_string()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::{MemoryObjectStore, ObjectMetadata, ObjectPage};
    use async_trait::async_trait;
    use chrono::TimeZone;
    use gazette_core::{DigestMetadata, ObjectStoreResult};

    fn digest(id: &str) -> Digest {
        Digest {
            metadata: DigestMetadata {
                digest_id: id.to_string(),
                generated_at: Utc::now(),
                topics: vec!["rust".to_string()],
                articles_found: 3,
                articles_parsed: 2,
                articles_analyzed: 2,
                articles_included: 1,
                tokens_used: 512,
                cost_usd: 0.01,
                user_id: Some("u-1".to_string()),
            },
            sections: Vec::new(),
            cross_story_connections: String::new(),
            skeptics_summary: String::new(),
        }
    }

    fn store() -> (Arc<MemoryObjectStore>, DigestStore<MemoryObjectStore>) {
        let backend = Arc::new(MemoryObjectStore::new());
        (backend.clone(), DigestStore::new(backend))
    }

    #[tokio::test]
    async fn test_store_then_get_roundtrip() {
        let (_, digests) = store();
        let stored = digest("d-1");
        let key = digests
            .store("u-1", "d-1", &stored, "# Digest\n")
            .await
            .expect("store should succeed");
        assert_eq!(key, "users/u-1/digests/d-1.json");

        let record = digests
            .get("u-1", "d-1")
            .await
            .expect("get should succeed")
            .expect("record should exist");
        assert_eq!(record.digest, stored);
        assert_eq!(record.markdown, "# Digest\n");
        assert!(record.created_at <= Utc::now());
    }

    #[tokio::test]
    async fn test_get_missing_digest_is_none() {
        let (_, digests) = store();
        let record = digests.get("u-1", "nonexistent").await.expect("get should succeed");
        assert_eq!(record, None);
    }

    #[tokio::test]
    async fn test_store_overwrites_same_digest_id() {
        let (backend, digests) = store();
        digests.store("u-1", "d-1", &digest("d-1"), "first").await.unwrap();
        digests.store("u-1", "d-1", &digest("d-1"), "second").await.unwrap();

        let record = digests.get("u-1", "d-1").await.unwrap().unwrap();
        assert_eq!(record.markdown, "second");
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_record_serializes_with_camel_case_envelope() {
        let (backend, digests) = store();
        digests.store("u-1", "d-1", &digest("d-1"), "md").await.unwrap();

        let object = backend
            .get("users/u-1/digests/d-1.json")
            .await
            .unwrap()
            .unwrap();
        let raw: serde_json::Value = serde_json::from_slice(&object.bytes).unwrap();
        assert!(raw.get("createdAt").is_some());
        assert!(raw.get("markdown").is_some());
        assert_eq!(
            object.metadata.get(META_DIGEST_ID).map(String::as_str),
            Some("d-1")
        );
    }

    #[tokio::test]
    async fn test_list_empty_namespace() {
        let (_, digests) = store();
        let page = digests.list("new-user", &ListOptions::new()).await.unwrap();
        assert!(page.digests.is_empty());
        assert!(!page.truncated);
        assert_eq!(page.cursor, None);
    }

    #[tokio::test]
    async fn test_list_builds_summaries_from_metadata() {
        let (_, digests) = store();
        for id in ["d-1", "d-2", "d-3"] {
            digests.store("u-1", id, &digest(id), "md").await.unwrap();
        }

        let page = digests.list("u-1", &ListOptions::new()).await.unwrap();
        let ids: Vec<&str> = page.digests.iter().map(|s| s.digest_id.as_str()).collect();
        assert_eq!(ids, vec!["d-1", "d-2", "d-3"]);
        assert!(!page.truncated);
    }

    #[tokio::test]
    async fn test_list_pagination_chains_via_cursor() {
        let (_, digests) = store();
        for id in ["d-1", "d-2", "d-3"] {
            digests.store("u-1", id, &digest(id), "md").await.unwrap();
        }

        let first = digests
            .list("u-1", &ListOptions::new().with_limit(2))
            .await
            .unwrap();
        assert_eq!(first.digests.len(), 2);
        assert!(first.truncated);
        let cursor = first.cursor.expect("truncated page must carry a cursor");

        let second = digests
            .list("u-1", &ListOptions::new().with_limit(2).with_cursor(cursor))
            .await
            .unwrap();
        assert_eq!(second.digests.len(), 1);
        assert_eq!(second.digests[0].digest_id, "d-3");
        assert!(!second.truncated);
        assert_eq!(second.cursor, None);
    }

    #[tokio::test]
    async fn test_list_does_not_cross_user_namespaces() {
        let (_, digests) = store();
        digests.store("u-1", "mine", &digest("mine"), "md").await.unwrap();
        digests.store("u-2", "theirs", &digest("theirs"), "md").await.unwrap();

        let page = digests.list("u-1", &ListOptions::new()).await.unwrap();
        assert_eq!(page.digests.len(), 1);
        assert_eq!(page.digests[0].digest_id, "mine");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_, digests) = store();
        digests.store("u-1", "d-1", &digest("d-1"), "md").await.unwrap();
        digests.delete("u-1", "d-1").await.expect("first delete should succeed");
        digests.delete("u-1", "d-1").await.expect("second delete should succeed");
        assert_eq!(digests.get("u-1", "d-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_malformed_record_surfaces_key() {
        let (backend, digests) = store();
        backend
            .put(
                "users/u-1/digests/bad.json",
                b"not json".to_vec(),
                ObjectMetadata::new(),
            )
            .await
            .unwrap();

        let err = digests.get("u-1", "bad").await.expect_err("get should fail");
        match err {
            StorageError::Malformed { key, .. } => {
                assert_eq!(key, "users/u-1/digests/bad.json");
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    /// Adapter stub that replays a canned listing page.
    struct FixedPageStore {
        page: ObjectPage,
    }

    #[async_trait]
    impl ObjectStore for FixedPageStore {
        async fn put(&self, _: &str, _: Vec<u8>, _: ObjectMetadata) -> ObjectStoreResult<()> {
            Ok(())
        }

        async fn get(&self, _: &str) -> ObjectStoreResult<Option<crate::StoredObject>> {
            Ok(None)
        }

        async fn list(&self, _: &str, _: &ListOptions) -> ObjectStoreResult<ObjectPage> {
            Ok(self.page.clone())
        }

        async fn delete(&self, _: &str) -> ObjectStoreResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_list_passes_store_cursor_through_verbatim() {
        let backend = Arc::new(FixedPageStore {
            page: ObjectPage {
                entries: vec![
                    ObjectEntry {
                        key: "users/u-1/digests/d-1.json".to_string(),
                        metadata: ObjectMetadata::new(),
                        uploaded_at: Utc::now(),
                    },
                    ObjectEntry {
                        key: "users/u-1/digests/d-2.json".to_string(),
                        metadata: ObjectMetadata::new(),
                        uploaded_at: Utc::now(),
                    },
                ],
                truncated: true,
                cursor: Some("next-cursor".to_string()),
            },
        });
        let digests = DigestStore::new(backend);

        let page = digests
            .list("u-1", &ListOptions::new().with_limit(2))
            .await
            .unwrap();
        assert!(page.truncated);
        assert_eq!(page.cursor.as_deref(), Some("next-cursor"));
        // Without metadata, summaries fall back to the key stem.
        assert_eq!(page.digests[0].digest_id, "d-1");
        assert_eq!(page.digests[1].digest_id, "d-2");
    }

    async fn put_with_created_at(
        backend: &MemoryObjectStore,
        user_id: &str,
        digest_id: &str,
        created_at: Timestamp,
    ) {
        let key = keys::digest_key(user_id, digest_id);
        let metadata = [
            (META_DIGEST_ID.to_string(), digest_id.to_string()),
            (META_CREATED_AT.to_string(), created_at.to_rfc3339()),
        ]
        .into_iter()
        .collect();
        backend.put(&key, b"{}".to_vec(), metadata).await.unwrap();
    }

    #[tokio::test]
    async fn test_latest_spans_page_boundaries() {
        let backend = Arc::new(MemoryObjectStore::with_page_limit(2));
        let digests = DigestStore::new(backend.clone());
        let base = Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap();
        for (id, hours) in [("d-1", 0), ("d-2", 48), ("d-3", 24), ("d-4", 12), ("d-5", 36)] {
            put_with_created_at(&backend, "u-1", id, base + chrono::Duration::hours(hours)).await;
        }

        let latest = digests.latest("u-1").await.unwrap().expect("user has digests");
        assert_eq!(latest.digest_id, "d-2");
    }

    #[tokio::test]
    async fn test_latest_for_empty_user_is_none() {
        let (_, digests) = store();
        assert_eq!(digests.latest("new-user").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_prune_deletes_only_strictly_older_records() {
        let backend = Arc::new(MemoryObjectStore::with_page_limit(2));
        let digests = DigestStore::new(backend.clone());
        let cutoff = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        put_with_created_at(&backend, "u-1", "old-1", cutoff - chrono::Duration::days(10)).await;
        put_with_created_at(&backend, "u-1", "old-2", cutoff - chrono::Duration::days(3)).await;
        put_with_created_at(&backend, "u-1", "boundary", cutoff).await;
        put_with_created_at(&backend, "u-1", "fresh", cutoff + chrono::Duration::days(1)).await;

        let pruned = digests.prune_older_than("u-1", cutoff).await.unwrap();
        assert_eq!(pruned, 2);
        assert_eq!(backend.len(), 2);
        assert!(backend.contains(&keys::digest_key("u-1", "boundary")));
        assert!(backend.contains(&keys::digest_key("u-1", "fresh")));
    }
}
