//! Object store adapter trait and in-memory reference backend.
//!
//! The adapter is the narrow seam between this layer and the durable
//! blob store: put/get/list/delete by string key, with string metadata
//! attached at write time and cursor pagination on listings. Listings
//! may be eventually consistent for freshly written keys; callers of
//! this trait do not assume otherwise.

use async_trait::async_trait;
use chrono::Utc;
use gazette_core::{ObjectStoreResult, Timestamp};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::{Arc, RwLock};

/// String metadata attached to a stored object.
pub type ObjectMetadata = HashMap<String, String>;

/// A stored object: raw bytes plus the metadata attached at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub metadata: ObjectMetadata,
}

/// One entry in a listing page. Carries metadata so callers can build
/// summaries without reading each object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    pub key: String,
    pub metadata: ObjectMetadata,
    pub uploaded_at: Timestamp,
}

/// One page of a prefix listing.
///
/// When `truncated` is true, `cursor` holds an opaque continuation token
/// the caller resubmits verbatim to fetch the next page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectPage {
    pub entries: Vec<ObjectEntry>,
    pub truncated: bool,
    pub cursor: Option<String>,
}

/// Options for a paginated listing call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListOptions {
    pub cursor: Option<String>,
    pub limit: Option<usize>,
}

impl ListOptions {
    /// Create listing options with backend defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap the number of entries per page.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Continue a listing from a previously returned cursor.
    pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// Narrow interface to the durable blob store.
///
/// All calls are single round trips: no retries, no timeouts, no
/// read-modify-write. Concurrent writes to one key are last-writer-wins
/// at whatever granularity the backend provides.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write an object, overwriting any existing value at the key.
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: ObjectMetadata,
    ) -> ObjectStoreResult<()>;

    /// Read an object. A missing key is `Ok(None)`, never an error.
    async fn get(&self, key: &str) -> ObjectStoreResult<Option<StoredObject>>;

    /// List keys under a prefix in lexicographic order.
    async fn list(&self, prefix: &str, options: &ListOptions) -> ObjectStoreResult<ObjectPage>;

    /// Delete an object. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> ObjectStoreResult<()>;
}

// ============================================================================
// IN-MEMORY BACKEND
// ============================================================================

/// Largest page a single list call will return.
const DEFAULT_PAGE_LIMIT: usize = 1000;

#[derive(Debug, Clone)]
struct MemoryObject {
    bytes: Vec<u8>,
    metadata: ObjectMetadata,
    uploaded_at: Timestamp,
}

/// In-memory object store for tests and bucket-less pipeline runs.
///
/// Keys are held in a `BTreeMap`, so prefix listings come back in
/// lexicographic order and the continuation cursor is simply the last
/// key of the returned page.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, MemoryObject>>>,
    page_limit: Option<usize>,
}

impl MemoryObjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the default page limit. Listings never return more than
    /// this many entries regardless of the requested limit.
    pub fn with_page_limit(limit: usize) -> Self {
        Self {
            objects: Arc::new(RwLock::new(BTreeMap::new())),
            page_limit: Some(limit),
        }
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().unwrap().len()
    }

    /// Whether the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.read().unwrap().is_empty()
    }

    /// Whether an object exists at the key.
    pub fn contains(&self, key: &str) -> bool {
        self.objects.read().unwrap().contains_key(key)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        key: &str,
        bytes: Vec<u8>,
        metadata: ObjectMetadata,
    ) -> ObjectStoreResult<()> {
        let object = MemoryObject {
            bytes,
            metadata,
            uploaded_at: Utc::now(),
        };
        self.objects.write().unwrap().insert(key.to_string(), object);
        Ok(())
    }

    async fn get(&self, key: &str) -> ObjectStoreResult<Option<StoredObject>> {
        let objects = self.objects.read().unwrap();
        Ok(objects.get(key).map(|object| StoredObject {
            bytes: object.bytes.clone(),
            metadata: object.metadata.clone(),
        }))
    }

    async fn list(&self, prefix: &str, options: &ListOptions) -> ObjectStoreResult<ObjectPage> {
        let page_limit = self.page_limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        let limit = options.limit.unwrap_or(page_limit).min(page_limit).max(1);

        // The cursor is the last key of the previous page; resume past it.
        let start = match &options.cursor {
            Some(cursor) => Bound::Excluded(cursor.clone()),
            None => Bound::Included(prefix.to_string()),
        };

        let objects = self.objects.read().unwrap();
        let mut entries = Vec::new();
        let mut truncated = false;
        for (key, object) in objects.range::<String, _>((start, Bound::Unbounded)) {
            if !key.starts_with(prefix) {
                break;
            }
            if entries.len() == limit {
                truncated = true;
                break;
            }
            entries.push(ObjectEntry {
                key: key.clone(),
                metadata: object.metadata.clone(),
                uploaded_at: object.uploaded_at,
            });
        }

        let cursor = if truncated {
            entries.last().map(|entry| entry.key.clone())
        } else {
            None
        };
        Ok(ObjectPage {
            entries,
            truncated,
            cursor,
        })
    }

    async fn delete(&self, key: &str) -> ObjectStoreResult<()> {
        self.objects.write().unwrap().remove(key);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
