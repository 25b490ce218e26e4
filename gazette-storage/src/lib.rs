//! Gazette Storage - Digest & Cache Persistence
//!
//! Persists generated digests durably, retrieves and lists them per user,
//! and keeps a short-lived cache of intermediate artifacts keyed by
//! artifact kind and content hash. Everything runs against a narrow
//! object store adapter; digest synthesis, authorization, and the HTTP
//! surface live elsewhere.

pub mod cache_store;
pub mod digest_store;
pub mod keys;
pub mod object_store;

pub use cache_store::{CacheEnvelope, CacheStore};
pub use digest_store::{DigestPage, DigestRecord, DigestStore, DigestSummary};
pub use object_store::{
    ListOptions, MemoryObjectStore, ObjectEntry, ObjectMetadata, ObjectPage, ObjectStore,
    StoredObject,
};
