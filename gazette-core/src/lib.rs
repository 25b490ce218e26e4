//! Gazette Core - Digest Data Types
//!
//! Pure data structures shared by the digest pipeline and the storage
//! layer. This crate contains ONLY data types and derived accessors -
//! no I/O and no business logic.

pub mod digest;
pub mod error;

pub use digest::{
    AnalyzedArticle, ArticleFormat, ArticleUrl, BiasAnalysis, BiasDirection, ConnectionType,
    ContentType, CrossConnection, Digest, DigestMetadata, DigestSection, ParsedArticle,
    QualityAnalysis,
};
pub use error::{ObjectStoreError, ObjectStoreResult, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// IDENTITY TYPES
// ============================================================================

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

/// Length of the hex digest produced by [`content_hash`].
pub const CONTENT_HASH_LEN: usize = 16;

/// Compute a short, stable content hash for cache identity.
///
/// SHA-256 of the input, hex-encoded and truncated to 16 characters.
/// Callers use this to derive a cache hash from a query string or URL;
/// identical inputs always hash identically.
pub fn content_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..CONTENT_HASH_LEN / 2])
}

// ============================================================================
// ARTIFACT NAMESPACES
// ============================================================================

/// Discriminator for the families of intermediate artifacts the pipeline
/// memoizes between runs. Each variant is its own cache namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Raw search results for a query.
    Search,
    /// Parsed article bodies.
    Articles,
}

impl ArtifactKind {
    /// Stable path segment for this namespace.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Search => "search",
            ArtifactKind::Articles => "articles",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "search" => Ok(ArtifactKind::Search),
            "articles" => Ok(ArtifactKind::Articles),
            _ => Err(format!("Invalid ArtifactKind: {}", s)),
        }
    }
}
