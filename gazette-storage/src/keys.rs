//! Storage key derivation.
//!
//! Pure string composition mapping logical identities to object store
//! paths. No I/O and no failure modes: every caller-supplied identifier
//! produces a valid key, and distinct identities never collide.
//!
//! Path patterns:
//! - digests: `users/{user_id}/digests/{digest_id}.json`
//! - cache:   `cache/{kind}/{hash}.json`

use gazette_core::ArtifactKind;

/// Content-type suffix on every stored object.
const KEY_SUFFIX: &str = ".json";

/// Storage path for one digest record.
pub fn digest_key(user_id: &str, digest_id: &str) -> String {
    format!(
        "users/{}/digests/{}{}",
        encode_component(user_id),
        encode_component(digest_id),
        KEY_SUFFIX
    )
}

/// Listing prefix covering every digest a user owns.
pub fn digest_prefix(user_id: &str) -> String {
    format!("users/{}/digests/", encode_component(user_id))
}

/// Storage path for one cached artifact.
pub fn cache_key(kind: ArtifactKind, hash: &str) -> String {
    format!("cache/{}/{}{}", kind.as_str(), encode_component(hash), KEY_SUFFIX)
}

const HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-escape a key component.
///
/// Everything outside `[A-Za-z0-9._~-]` is encoded, `%` and `/` included,
/// so caller-supplied identifiers cannot break out of their namespace and
/// the encoding stays injective.
fn encode_component(component: &str) -> String {
    let mut out = String::with_capacity(component.len());
    for &byte in component.as_bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push(HEX_UPPER[(byte >> 4) as usize] as char);
                out.push(HEX_UPPER[(byte & 0x0F) as usize] as char);
            }
        }
    }
    out
}

// =============================================================================
// TESTS
// =============================================================================
