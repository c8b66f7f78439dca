//! Deterministic digests used to derive canonical storage keys.

use md5::{Digest, Md5};

/// Lowercase hex MD5 digest of raw document bytes.
pub fn content_digest(bytes: &[u8]) -> String {
    hex::encode(Md5::digest(bytes))
}

/// Lowercase hex MD5 digest of a logical filename, used as the summary cache key.
pub fn name_digest(name: &str) -> String {
    content_digest(name.as_bytes())
}
