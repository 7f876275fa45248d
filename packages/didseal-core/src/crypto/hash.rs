//! # Content Hashing
//!
//! SHA-256 digests used for content addressing and integrity checks.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         TWO DIGESTS, ONE PRIMITIVE                      │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  envelope bytes ──► SHA-256 ──► hex ──► StorageObjectId (object key)   │
//! │  plaintext      ──► SHA-256 ──► hex ──► PlaintextHash  (metadata row)  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Hex-encoded SHA-256 of `data`
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn validate_digest_hex(value: &str) -> Result<()> {
    if value.len() != 64 || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidDigest(format!(
            "expected 64 hex characters, got {:?}",
            value
        )));
    }
    Ok(())
}

/// Content-addressed object name: SHA-256 hex of the serialized envelope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageObjectId(String);

impl StorageObjectId {
    /// Compute the id for serialized envelope bytes
    pub fn for_envelope(envelope_bytes: &[u8]) -> Self {
        Self(sha256_hex(envelope_bytes))
    }

    /// Parse an id received from elsewhere (e.g. a download request)
    pub fn parse(value: &str) -> Result<Self> {
        validate_digest_hex(value)?;
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Get the hex string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StorageObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 hex digest of an original plaintext
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaintextHash(String);

impl PlaintextHash {
    /// Parse a recorded digest
    pub fn parse(value: &str) -> Result<Self> {
        validate_digest_hex(value)?;
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Check `plaintext` against this digest
    pub fn matches(&self, plaintext: &[u8]) -> bool {
        hash_plaintext(plaintext) == *self
    }

    /// Get the hex string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PlaintextHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Digest an original plaintext for the metadata store
pub fn hash_plaintext(plaintext: &[u8]) -> PlaintextHash {
    PlaintextHash(sha256_hex(plaintext))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_answer() {
        assert_eq!(
            sha256_hex(b"test"),
            "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08"
        );
    }

    #[test]
    fn test_storage_id_deterministic() {
        let a = StorageObjectId::for_envelope(b"envelope");
        let b = StorageObjectId::for_envelope(b"envelope");
        let c = StorageObjectId::for_envelope(b"envelope!");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_storage_id_parse() {
        let id = StorageObjectId::for_envelope(b"x");
        let parsed = StorageObjectId::parse(&id.as_str().to_ascii_uppercase()).unwrap();
        assert_eq!(id, parsed);

        assert!(StorageObjectId::parse("abc").is_err());
        assert!(StorageObjectId::parse(&"g".repeat(64)).is_err());
    }

    #[test]
    fn test_plaintext_hash_matches() {
        let hash = hash_plaintext(b"test");

        assert!(hash.matches(b"test"));
        assert!(!hash.matches(b"tesT"));
        assert_eq!(PlaintextHash::parse(hash.as_str()).unwrap(), hash);
    }

    #[test]
    fn test_serde_is_plain_string() {
        let id = StorageObjectId::for_envelope(b"x");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
