//! DID identifiers
//!
//! ```text
//! ┌─────────┬─────────┬───────────────────────────────────────────┐
//! │ Scheme  │ Method  │           Method-specific ID              │
//! ├─────────┼─────────┼───────────────────────────────────────────┤
//! │  did    │   web   │  example.com                              │
//! │  did    │   key   │  z6LSbysY2xFMRpGMhb7tFTLMpeuPRaqa...      │
//! │  did    │   peer  │  2.Ez6LS...                               │
//! └─────────┴─────────┴───────────────────────────────────────────┘
//! ```
//!
//! Any method is accepted. Only the shape is validated here; whether the
//! DID resolves is up to the remote resolver.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The DID URI scheme prefix
pub const DID_PREFIX: &str = "did:";

/// A Decentralized Identifier of any method
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    /// The full DID string (e.g., "did:web:example.com")
    value: String,
    /// Byte offset of the ':' between method and method-specific id
    method_end: usize,
}

impl Did {
    /// Parse a DID string
    ///
    /// ## Validation
    ///
    /// - Must start with "did:"
    /// - Method must be non-empty lowercase ASCII letters or digits
    /// - Method-specific id must be non-empty, and must not contain
    ///   whitespace or DID URL delimiters (`/`, `?`, `#`)
    pub fn parse(did_string: &str) -> Result<Self> {
        let rest = did_string.strip_prefix(DID_PREFIX).ok_or_else(|| {
            Error::InvalidDid(format!(
                "DID must start with '{}', got '{}'",
                DID_PREFIX, did_string
            ))
        })?;

        let (method, id) = rest
            .split_once(':')
            .ok_or_else(|| Error::InvalidDid(format!("missing method-specific id in '{}'", did_string)))?;

        if method.is_empty()
            || !method
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(Error::InvalidDid(format!("invalid DID method '{}'", method)));
        }

        if id.is_empty()
            || id
                .chars()
                .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#'))
        {
            return Err(Error::InvalidDid(format!(
                "invalid method-specific id '{}'",
                id
            )));
        }

        Ok(Self {
            value: did_string.to_string(),
            method_end: DID_PREFIX.len() + method.len(),
        })
    }

    /// The DID method (e.g. `web`, `key`)
    pub fn method(&self) -> &str {
        &self.value[DID_PREFIX.len()..self.method_end]
    }

    /// Everything after `did:<method>:`
    pub fn method_specific_id(&self) -> &str {
        &self.value[self.method_end + 1..]
    }

    /// Get the full DID string
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::str::FromStr for Did {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.value
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_web() {
        let did = Did::parse("did:web:example.com").unwrap();
        assert_eq!(did.method(), "web");
        assert_eq!(did.method_specific_id(), "example.com");
        assert_eq!(did.to_string(), "did:web:example.com");
    }

    #[test]
    fn test_parse_keeps_inner_colons() {
        let did = Did::parse("did:web:example.com:users:alice").unwrap();
        assert_eq!(did.method(), "web");
        assert_eq!(did.method_specific_id(), "example.com:users:alice");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Did::parse("").is_err());
        assert!(Did::parse("did:").is_err());
        assert!(Did::parse("did:web").is_err());
        assert!(Did::parse("did:web:").is_err());
        assert!(Did::parse("did:Web:example.com").is_err());
        assert!(Did::parse("web:example.com").is_err());
        assert!(Did::parse("did:web:example.com#key-1").is_err());
        assert!(Did::parse("did:web:exa mple.com").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let did: Did = serde_json::from_str("\"did:peer:123\"").unwrap();
        assert_eq!(did.method(), "peer");
        assert_eq!(serde_json::to_string(&did).unwrap(), "\"did:peer:123\"");

        assert!(serde_json::from_str::<Did>("\"not-a-did\"").is_err());
    }
}
