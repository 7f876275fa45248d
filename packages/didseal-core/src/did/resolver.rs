//! # Key-Agreement Key Resolution
//!
//! Locates the X25519 key a sender should wrap a CEK for.
//!
//! ## Algorithm
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      FIRST USABLE X25519 KEY                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  for entry in document.keyAgreement (document order):                   │
//! │                                                                         │
//! │    embedded object ───────────────────────────┐                         │
//! │    "#frag"  ──► "<doc id>#frag" ──┐           │                         │
//! │    "did:..#frag" ─────────────────┴─► lookup ─┤   (missing ──► skip)    │
//! │                                               ▼                         │
//! │                              decode key material                        │
//! │                          (Jwk > Multibase > Base58 > Base64)            │
//! │                                               │   (error ──► skip)      │
//! │                                               ▼                         │
//! │                                 key type == X25519 ?                    │
//! │                                   │ yes           │ no ──► skip         │
//! │                                   ▼                                     │
//! │                        return base64(raw 32 bytes)                      │
//! │                                                                         │
//! │  exhausted ──► not found                                                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first survivor wins. There is no ranking between candidates.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;

use super::document::{DidDocument, KeyType};
use super::identifier::Did;
use crate::error::{Error, Result};

/// First usable X25519 key-agreement key in a parsed document
pub fn find_x25519_key(document: &DidDocument) -> Option<[u8; 32]> {
    document
        .key_agreement_methods()
        .find_map(|method| match method.public_key() {
            Ok((KeyType::X25519, key)) => Some(key),
            Ok((other, _)) => {
                tracing::trace!(id = method.id.as_str(), key_type = ?other, "Skipping non-X25519 key");
                None
            }
            Err(e) => {
                tracing::trace!(id = method.id.as_str(), error = %e, "Skipping undecodable key");
                None
            }
        })
}

/// Base64 of the first usable X25519 key-agreement key, if any
///
/// A value that is not a DID document at all yields `None`.
pub fn find_public_key_base64(document: &Value) -> Option<String> {
    let document = DidDocument::from_value(document)?;
    find_x25519_key(&document).map(|key| STANDARD.encode(key))
}

/// [`find_public_key_base64`] over JSON text
///
/// Unparseable text yields `None`.
pub fn find_public_key_base64_in_json(json: &str) -> Option<String> {
    let value: Value = serde_json::from_str(json).ok()?;
    find_public_key_base64(&value)
}

/// Resolve the recipient key for `did` from its resolved document
///
/// ## Errors
///
/// `KeyResolutionFailure` naming `did` if the document has no usable
/// X25519 key-agreement key.
pub fn resolve_x25519_key(did: &Did, document: &Value) -> Result<[u8; 32]> {
    let key = DidDocument::from_value(document)
        .as_ref()
        .and_then(find_x25519_key);

    match key {
        Some(key) => {
            tracing::debug!(did = did.as_str(), "Resolved X25519 key-agreement key");
            Ok(key)
        }
        None => {
            tracing::warn!(did = did.as_str(), "No usable X25519 key in DID document");
            Err(Error::KeyResolutionFailure {
                did: did.to_string(),
            })
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::did::multibase::encode_multikey;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    fn b58(fill: u8) -> String {
        bs58::encode([fill; 32]).into_string()
    }

    fn b64(fill: u8) -> String {
        STANDARD.encode([fill; 32])
    }

    #[test]
    fn test_reference_to_verification_method() {
        let document = json!({
            "id": "did:web:example.com",
            "verificationMethod": [{
                "id": "did:web:example.com#encryption",
                "type": "X25519KeyAgreementKey2019",
                "controller": "did:web:example.com",
                "publicKeyBase58": b58(1),
            }],
            "keyAgreement": ["did:web:example.com#encryption"],
        });

        assert_eq!(find_public_key_base64(&document), Some(b64(1)));
    }

    #[test]
    fn test_embedded_key_agreement() {
        let document = json!({
            "id": "did:peer:123",
            "keyAgreement": [{
                "id": "did:peer:123#key-1",
                "type": "X25519KeyAgreementKey2019",
                "controller": "did:peer:123",
                "publicKeyBase58": b58(2),
            }],
        });

        assert_eq!(find_public_key_base64(&document), Some(b64(2)));
    }

    #[test]
    fn test_json_web_key() {
        let document = json!({
            "id": "did:web:example.com",
            "verificationMethod": [{
                "id": "did:web:example.com#encryption",
                "type": "JsonWebKey2020",
                "controller": "did:web:example.com",
                "publicKeyJwk": {
                    "kty": "OKP",
                    "crv": "X25519",
                    "x": URL_SAFE_NO_PAD.encode([3u8; 32]),
                },
            }],
            "keyAgreement": ["did:web:example.com#encryption"],
        });

        assert_eq!(find_public_key_base64(&document), Some(b64(3)));
    }

    #[test]
    fn test_fragment_reference() {
        let method = json!({
            "id": "did:web:example.com#encryption",
            "type": "X25519KeyAgreementKey2019",
            "controller": "did:web:example.com",
            "publicKeyBase58": b58(4),
        });
        let with_fragment = json!({
            "id": "did:web:example.com",
            "verificationMethod": [method.clone()],
            "keyAgreement": ["#encryption"],
        });
        let with_url = json!({
            "id": "did:web:example.com",
            "verificationMethod": [method],
            "keyAgreement": ["did:web:example.com#encryption"],
        });

        assert_eq!(find_public_key_base64(&with_fragment), Some(b64(4)));
        assert_eq!(
            find_public_key_base64(&with_fragment),
            find_public_key_base64(&with_url)
        );
    }

    #[test]
    fn test_first_usable_x25519_wins() {
        let document = json!({
            "id": "did:web:example.com",
            "verificationMethod": [
                {
                    "id": "did:web:example.com#signing",
                    "type": "Multikey",
                    "controller": "did:web:example.com",
                    "publicKeyMultibase": encode_multikey(KeyType::Ed25519, &[5u8; 32]),
                },
                {
                    "id": "did:web:example.com#encryption",
                    "type": "Multikey",
                    "controller": "did:web:example.com",
                    "publicKeyMultibase": encode_multikey(KeyType::X25519, &[6u8; 32]),
                },
                {
                    "id": "did:web:example.com#encryption-2",
                    "type": "Multikey",
                    "controller": "did:web:example.com",
                    "publicKeyMultibase": encode_multikey(KeyType::X25519, &[10u8; 32]),
                },
            ],
            "keyAgreement": [
                "did:web:example.com#signing",
                "did:web:example.com#encryption",
                "did:web:example.com#encryption-2",
            ],
        });

        assert_eq!(find_public_key_base64(&document), Some(b64(6)));
    }

    #[test]
    fn test_missing_verification_method() {
        let document = json!({
            "id": "did:web:example.com",
            "keyAgreement": ["did:web:example.com#encryption"],
        });

        assert_eq!(find_public_key_base64(&document), None);
    }

    #[test]
    fn test_dangling_reference_is_skipped() {
        let document = json!({
            "id": "did:web:example.com",
            "verificationMethod": [{
                "id": "did:web:example.com#encryption",
                "type": "X25519KeyAgreementKey2020",
                "publicKeyBase58": b58(11),
            }],
            "keyAgreement": ["#gone", "#encryption"],
        });

        assert_eq!(find_public_key_base64(&document), Some(b64(11)));
    }

    #[test]
    fn test_ignores_non_x25519() {
        let document = json!({
            "id": "did:web:example.com",
            "verificationMethod": [{
                "id": "did:web:example.com#encryption",
                "type": "Ed25519VerificationKey2020",
                "controller": "did:web:example.com",
                "publicKeyBase64": "CCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCCC=",
            }],
            "keyAgreement": ["did:web:example.com#encryption"],
        });

        assert_eq!(find_public_key_base64(&document), None);
    }

    #[test]
    fn test_multikey_x25519() {
        let document = json!({
            "id": "did:web:example.com",
            "verificationMethod": [{
                "id": "did:web:example.com#encryption",
                "type": "Multikey",
                "controller": "did:web:example.com",
                "publicKeyMultibase": encode_multikey(KeyType::X25519, &[7u8; 32]),
            }],
            "keyAgreement": ["did:web:example.com#encryption"],
        });

        assert_eq!(find_public_key_base64(&document), Some(b64(7)));
    }

    #[test]
    fn test_mixed_signing_and_agreement_keys() {
        // The agreement key is listed after the signing key.
        let document = json!({
            "id": "did:web:example.com",
            "verificationMethod": [
                {
                    "id": "did:web:example.com#owner",
                    "type": "Multikey",
                    "controller": "did:web:example.com",
                    "publicKeyMultibase": encode_multikey(KeyType::Ed25519, &[8u8; 32]),
                },
                {
                    "id": "did:web:example.com#encryption",
                    "type": "Multikey",
                    "controller": "did:web:example.com",
                    "publicKeyMultibase": encode_multikey(KeyType::X25519, &[9u8; 32]),
                },
            ],
            "keyAgreement": ["did:web:example.com#encryption"],
        });

        assert_eq!(find_public_key_base64(&document), Some(b64(9)));
    }

    #[test]
    fn test_only_ed25519_keys() {
        let document = json!({
            "id": "did:web:example.com",
            "verificationMethod": [{
                "id": "did:web:example.com#owner",
                "type": "Multikey",
                "publicKeyMultibase": encode_multikey(KeyType::Ed25519, &[12u8; 32]),
            }],
            "keyAgreement": ["#owner"],
        });

        assert_eq!(find_public_key_base64(&document), None);
    }

    #[test]
    fn test_undecodable_entry_is_skipped() {
        let document = json!({
            "id": "did:web:example.com",
            "keyAgreement": [
                {
                    "id": "#bad",
                    "type": "X25519KeyAgreementKey2019",
                    "publicKeyBase58": "0OIl",
                },
                {
                    "id": "#short",
                    "type": "X25519KeyAgreementKey2019",
                    "publicKeyBase58": bs58::encode([1u8; 16]).into_string(),
                },
                {
                    "id": "#good",
                    "type": "X25519KeyAgreementKey2019",
                    "publicKeyBase58": b58(13),
                },
            ],
        });

        assert_eq!(find_public_key_base64(&document), Some(b64(13)));
    }

    #[test]
    fn test_malformed_documents_are_not_found() {
        assert_eq!(find_public_key_base64(&json!(null)), None);
        assert_eq!(find_public_key_base64(&json!("did:web:example.com")), None);
        assert_eq!(find_public_key_base64(&json!({"keyAgreement": "oops"})), None);
        assert_eq!(find_public_key_base64(&json!({"id": "did:web:example.com"})), None);
        assert_eq!(find_public_key_base64_in_json("{\"id\": "), None);
    }

    #[test]
    fn test_resolve_names_the_did() {
        let did = Did::parse("did:web:nokeys.example").unwrap();
        let document = json!({"id": "did:web:nokeys.example", "keyAgreement": []});

        match resolve_x25519_key(&did, &document) {
            Err(Error::KeyResolutionFailure { did: named }) => {
                assert_eq!(named, "did:web:nokeys.example")
            }
            other => panic!("expected KeyResolutionFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_returns_raw_key() {
        let did = Did::parse("did:peer:123").unwrap();
        let document = json!({
            "id": "did:peer:123",
            "keyAgreement": [{
                "id": "#key-1",
                "type": "X25519KeyAgreementKey2019",
                "publicKeyBase58": b58(14),
            }],
        });

        assert_eq!(resolve_x25519_key(&did, &document).unwrap(), [14u8; 32]);
    }
}
