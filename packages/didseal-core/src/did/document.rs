//! # DID Documents
//!
//! A lenient model of the parts of a DID document needed for key agreement.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      VERIFICATION METHOD KEY MATERIAL                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Field                 Variant      Key type taken from                 │
//! │  ────────────────────  ───────────  ─────────────────────────────────   │
//! │  publicKeyJwk          Jwk          "crv" (X25519 / Ed25519)            │
//! │  publicKeyMultibase    Multibase    multicodec prefix (0xec / 0xed)     │
//! │  publicKeyBase58       Base58       method "type"                       │
//! │  publicKeyBase64       Base64       method "type"                       │
//! │                                                                         │
//! │  When a method carries several fields, the first row present wins.     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Documents arrive from a remote resolver in loosely specified shapes, so
//! parsing never fails as a whole. Entries that cannot be understood are
//! dropped individually and the rest of the document stays usable.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::multibase::decode_multikey;
use crate::error::{Error, Result};

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

/// Standard base64, padding optional
const BASE64_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);

/// base64url, padding optional
const BASE64URL_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

/// Curve of a public key found in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    /// X25519 key agreement key
    X25519,
    /// Ed25519 signing key
    Ed25519,
}

impl KeyType {
    /// Infer the key type from a verification method `type`
    pub fn from_method_type(method_type: &str) -> Option<Self> {
        match method_type {
            "X25519KeyAgreementKey2019" | "X25519KeyAgreementKey2020" => Some(KeyType::X25519),
            "Ed25519VerificationKey2018" | "Ed25519VerificationKey2020" => Some(KeyType::Ed25519),
            _ => None,
        }
    }

    /// Infer the key type from a JWK `crv`
    pub fn from_jwk_curve(crv: &str) -> Option<Self> {
        match crv {
            "X25519" => Some(KeyType::X25519),
            "Ed25519" => Some(KeyType::Ed25519),
            _ => None,
        }
    }
}

/// An OKP public JWK
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    /// Key type, `OKP` for the curves handled here
    pub kty: String,
    /// Curve name
    pub crv: String,
    /// base64url public key bytes
    pub x: String,
}

/// Encoded public key carried by a verification method
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeyMaterial {
    /// `publicKeyJwk`
    Jwk(Jwk),
    /// `publicKeyMultibase`
    Multibase(String),
    /// `publicKeyBase58`
    Base58(String),
    /// `publicKeyBase64`
    Base64(String),
}

impl PublicKeyMaterial {
    /// Decode to a key type and raw bytes
    ///
    /// `method_type` is consulted only for the encodings that do not carry
    /// their own type.
    pub fn decode(&self, method_type: &str) -> Result<(KeyType, [u8; 32])> {
        match self {
            PublicKeyMaterial::Jwk(jwk) => {
                if jwk.kty != "OKP" {
                    return Err(Error::InvalidKey(format!("unsupported JWK kty '{}'", jwk.kty)));
                }
                let key_type = KeyType::from_jwk_curve(&jwk.crv).ok_or_else(|| {
                    Error::InvalidKey(format!("unsupported JWK crv '{}'", jwk.crv))
                })?;
                let bytes = BASE64URL_LENIENT
                    .decode(&jwk.x)
                    .map_err(|e| Error::InvalidKey(format!("JWK x is not base64url: {}", e)))?;
                Ok((key_type, raw_key(bytes)?))
            }
            PublicKeyMaterial::Multibase(value) => decode_multikey(value),
            PublicKeyMaterial::Base58(value) => {
                let key_type = typed(method_type)?;
                let bytes = bs58::decode(value)
                    .into_vec()
                    .map_err(|e| Error::InvalidKey(format!("Invalid base58 encoding: {}", e)))?;
                Ok((key_type, raw_key(bytes)?))
            }
            PublicKeyMaterial::Base64(value) => {
                let key_type = typed(method_type)?;
                let bytes = BASE64_LENIENT
                    .decode(value)
                    .map_err(|e| Error::InvalidKey(format!("Invalid base64 encoding: {}", e)))?;
                Ok((key_type, raw_key(bytes)?))
            }
        }
    }
}

fn typed(method_type: &str) -> Result<KeyType> {
    KeyType::from_method_type(method_type).ok_or_else(|| {
        Error::InvalidKey(format!("unknown verification method type '{}'", method_type))
    })
}

fn raw_key(bytes: Vec<u8>) -> Result<[u8; 32]> {
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| Error::InvalidKey(format!("expected a 32-byte key, got {} bytes", len)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerificationMethod {
    id: String,
    #[serde(rename = "type", default)]
    method_type: String,
    #[serde(default)]
    controller: Option<String>,
    #[serde(default)]
    public_key_jwk: Option<Jwk>,
    #[serde(default)]
    public_key_multibase: Option<String>,
    #[serde(default)]
    public_key_base58: Option<String>,
    #[serde(default)]
    public_key_base64: Option<String>,
}

/// A verification method with exactly one selected key encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationMethod {
    /// Method id, absolute or fragment-only
    pub id: String,
    /// Method `type` (e.g. `Multikey`, `X25519KeyAgreementKey2019`)
    pub method_type: String,
    /// Controller DID, if given
    pub controller: Option<String>,
    /// Key material
    pub material: PublicKeyMaterial,
}

impl<'de> Deserialize<'de> for VerificationMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawVerificationMethod::deserialize(deserializer)?;
        Self::from_raw(raw).map_err(serde::de::Error::custom)
    }
}

impl VerificationMethod {
    fn from_raw(raw: RawVerificationMethod) -> Result<Self> {
        let material = if let Some(jwk) = raw.public_key_jwk {
            PublicKeyMaterial::Jwk(jwk)
        } else if let Some(value) = raw.public_key_multibase {
            PublicKeyMaterial::Multibase(value)
        } else if let Some(value) = raw.public_key_base58 {
            PublicKeyMaterial::Base58(value)
        } else if let Some(value) = raw.public_key_base64 {
            PublicKeyMaterial::Base64(value)
        } else {
            return Err(Error::InvalidKey(format!(
                "verification method '{}' has no public key",
                raw.id
            )));
        };

        Ok(Self {
            id: raw.id,
            method_type: raw.method_type,
            controller: raw.controller,
            material,
        })
    }

    /// Parse one method from JSON
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self::deserialize(value)?)
    }

    /// Decode this method's public key
    pub fn public_key(&self) -> Result<(KeyType, [u8; 32])> {
        self.material.decode(&self.method_type)
    }
}

/// One `keyAgreement` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAgreementEntry {
    /// A DID URL or `#fragment` pointing at a method
    Reference(String),
    /// A method embedded in place
    Embedded(VerificationMethod),
}

/// The key-agreement view of a DID document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DidDocument {
    /// Document id (the DID), used to absolutize fragment references
    pub id: Option<String>,
    /// `keyAgreement` entries in document order
    pub key_agreement: Vec<KeyAgreementEntry>,
    /// `verificationMethod` entries in document order
    pub verification_method: Vec<VerificationMethod>,
}

impl DidDocument {
    /// Build from a JSON value
    ///
    /// Returns `None` only when the value is not a JSON object. Individual
    /// entries that cannot be parsed are dropped.
    pub fn from_value(document: &Value) -> Option<Self> {
        let object = document.as_object()?;

        let id = object.get("id").and_then(Value::as_str).map(str::to_string);

        let key_agreement = entries(object.get("keyAgreement"))
            .filter_map(|entry| match entry {
                Value::String(reference) => Some(KeyAgreementEntry::Reference(reference.clone())),
                other => parse_method(other).map(KeyAgreementEntry::Embedded),
            })
            .collect();

        let verification_method = entries(object.get("verificationMethod"))
            .filter_map(parse_method)
            .collect();

        Some(Self {
            id,
            key_agreement,
            verification_method,
        })
    }

    /// Parse from JSON text, `None` if it is not a JSON object
    pub fn from_json(json: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(json).ok()?;
        Self::from_value(&value)
    }

    /// Turn a `#fragment` reference into `<document id>#fragment`
    pub fn absolutize(&self, reference: &str) -> String {
        match (reference.starts_with('#'), &self.id) {
            (true, Some(id)) => format!("{}{}", id, reference),
            _ => reference.to_string(),
        }
    }

    /// Find the method a reference points at
    ///
    /// Methods embedded in `keyAgreement` are searched first, then
    /// `verificationMethod`. Ids are compared in absolute form, so a
    /// fragment-only reference matches a full DID URL id and vice versa.
    pub fn dereference(&self, reference: &str) -> Option<&VerificationMethod> {
        let target = self.absolutize(reference);

        let embedded = self.key_agreement.iter().filter_map(|entry| match entry {
            KeyAgreementEntry::Embedded(method) => Some(method),
            KeyAgreementEntry::Reference(_) => None,
        });

        embedded
            .chain(self.verification_method.iter())
            .find(|method| self.absolutize(&method.id) == target)
    }

    /// Key-agreement methods in document order, references resolved
    ///
    /// References with no matching method are skipped.
    pub fn key_agreement_methods(&self) -> impl Iterator<Item = &VerificationMethod> + '_ {
        self.key_agreement.iter().filter_map(move |entry| match entry {
            KeyAgreementEntry::Embedded(method) => Some(method),
            KeyAgreementEntry::Reference(reference) => {
                let method = self.dereference(reference);
                if method.is_none() {
                    tracing::trace!(reference = reference.as_str(), "keyAgreement reference not found");
                }
                method
            }
        })
    }
}

fn entries(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .map(|list| list.iter())
        .into_iter()
        .flatten()
}

fn parse_method(value: &Value) -> Option<VerificationMethod> {
    match VerificationMethod::from_value(value) {
        Ok(method) => Some(method),
        Err(e) => {
            tracing::trace!(error = %e, "Skipping unparseable verification method");
            None
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_material_priority() {
        let method = VerificationMethod::from_value(&json!({
            "id": "did:web:example.com#k",
            "type": "X25519KeyAgreementKey2019",
            "publicKeyBase64": "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=",
            "publicKeyBase58": bs58::encode([2u8; 32]).into_string(),
        }))
        .unwrap();

        assert!(matches!(method.material, PublicKeyMaterial::Base58(_)));
        assert_eq!(method.public_key().unwrap(), (KeyType::X25519, [2u8; 32]));
    }

    #[test]
    fn test_method_without_material_is_rejected() {
        let result = VerificationMethod::from_value(&json!({
            "id": "did:web:example.com#k",
            "type": "Multikey",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_base64_with_and_without_padding() {
        for encoded in [
            "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE=",
            "AQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQE",
        ] {
            let material = PublicKeyMaterial::Base64(encoded.to_string());
            let (key_type, key) = material.decode("X25519KeyAgreementKey2020").unwrap();
            assert_eq!(key_type, KeyType::X25519);
            assert_eq!(key, [1u8; 32]);
        }
    }

    #[test]
    fn test_type_inference() {
        let material = PublicKeyMaterial::Base58(bs58::encode([3u8; 32]).into_string());

        assert_eq!(
            material.decode("Ed25519VerificationKey2018").unwrap().0,
            KeyType::Ed25519
        );
        assert!(material.decode("JsonWebKey2020").is_err());
        assert!(material.decode("").is_err());
    }

    #[test]
    fn test_jwk_requires_okp() {
        let jwk = |kty: &str, crv: &str| {
            PublicKeyMaterial::Jwk(Jwk {
                kty: kty.into(),
                crv: crv.into(),
                x: BASE64URL_LENIENT.encode([4u8; 32]),
            })
        };

        assert_eq!(jwk("OKP", "X25519").decode("").unwrap().0, KeyType::X25519);
        assert!(jwk("EC", "X25519").decode("").is_err());
        assert!(jwk("OKP", "P-256").decode("").is_err());
    }

    #[test]
    fn test_from_value_is_lenient() {
        let document = DidDocument::from_value(&json!({
            "id": "did:web:example.com",
            "keyAgreement": ["#a", 42, {"id": "#b"}],
            "verificationMethod": "not a list",
        }))
        .unwrap();

        assert_eq!(document.key_agreement.len(), 1);
        assert!(document.verification_method.is_empty());

        assert!(DidDocument::from_value(&json!([1, 2, 3])).is_none());
        assert!(DidDocument::from_json("{not json").is_none());
    }

    #[test]
    fn test_dereference_normalizes_ids() {
        let document = DidDocument::from_value(&json!({
            "id": "did:web:example.com",
            "verificationMethod": [{
                "id": "#enc",
                "type": "X25519KeyAgreementKey2019",
                "publicKeyBase58": bs58::encode([5u8; 32]).into_string(),
            }],
        }))
        .unwrap();

        assert!(document.dereference("#enc").is_some());
        assert!(document.dereference("did:web:example.com#enc").is_some());
        assert!(document.dereference("did:web:other.com#enc").is_none());
    }
}
