//! # Envelope Codec
//!
//! The durable, transportable container for one encrypted file.
//!
//! ## Wire Format
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CANONICAL ENVELOPE (CBOR)                          │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  map(4) {                                                               │
//! │    "algorithm"  : text   "aes-256-gcm"                                 │
//! │    "iv"         : bytes  12                                            │
//! │    "tag"        : bytes  16                                            │
//! │    "ciphertext" : bytes  N                                             │
//! │  }                                                                      │
//! │                                                                         │
//! │  Keys are written in exactly this order with definite lengths, so the  │
//! │  same fields always produce the same bytes (and the same storage id).  │
//! │                                                                         │
//! │  Transport: base64 (standard alphabet, padded) of the whole record.    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Legacy Format (decode only)
//!
//! ```text
//! ┌──────────┬──────────┬──────────┬─────────────────────┐
//! │  "VERI"  │  IV (12) │ Tag (16) │  Ciphertext (N)     │
//! └──────────┴──────────┴──────────┴─────────────────────┘
//! ```
//!
//! A canonical envelope always starts with `0xA4` (a 4-entry CBOR map), so
//! the two layouts cannot be confused.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use ciborium::value::Value;

use crate::config::EncryptionConfig;
use crate::crypto::{SealedContent, StorageObjectId, IV_SIZE, TAG_SIZE};
use crate::error::{Error, Result};

/// Magic prefix of the legacy concatenated layout
pub const LEGACY_MAGIC: &[u8; 4] = b"VERI";

/// Upper bound on the bytes a canonical envelope adds around its ciphertext
///
/// Fixed fields take 71 bytes; the ciphertext byte-string header takes 1 to
/// 9 more depending on its length.
pub const ENVELOPE_OVERHEAD_MAX: usize = 80;

const FIELD_ALGORITHM: &str = "algorithm";
const FIELD_IV: &str = "iv";
const FIELD_TAG: &str = "tag";
const FIELD_CIPHERTEXT: &str = "ciphertext";

/// Content encryption algorithm named in an envelope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// AES-256-GCM, 96-bit IV, 128-bit tag
    #[default]
    Aes256Gcm,
}

impl Algorithm {
    /// Identifier written into the envelope
    pub const fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Aes256Gcm => "aes-256-gcm",
        }
    }

    /// Parse an envelope algorithm identifier
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "aes-256-gcm" => Ok(Algorithm::Aes256Gcm),
            other => Err(Error::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A decoded envelope
#[derive(Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Content cipher
    pub algorithm: Algorithm,
    /// Nonce used for this envelope
    pub iv: [u8; IV_SIZE],
    /// Authentication tag
    pub tag: [u8; TAG_SIZE],
    /// Encrypted content
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("algorithm", &self.algorithm)
            .field("iv", &hex::encode(self.iv))
            .field("tag", &hex::encode(self.tag))
            .field("ciphertext_len", &self.ciphertext.len())
            .finish()
    }
}

impl Envelope {
    /// Package the output of a content encryption
    pub fn new(algorithm: Algorithm, sealed: SealedContent) -> Self {
        Self {
            algorithm,
            iv: sealed.iv,
            tag: sealed.tag,
            ciphertext: sealed.ciphertext,
        }
    }

    /// Serialize to canonical bytes
    ///
    /// Copies the ciphertext; [`Envelope::into_bytes`] moves it instead.
    pub fn encode(&self) -> Result<Vec<u8>> {
        self.clone().into_bytes()
    }

    /// Serialize to canonical bytes, consuming the envelope
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        let capacity = self.ciphertext.len() + ENVELOPE_OVERHEAD_MAX;
        let value = Value::Map(vec![
            (
                Value::Text(FIELD_ALGORITHM.into()),
                Value::Text(self.algorithm.as_str().into()),
            ),
            (Value::Text(FIELD_IV.into()), Value::Bytes(self.iv.to_vec())),
            (Value::Text(FIELD_TAG.into()), Value::Bytes(self.tag.to_vec())),
            (
                Value::Text(FIELD_CIPHERTEXT.into()),
                Value::Bytes(self.ciphertext),
            ),
        ]);

        let mut out = Vec::with_capacity(capacity);
        ciborium::ser::into_writer(&value, &mut out)
            .map_err(|e| Error::SerializationError(format!("envelope CBOR: {}", e)))?;
        Ok(out)
    }

    /// Parse canonical bytes
    ///
    /// ## Errors
    ///
    /// - `MalformedEnvelope` for bad structure, missing fields, wrong field
    ///   types or lengths, or trailing bytes
    /// - `UnsupportedAlgorithm` if the algorithm is not recognized
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut reader = bytes;
        let value: Value = ciborium::de::from_reader(&mut reader)
            .map_err(|e| Error::MalformedEnvelope(format!("not a CBOR record: {}", e)))?;
        if !reader.is_empty() {
            return Err(Error::MalformedEnvelope(format!(
                "{} trailing bytes after record",
                reader.len()
            )));
        }

        let entries = match value {
            Value::Map(entries) => entries,
            _ => return Err(Error::MalformedEnvelope("record is not a map".into())),
        };

        let mut algorithm = None;
        let mut iv = None;
        let mut tag = None;
        let mut ciphertext = None;

        for (key, value) in entries {
            let key = match key {
                Value::Text(key) => key,
                _ => return Err(Error::MalformedEnvelope("non-text field name".into())),
            };
            let slot = match key.as_str() {
                FIELD_ALGORITHM => &mut algorithm,
                FIELD_IV => &mut iv,
                FIELD_TAG => &mut tag,
                FIELD_CIPHERTEXT => &mut ciphertext,
                // Unknown fields are skipped
                _ => continue,
            };
            if slot.replace(value).is_some() {
                return Err(Error::MalformedEnvelope(format!("duplicate field {:?}", key)));
            }
        }

        let algorithm = match algorithm {
            Some(Value::Text(name)) => Algorithm::parse(&name)?,
            Some(_) => return Err(Error::MalformedEnvelope("algorithm is not text".into())),
            None => return Err(Error::MalformedEnvelope("missing algorithm".into())),
        };

        Ok(Self {
            algorithm,
            iv: fixed_bytes(iv, FIELD_IV)?,
            tag: fixed_bytes(tag, FIELD_TAG)?,
            ciphertext: bytes_field(ciphertext, FIELD_CIPHERTEXT)?,
        })
    }

    /// Parse the legacy `VERI || iv || tag || ciphertext` layout
    pub fn decode_legacy(bytes: &[u8]) -> Result<Self> {
        let body = bytes
            .strip_prefix(LEGACY_MAGIC.as_slice())
            .ok_or_else(|| Error::MalformedEnvelope("missing legacy magic header".into()))?;

        if body.len() < IV_SIZE + TAG_SIZE {
            return Err(Error::MalformedEnvelope(format!(
                "legacy envelope too short: {} bytes",
                bytes.len()
            )));
        }

        let (iv, rest) = body.split_at(IV_SIZE);
        let (tag, ciphertext) = rest.split_at(TAG_SIZE);

        let mut iv_bytes = [0u8; IV_SIZE];
        iv_bytes.copy_from_slice(iv);
        let mut tag_bytes = [0u8; TAG_SIZE];
        tag_bytes.copy_from_slice(tag);

        Ok(Self {
            algorithm: Algorithm::Aes256Gcm,
            iv: iv_bytes,
            tag: tag_bytes,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Parse either layout, as allowed by `config`
    pub fn decode_with(config: &EncryptionConfig, bytes: &[u8]) -> Result<Self> {
        if bytes.starts_with(LEGACY_MAGIC) {
            if config.accept_legacy_envelopes {
                tracing::debug!("Decoding legacy envelope");
                return Self::decode_legacy(bytes);
            }
            return Err(Error::MalformedEnvelope(
                "legacy envelope format is not accepted".into(),
            ));
        }
        Self::decode(bytes)
    }

    /// Serialize and base64-encode for JSON/HTTP transport
    pub fn to_base64(&self) -> Result<String> {
        Ok(STANDARD.encode(self.encode()?))
    }

    /// Decode the base64 transport form
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| Error::MalformedEnvelope(format!("invalid base64: {}", e)))?;
        Self::decode(&bytes)
    }
}

/// Content-addressed id of serialized envelope bytes
pub fn id_for(envelope_bytes: &[u8]) -> StorageObjectId {
    StorageObjectId::for_envelope(envelope_bytes)
}

fn bytes_field(value: Option<Value>, name: &str) -> Result<Vec<u8>> {
    match value {
        Some(Value::Bytes(bytes)) => Ok(bytes),
        Some(_) => Err(Error::MalformedEnvelope(format!("{} is not a byte string", name))),
        None => Err(Error::MalformedEnvelope(format!("missing {}", name))),
    }
}

fn fixed_bytes<const N: usize>(value: Option<Value>, name: &str) -> Result<[u8; N]> {
    let bytes = bytes_field(value, name)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        Error::MalformedEnvelope(format!("{} must be {} bytes, got {}", name, N, len))
    })
}

// ============================================================================
// TESTS
// ============================================================================
