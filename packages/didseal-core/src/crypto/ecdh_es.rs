//! # Key Wrapping (ECDH-ES)
//!
//! Binds a CEK to one recipient X25519 public key as a compact JWE using
//! `alg = ECDH-ES` (direct key agreement) and `enc = A256GCM`.
//!
//! ## Wrap Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          ECDH-ES WRAP                                   │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  1. Ephemeral X25519 keypair (fresh per wrap)                          │
//! │                                                                         │
//! │  2. Z = X25519(ephemeral_secret, recipient_public)                      │
//! │     ephemeral_secret is dropped (zeroized) right after                 │
//! │                                                                         │
//! │  3. KEK = ConcatKDF-SHA256(                                            │
//! │       Z,                                                               │
//! │       AlgorithmID = "A256GCM",                                        │
//! │       PartyUInfo  = "",                                               │
//! │       PartyVInfo  = "",                                               │
//! │       keydatalen  = 256                                               │
//! │     )                                                                  │
//! │                                                                         │
//! │  4. header = b64url({"enc":"A256GCM","alg":"ECDH-ES","epk":{...}})      │
//! │                                                                         │
//! │  5. (ct, tag) = AES-256-GCM(KEK, nonce, CEK, aad = header)             │
//! │                                                                         │
//! │  Output: header . "" . b64url(nonce) . b64url(ct) . b64url(tag)         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no unwrap here. Only the recipient's wallet, holding the
//! long-term private key, can recover the CEK.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce as AesNonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::cek::{ContentEncryptionKey, CEK_SIZE};
use super::cipher::{IV_SIZE, TAG_SIZE};
use crate::error::{Error, Result};

/// JWE `alg` value for direct ECDH-ES key agreement
pub const ALG_ECDH_ES: &str = "ECDH-ES";

/// JWE `enc` value, also the Concat KDF AlgorithmID
pub const ENC_A256GCM: &str = "A256GCM";

/// Size of an X25519 public key in bytes
pub const X25519_KEY_SIZE: usize = 32;

const KEY_DATA_LEN_BITS: u32 = 256;

/// Ephemeral public key as carried in the protected header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EphemeralJwk {
    /// Curve name, always `X25519`
    pub crv: String,
    /// Key type, always `OKP`
    pub kty: String,
    /// base64url public key bytes
    pub x: String,
}

/// JWE protected header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    /// Content encryption algorithm
    pub enc: String,
    /// Key management algorithm
    pub alg: String,
    /// Ephemeral public key
    pub epk: EphemeralJwk,
}

impl ProtectedHeader {
    fn for_ephemeral(public: &[u8; X25519_KEY_SIZE]) -> Self {
        Self {
            enc: ENC_A256GCM.to_string(),
            alg: ALG_ECDH_ES.to_string(),
            epk: EphemeralJwk {
                crv: "X25519".to_string(),
                kty: "OKP".to_string(),
                x: URL_SAFE_NO_PAD.encode(public),
            },
        }
    }

    /// Decode the ephemeral public key bytes
    pub fn ephemeral_public_key(&self) -> Result<[u8; X25519_KEY_SIZE]> {
        let bytes = URL_SAFE_NO_PAD
            .decode(self.epk.x.trim_end_matches('='))
            .map_err(|e| Error::InvalidWrappedKey(format!("epk.x is not base64url: {}", e)))?;
        bytes.try_into().map_err(|_| {
            Error::InvalidWrappedKey("epk.x must decode to 32 bytes".into())
        })
    }
}

/// A KEK derived from an ECDH shared secret
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct WrappingKey([u8; 32]);

impl WrappingKey {
    /// Get the raw key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// Concat KDF (NIST SP 800-56A single-step, SHA-256) as profiled for JWA
/// ECDH-ES
///
/// ```text
/// KEK = SHA-256( 0x00000001 || Z
///              || len32(alg_id) || alg_id
///              || len32(apu)    || apu
///              || len32(apv)    || apv
///              || 0x00000100 )
/// ```
///
/// Only a 256-bit output is needed, which is a single hash round.
pub fn concat_kdf(z: &[u8], alg_id: &str, apu: &[u8], apv: &[u8]) -> Result<WrappingKey> {
    let field_len = |field: &[u8]| -> Result<[u8; 4]> {
        u32::try_from(field.len())
            .map(u32::to_be_bytes)
            .map_err(|_| Error::KeyDerivationFailed("Concat KDF field too long".into()))
    };

    let mut hasher = Sha256::new();
    hasher.update(1u32.to_be_bytes());
    hasher.update(z);
    hasher.update(field_len(alg_id.as_bytes())?);
    hasher.update(alg_id.as_bytes());
    hasher.update(field_len(apu)?);
    hasher.update(apu);
    hasher.update(field_len(apv)?);
    hasher.update(apv);
    hasher.update(KEY_DATA_LEN_BITS.to_be_bytes());

    let mut key = [0u8; 32];
    key.copy_from_slice(&hasher.finalize());
    Ok(WrappingKey(key))
}

/// A CEK wrapped for one recipient, in compact JWE serialization
#[derive(Clone, PartialEq, Eq)]
pub struct WrappedKey {
    token: String,
    header: ProtectedHeader,
    iv: [u8; IV_SIZE],
    ciphertext: [u8; CEK_SIZE],
    tag: [u8; TAG_SIZE],
}

impl WrappedKey {
    /// Parse and validate a compact token
    ///
    /// Checks shape and header only. Nothing is decrypted.
    pub fn parse(token: &str) -> Result<Self> {
        let segments: Vec<&str> = token.trim().split('.').collect();
        if segments.len() != 5 {
            return Err(Error::InvalidWrappedKey(format!(
                "expected 5 segments, got {}",
                segments.len()
            )));
        }
        if !segments[1].is_empty() {
            return Err(Error::InvalidWrappedKey(
                "encrypted key segment must be empty for ECDH-ES".into(),
            ));
        }

        let header_json = decode_segment(segments[0], "header")?;
        let header: ProtectedHeader = serde_json::from_slice(&header_json)
            .map_err(|e| Error::InvalidWrappedKey(format!("header: {}", e)))?;

        if header.alg != ALG_ECDH_ES || header.enc != ENC_A256GCM {
            return Err(Error::InvalidWrappedKey(format!(
                "unsupported alg/enc {}/{}",
                header.alg, header.enc
            )));
        }
        if header.epk.kty != "OKP" || header.epk.crv != "X25519" {
            return Err(Error::InvalidWrappedKey(format!(
                "unsupported epk {}/{}",
                header.epk.kty, header.epk.crv
            )));
        }
        header.ephemeral_public_key()?;

        Ok(Self {
            token: token.trim().to_string(),
            header,
            iv: fixed_segment(segments[2], "nonce")?,
            ciphertext: fixed_segment(segments[3], "ciphertext")?,
            tag: fixed_segment(segments[4], "tag")?,
        })
    }

    /// The compact serialization
    pub fn as_str(&self) -> &str {
        &self.token
    }

    /// Decoded protected header
    pub fn header(&self) -> &ProtectedHeader {
        &self.header
    }

    /// The protected header segment exactly as transmitted (the AAD)
    pub fn protected_segment(&self) -> &str {
        self.token.split('.').next().unwrap_or_default()
    }

    /// AES-GCM nonce
    pub fn iv(&self) -> &[u8; IV_SIZE] {
        &self.iv
    }

    /// Encrypted CEK
    pub fn ciphertext(&self) -> &[u8; CEK_SIZE] {
        &self.ciphertext
    }

    /// AES-GCM tag
    pub fn tag(&self) -> &[u8; TAG_SIZE] {
        &self.tag
    }
}

impl std::fmt::Display for WrappedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.token)
    }
}

impl Serialize for WrappedKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.token)
    }
}

impl<'de> Deserialize<'de> for WrappedKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        Self::parse(&token).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Debug for WrappedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WrappedKey")
            .field("alg", &self.header.alg)
            .field("enc", &self.header.enc)
            .field("epk", &self.header.epk.x)
            .finish()
    }
}

fn decode_segment(segment: &str, name: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| Error::InvalidWrappedKey(format!("{} is not base64url: {}", name, e)))
}

fn fixed_segment<const N: usize>(segment: &str, name: &str) -> Result<[u8; N]> {
    let bytes = decode_segment(segment, name)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        Error::InvalidWrappedKey(format!("{} must be {} bytes, got {}", name, N, len))
    })
}

fn ephemeral_secret() -> Result<StaticSecret> {
    let mut bytes = [0u8; 32];
    let filled = OsRng.try_fill_bytes(&mut bytes);
    let secret = StaticSecret::from(bytes);
    bytes.zeroize();
    filled.map_err(|_| Error::RandomSourceFailure)?;
    Ok(secret)
}

/// Wrap `cek` for the holder of `recipient_public_key`
///
/// ## Errors
///
/// - `InvalidKey` if the recipient key is a low-order point
/// - `RandomSourceFailure` if the ephemeral key or nonce cannot be drawn
pub fn wrap(
    cek: &ContentEncryptionKey,
    recipient_public_key: &[u8; X25519_KEY_SIZE],
) -> Result<WrappedKey> {
    let recipient = X25519PublicKey::from(*recipient_public_key);

    let ephemeral = ephemeral_secret()?;
    let ephemeral_public = X25519PublicKey::from(&ephemeral);
    let shared = ephemeral.diffie_hellman(&recipient);
    drop(ephemeral);

    if !shared.was_contributory() {
        return Err(Error::InvalidKey(
            "recipient X25519 key is a low-order point".into(),
        ));
    }

    let kek = concat_kdf(shared.as_bytes(), ENC_A256GCM, &[], &[])?;
    drop(shared);

    let header = ProtectedHeader::for_ephemeral(ephemeral_public.as_bytes());
    let protected = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);

    let mut iv = [0u8; IV_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|_| Error::RandomSourceFailure)?;

    let cipher = Aes256Gcm::new_from_slice(kek.as_bytes())
        .map_err(|e| Error::Internal(format!("AES-256-GCM key setup: {}", e)))?;

    // Encrypted in place, so the buffer holds ciphertext once this returns.
    let mut ciphertext = *cek.as_bytes();
    let tag = cipher
        .encrypt_in_place_detached(AesNonce::from_slice(&iv), protected.as_bytes(), &mut ciphertext)
        .map_err(|e| {
            ciphertext.zeroize();
            Error::EncryptionFailed(format!("CEK wrap: {}", e))
        })?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(&tag);

    let token = format!(
        "{}..{}.{}.{}",
        protected,
        URL_SAFE_NO_PAD.encode(iv),
        URL_SAFE_NO_PAD.encode(ciphertext),
        URL_SAFE_NO_PAD.encode(tag_bytes),
    );

    tracing::debug!(epk = header.epk.x.as_str(), "Wrapped CEK for recipient");

    Ok(WrappedKey {
        token,
        header,
        iv,
        ciphertext,
        tag: tag_bytes,
    })
}

// ============================================================================
// TESTS
// ============================================================================
