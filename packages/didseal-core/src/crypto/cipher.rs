//! # Symmetric Cipher Engine
//!
//! AES-256-GCM encryption of file content under a CEK.
//!
//! ## Encryption Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CONTENT ENCRYPTION FLOW                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Step 1: Generate IV (fresh per call)                                  │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  Random 12 bytes from the OS CSPRNG                          │       │
//! │  │  (Each CEK is single-use, so a fresh IV is never repeated)   │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Step 2: Encrypt in place                                              │
//! │  ┌─────────────────────────────────────────────────────────────┐       │
//! │  │  AES-256-GCM(                                                │       │
//! │  │    key = cek,                                               │       │
//! │  │    nonce = iv,                                              │       │
//! │  │    plaintext = file bytes,                                  │       │
//! │  │    aad = (none)                                             │       │
//! │  │  )                                                          │       │
//! │  │           ↓                                                  │       │
//! │  │  Ciphertext (same length) + detached 16-byte tag            │       │
//! │  └─────────────────────────────────────────────────────────────┘       │
//! │                                                                         │
//! │  Output: SealedContent { ciphertext, iv, tag }                         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The buffer is encrypted in place, so peak memory stays at one copy of the
//! payload plus a constant.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce as AesNonce, Tag as AesTag,
};
use rand::rngs::OsRng;
use rand::RngCore;

use super::cek::ContentEncryptionKey;
use crate::error::{Error, Result};

/// Size of the AES-GCM IV in bytes (96 bits)
pub const IV_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// Output of a content encryption
#[derive(Clone, PartialEq, Eq)]
pub struct SealedContent {
    /// Ciphertext, same length as the plaintext
    pub ciphertext: Vec<u8>,
    /// IV used for this encryption
    pub iv: [u8; IV_SIZE],
    /// Detached authentication tag
    pub tag: [u8; TAG_SIZE],
}

impl std::fmt::Debug for SealedContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedContent")
            .field("ciphertext_len", &self.ciphertext.len())
            .field("iv", &hex::encode(self.iv))
            .field("tag", &hex::encode(self.tag))
            .finish()
    }
}

/// Generate a cryptographically random IV
pub fn generate_iv() -> Result<[u8; IV_SIZE]> {
    let mut iv = [0u8; IV_SIZE];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|_| Error::RandomSourceFailure)?;
    Ok(iv)
}

fn cipher_for(cek: &ContentEncryptionKey) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(cek.as_bytes())
        .map_err(|e| Error::Internal(format!("AES-256-GCM key setup: {}", e)))
}

/// Encrypt `plaintext` under `cek` with a fresh random IV
///
/// The plaintext is copied once; use [`encrypt_owned`] to avoid the copy.
pub fn encrypt(plaintext: &[u8], cek: &ContentEncryptionKey) -> Result<SealedContent> {
    encrypt_owned(plaintext.to_vec(), cek)
}

/// Encrypt an owned buffer in place with a fresh random IV
pub fn encrypt_owned(plaintext: Vec<u8>, cek: &ContentEncryptionKey) -> Result<SealedContent> {
    let iv = generate_iv()?;
    encrypt_with_iv(plaintext, cek, iv)
}

/// Encrypt with a caller-supplied IV
///
/// This is the deterministic core of [`encrypt`]: identical inputs always
/// give identical ciphertext and tag. Production paths must never reuse an
/// IV with the same key; this exists for known-answer checks.
pub fn encrypt_with_iv(
    mut buffer: Vec<u8>,
    cek: &ContentEncryptionKey,
    iv: [u8; IV_SIZE],
) -> Result<SealedContent> {
    let cipher = cipher_for(cek)?;

    let tag = cipher
        .encrypt_in_place_detached(AesNonce::from_slice(&iv), b"", &mut buffer)
        .map_err(|e| Error::EncryptionFailed(format!("AES-256-GCM: {}", e)))?;

    let mut tag_bytes = [0u8; TAG_SIZE];
    tag_bytes.copy_from_slice(&tag);

    Ok(SealedContent {
        ciphertext: buffer,
        iv,
        tag: tag_bytes,
    })
}

/// Decrypt `ciphertext` and verify its tag
///
/// ## Errors
///
/// Returns `AuthenticationFailure` if:
/// - The ciphertext or tag was tampered with
/// - The key is wrong
/// - The IV is wrong
///
/// The cases are indistinguishable.
pub fn decrypt(
    ciphertext: &[u8],
    cek: &ContentEncryptionKey,
    iv: &[u8; IV_SIZE],
    tag: &[u8; TAG_SIZE],
) -> Result<Vec<u8>> {
    decrypt_owned(ciphertext.to_vec(), cek, iv, tag)
}

/// Decrypt an owned buffer in place
///
/// On failure the partially processed buffer is dropped, never returned.
pub fn decrypt_owned(
    mut buffer: Vec<u8>,
    cek: &ContentEncryptionKey,
    iv: &[u8; IV_SIZE],
    tag: &[u8; TAG_SIZE],
) -> Result<Vec<u8>> {
    let cipher = cipher_for(cek)?;

    cipher
        .decrypt_in_place_detached(
            AesNonce::from_slice(iv),
            b"",
            &mut buffer,
            AesTag::from_slice(tag),
        )
        .map_err(|_| Error::AuthenticationFailure)?;

    Ok(buffer)
}

// ============================================================================
// TESTS
// ============================================================================
