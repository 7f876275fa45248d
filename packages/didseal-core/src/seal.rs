//! # Encryption Orchestrator
//!
//! Composes the cipher, envelope codec and key wrapper into the sender-side
//! operation.
//!
//! ## Sender Flow
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ENCRYPT FOR RECIPIENT                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  plaintext ─┐                                                          │
//! │             ▼                                                          │
//! │  1. CEK = generate()                                                   │
//! │  2. (ct, iv, tag) = AES-256-GCM(CEK, plaintext)                        │
//! │  3. envelope = CBOR{algorithm, iv, tag, ct}                            │
//! │     storage_id = hex(SHA-256(envelope))                                │
//! │  4. wrapped = ECDH-ES(CEK, recipient X25519 key)                       │
//! │  5. CEK.destroy()  ◄── on success and on every error path             │
//! │                                                                         │
//! │  Output: SealedFile { envelope, wrapped_key, storage_id }              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Receiver Flow
//!
//! There is no local unwrap. The recipient's wallet recovers
//! the CEK from the wrapped key; [`open_envelope`] then decodes and
//! decrypts.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::config::EncryptionConfig;
use crate::crypto::{
    decrypt_owned, encrypt_owned, wrap, ContentEncryptionKey, StorageObjectId, WrappedKey,
    X25519_KEY_SIZE,
};
use crate::envelope::Envelope;
use crate::error::{Error, Result};

/// Output of [`encrypt_for_recipient`]
#[derive(Debug, Clone)]
pub struct SealedFile {
    /// Canonical envelope bytes, to be uploaded
    pub envelope: Vec<u8>,
    /// CEK wrapped for the recipient, to be sent out of band
    pub wrapped_key: WrappedKey,
    /// Content-addressed object name for `envelope`
    pub storage_id: StorageObjectId,
}

/// Decode a base64 X25519 public key as returned by the DID resolver
pub fn decode_recipient_key(recipient_public_key_b64: &str) -> Result<[u8; X25519_KEY_SIZE]> {
    let bytes = STANDARD
        .decode(recipient_public_key_b64.trim())
        .map_err(|e| Error::InvalidKey(format!("recipient key is not base64: {}", e)))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| {
        Error::InvalidKey(format!(
            "recipient key must be {} bytes, got {}",
            X25519_KEY_SIZE, len
        ))
    })
}

/// Encrypt `plaintext` for the holder of `recipient_public_key_b64`
///
/// ## Example
///
/// ```
/// use didseal_core::config::EncryptionConfig;
/// use didseal_core::seal::encrypt_for_recipient;
///
/// # fn main() -> didseal_core::Result<()> {
/// let recipient = "CQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQkJCQk=";
/// let sealed = encrypt_for_recipient(&EncryptionConfig::default(), b"hello", recipient)?;
///
/// assert_eq!(sealed.storage_id.as_str().len(), 64);
/// # Ok(())
/// # }
/// ```
pub fn encrypt_for_recipient(
    config: &EncryptionConfig,
    plaintext: &[u8],
    recipient_public_key_b64: &str,
) -> Result<SealedFile> {
    let recipient = decode_recipient_key(recipient_public_key_b64)?;
    check_size(config, plaintext.len())?;
    seal_owned(config, plaintext.to_vec(), &recipient)
}

/// Encrypt an owned buffer for a raw recipient key without copying it
pub fn encrypt_owned_for_recipient(
    config: &EncryptionConfig,
    plaintext: Vec<u8>,
    recipient_public_key: &[u8; X25519_KEY_SIZE],
) -> Result<SealedFile> {
    check_size(config, plaintext.len())?;
    seal_owned(config, plaintext, recipient_public_key)
}

fn check_size(config: &EncryptionConfig, size: usize) -> Result<()> {
    if size > config.max_plaintext_len {
        return Err(Error::PayloadTooLarge {
            size,
            limit: config.max_plaintext_len,
        });
    }
    Ok(())
}

fn seal_owned(
    config: &EncryptionConfig,
    plaintext: Vec<u8>,
    recipient_public_key: &[u8; X25519_KEY_SIZE],
) -> Result<SealedFile> {
    let plaintext_len = plaintext.len();

    let mut cek = ContentEncryptionKey::generate()?;
    let result = seal_with_cek(config, plaintext, &cek, recipient_public_key);
    cek.destroy();

    if let Ok(sealed) = &result {
        tracing::debug!(
            storage_id = sealed.storage_id.as_str(),
            plaintext_len,
            envelope_len = sealed.envelope.len(),
            "Sealed file for recipient"
        );
    }
    result
}

fn seal_with_cek(
    config: &EncryptionConfig,
    plaintext: Vec<u8>,
    cek: &ContentEncryptionKey,
    recipient_public_key: &[u8; X25519_KEY_SIZE],
) -> Result<SealedFile> {
    let sealed = encrypt_owned(plaintext, cek)?;
    let envelope = Envelope::new(config.algorithm, sealed).into_bytes()?;
    let storage_id = StorageObjectId::for_envelope(&envelope);
    let wrapped_key = wrap(cek, recipient_public_key)?;

    Ok(SealedFile {
        envelope,
        wrapped_key,
        storage_id,
    })
}

/// Decode envelope bytes and decrypt them with a wallet-recovered CEK
///
/// ## Errors
///
/// - `MalformedEnvelope` / `UnsupportedAlgorithm` if the bytes do not decode
/// - `AuthenticationFailure` if the key is wrong or the content was altered
pub fn open_envelope(
    config: &EncryptionConfig,
    envelope_bytes: &[u8],
    cek: &ContentEncryptionKey,
) -> Result<Vec<u8>> {
    let envelope = Envelope::decode_with(config, envelope_bytes)?;
    let plaintext = decrypt_owned(envelope.ciphertext, cek, &envelope.iv, &envelope.tag)?;

    tracing::debug!(plaintext_len = plaintext.len(), "Opened envelope");
    Ok(plaintext)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{encrypt, hash_plaintext};
    use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

    fn recipient_b64() -> String {
        let secret = StaticSecret::random_from_rng(rand::rngs::OsRng);
        STANDARD.encode(X25519PublicKey::from(&secret).as_bytes())
    }

    #[test]
    fn test_encrypt_for_recipient_outputs() {
        let config = EncryptionConfig::default();
        let sealed = encrypt_for_recipient(&config, b"test", &recipient_b64()).unwrap();

        assert_eq!(sealed.storage_id, StorageObjectId::for_envelope(&sealed.envelope));
        assert_eq!(sealed.wrapped_key.as_str().split('.').count(), 5);

        let envelope = Envelope::decode(&sealed.envelope).unwrap();
        assert_eq!(envelope.ciphertext.len(), 4);
    }

    #[test]
    fn test_same_plaintext_gives_different_ids() {
        let config = EncryptionConfig::default();
        let recipient = recipient_b64();

        let a = encrypt_for_recipient(&config, b"same", &recipient).unwrap();
        let b = encrypt_for_recipient(&config, b"same", &recipient).unwrap();

        assert_ne!(a.envelope, b.envelope);
        assert_ne!(a.storage_id, b.storage_id);
        assert_ne!(a.wrapped_key, b.wrapped_key);
    }

    #[test]
    fn test_rejects_bad_recipient_keys() {
        let config = EncryptionConfig::default();

        assert!(matches!(
            encrypt_for_recipient(&config, b"x", "not base64!"),
            Err(Error::InvalidKey(_))
        ));
        assert!(matches!(
            encrypt_for_recipient(&config, b"x", &STANDARD.encode([1u8; 16])),
            Err(Error::InvalidKey(_))
        ));
        // All-zero key is a low-order point
        assert!(matches!(
            encrypt_for_recipient(&config, b"x", &STANDARD.encode([0u8; 32])),
            Err(Error::InvalidKey(_))
        ));
    }

    #[test]
    fn test_size_limit() {
        let config = EncryptionConfig::default().with_max_plaintext_len(8);

        let result = encrypt_for_recipient(&config, &[0u8; 9], &recipient_b64());
        assert!(matches!(
            result,
            Err(Error::PayloadTooLarge { size: 9, limit: 8 })
        ));
        assert!(encrypt_for_recipient(&config, &[0u8; 8], &recipient_b64()).is_ok());
    }

    #[test]
    fn test_open_envelope_round_trip() {
        let config = EncryptionConfig::default();
        let cek = ContentEncryptionKey::generate().unwrap();
        let sealed = encrypt(b"open me", &cek).unwrap();
        let bytes = Envelope::new(config.algorithm, sealed).into_bytes().unwrap();

        let plaintext = open_envelope(&config, &bytes, &cek).unwrap();
        assert_eq!(plaintext, b"open me");
        assert!(hash_plaintext(b"open me").matches(&plaintext));

        let other = ContentEncryptionKey::generate().unwrap();
        assert!(matches!(
            open_envelope(&config, &bytes, &other),
            Err(Error::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_open_envelope_parse_errors_are_distinct() {
        let config = EncryptionConfig::default();
        let cek = ContentEncryptionKey::generate().unwrap();

        assert!(matches!(
            open_envelope(&config, b"garbage", &cek),
            Err(Error::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_open_legacy_envelope_when_enabled() {
        let cek = ContentEncryptionKey::generate().unwrap();
        let sealed = encrypt(b"legacy", &cek).unwrap();

        let mut legacy = crate::envelope::LEGACY_MAGIC.to_vec();
        legacy.extend_from_slice(&sealed.iv);
        legacy.extend_from_slice(&sealed.tag);
        legacy.extend_from_slice(&sealed.ciphertext);

        let strict = EncryptionConfig::default();
        let lenient = EncryptionConfig::default().with_legacy_envelopes(true);

        assert!(open_envelope(&strict, &legacy, &cek).is_err());
        assert_eq!(open_envelope(&lenient, &legacy, &cek).unwrap(), b"legacy");
    }
}
