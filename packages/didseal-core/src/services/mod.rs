//! # Collaborator Services
//!
//! The network-facing seam around the synchronous crypto core.
//!
//! ## Share / Receive
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              SHARE FILE                                 │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Sender                 didseal                     Collaborators      │
//! │    │                       │                              │             │
//! │    │── did, plaintext ────►│                              │             │
//! │    │                       │── resolve_did ──────────────►│ resolver    │
//! │    │                       │◄─ DID document ──────────────│             │
//! │    │                       │   find X25519 key            │             │
//! │    │                       │   encrypt_for_recipient      │             │
//! │    │                       │── put_object ───────────────►│ objects     │
//! │    │                       │◄─ url ───────────────────────│             │
//! │    │                       │── record_plaintext_hash ────►│ metadata    │
//! │    │◄─ ShareReceipt ───────│   (only after upload)        │             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                             RECEIVE FILE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  get_object ──► check storage id ──► decode envelope                   │
//! │      ──► wallet_decrypt(wrapped key) ──► CEK                            │
//! │      ──► AES-256-GCM decrypt ──► wipe CEK                               │
//! │      ──► compare against recorded plaintext hash                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The wallet is the only party that can unwrap a CEK. No implementation of
//! [`Wallet`] ships with this crate.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::Zeroizing;

use crate::config::EncryptionConfig;
use crate::crypto::{
    decrypt_owned, hash_plaintext, ContentEncryptionKey, PlaintextHash, StorageObjectId,
    WrappedKey, ALG_ECDH_ES, ENC_A256GCM,
};
use crate::did::{resolve_x25519_key, Did};
use crate::envelope::Envelope;
use crate::error::{Error, Result};
use crate::seal::encrypt_owned_for_recipient;

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// Remote DID resolution
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Fetch the DID document for `did`
    async fn resolve_did(&self, did: &Did) -> Result<Value>;
}

/// The recipient's wallet, holder of the long-term private key
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Unwrap `wrapped_key` with the private key matching
    /// `recipient_public_key_b64`
    async fn wallet_decrypt(
        &self,
        wrapped_key: &WrappedKey,
        recipient_public_key_b64: &str,
    ) -> Result<ContentEncryptionKey>;
}

/// Content-addressed blob storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `id`, returning a public URL
    async fn put_object(&self, bytes: Vec<u8>, id: &StorageObjectId) -> Result<String>;

    /// Fetch the bytes stored under `id`
    async fn get_object(&self, id: &StorageObjectId) -> Result<Vec<u8>>;
}

/// Relational metadata about uploaded objects
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Record the plaintext digest for an uploaded object
    async fn record_plaintext_hash(&self, id: &StorageObjectId, hash: &PlaintextHash)
        -> Result<()>;

    /// Look up the recorded digest
    async fn plaintext_hash(&self, id: &StorageObjectId) -> Result<Option<PlaintextHash>>;
}

/// The set of collaborators a share/receive flow talks to
#[derive(Clone)]
pub struct Collaborators {
    /// DID resolution
    pub resolver: Arc<dyn DidResolver>,
    /// Recipient wallet
    pub wallet: Arc<dyn Wallet>,
    /// Blob storage
    pub objects: Arc<dyn ObjectStore>,
    /// Metadata store
    pub metadata: Arc<dyn MetadataStore>,
}

// ============================================================================
// WIRE TYPES
// ============================================================================

/// Request body for the wallet's decrypt endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDecryptRequest {
    /// Compact JWE carrying the CEK
    pub jwe: String,
    /// base64 X25519 key the JWE was wrapped for
    pub recipient_public_key: String,
    /// Content encryption algorithm of the JWE
    pub enc: String,
    /// Key management algorithm of the JWE
    pub alg: String,
}

impl WalletDecryptRequest {
    /// Build the request for one wrapped key
    pub fn new(wrapped_key: &WrappedKey, recipient_public_key_b64: &str) -> Self {
        Self {
            jwe: wrapped_key.as_str().to_string(),
            recipient_public_key: recipient_public_key_b64.to_string(),
            enc: ENC_A256GCM.to_string(),
            alg: ALG_ECDH_ES.to_string(),
        }
    }
}

/// Decode the base64 CEK a wallet returns
pub fn cek_from_wallet_response(cek_b64: &str) -> Result<ContentEncryptionKey> {
    let bytes = STANDARD
        .decode(cek_b64.trim())
        .map(Zeroizing::new)
        .map_err(|_| Error::WalletDecryptFailed)?;
    ContentEncryptionKey::from_slice(&bytes).map_err(|_| Error::WalletDecryptFailed)
}

/// Classify a non-success HTTP status from a collaborator
///
/// 4xx means the request itself was rejected; anything else is treated as
/// the collaborator being unavailable.
pub fn remote_status_error(status: u16, detail: impl Into<String>) -> Error {
    let detail = detail.into();
    if (400..500).contains(&status) {
        Error::RemoteRejected(format!("{}: {}", status, detail))
    } else {
        Error::RemoteUnavailable(format!("{}: {}", status, detail))
    }
}

/// Result of [`share_file`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareReceipt {
    /// Content-addressed object name
    pub storage_id: StorageObjectId,
    /// Public URL returned by the object store
    pub url: String,
    /// CEK wrapped for the recipient
    pub wrapped_key: WrappedKey,
    /// base64 X25519 key the CEK was wrapped for
    pub recipient_public_key: String,
}

// ============================================================================
// FLOWS
// ============================================================================

/// Encrypt `plaintext` for `did`, upload it and record its digest
///
/// The digest is recorded only once the upload has succeeded, so a failed
/// upload never leaves a metadata row behind.
pub async fn share_file(
    collaborators: &Collaborators,
    config: &EncryptionConfig,
    did: &Did,
    plaintext: Vec<u8>,
) -> Result<ShareReceipt> {
    let document = collaborators.resolver.resolve_did(did).await?;
    let recipient_key = resolve_x25519_key(did, &document)?;

    let digest = hash_plaintext(&plaintext);
    let sealed = encrypt_owned_for_recipient(config, plaintext, &recipient_key)?;
    let storage_id = sealed.storage_id;

    let url = collaborators
        .objects
        .put_object(sealed.envelope, &storage_id)
        .await?;

    collaborators
        .metadata
        .record_plaintext_hash(&storage_id, &digest)
        .await?;

    tracing::info!(did = did.as_str(), storage_id = storage_id.as_str(), "Shared file");

    Ok(ShareReceipt {
        storage_id,
        url,
        wrapped_key: sealed.wrapped_key,
        recipient_public_key: STANDARD.encode(recipient_key),
    })
}

/// Fetch, unwrap via the wallet, decrypt and verify one shared file
///
/// ## Errors
///
/// - `IntegrityMismatch` if the stored bytes do not hash to `storage_id`,
///   or the plaintext does not match the recorded digest
/// - `WalletDecryptFailed` for any wallet-side unwrap failure, without
///   saying why
/// - `AuthenticationFailure` if the envelope does not verify under the CEK
pub async fn receive_file(
    collaborators: &Collaborators,
    config: &EncryptionConfig,
    storage_id: &StorageObjectId,
    wrapped_key: &WrappedKey,
    recipient_public_key_b64: &str,
) -> Result<Vec<u8>> {
    let bytes = collaborators.objects.get_object(storage_id).await?;
    if StorageObjectId::for_envelope(&bytes) != *storage_id {
        tracing::warn!(storage_id = storage_id.as_str(), "Stored object does not match its id");
        return Err(Error::IntegrityMismatch {
            storage_id: storage_id.to_string(),
        });
    }
    let envelope = Envelope::decode_with(config, &bytes)?;
    drop(bytes);

    let mut cek = collaborators
        .wallet
        .wallet_decrypt(wrapped_key, recipient_public_key_b64)
        .await
        .map_err(|e| match e {
            Error::RemoteUnavailable(_) => e,
            other => {
                tracing::warn!(error = %other, "Wallet could not unwrap CEK");
                Error::WalletDecryptFailed
            }
        })?;

    let result = decrypt_owned(envelope.ciphertext, &cek, &envelope.iv, &envelope.tag);
    cek.destroy();
    let plaintext = result?;

    match collaborators.metadata.plaintext_hash(storage_id).await? {
        Some(expected) if !expected.matches(&plaintext) => {
            tracing::warn!(storage_id = storage_id.as_str(), "Plaintext hash mismatch");
            return Err(Error::IntegrityMismatch {
                storage_id: storage_id.to_string(),
            });
        }
        Some(_) => {}
        None => {
            tracing::warn!(storage_id = storage_id.as_str(), "No plaintext hash recorded");
        }
    }

    Ok(plaintext)
}

// ============================================================================
// TESTS
// ============================================================================
