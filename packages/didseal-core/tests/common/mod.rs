//! Shared fixtures for integration tests
//!
//! `LocalWallet` plays the remote wallet: it alone holds a recipient's
//! X25519 private key and unwraps compact JWEs with it.

#![allow(dead_code)]

use std::sync::Arc;

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use didseal_core::crypto::{concat_kdf, ContentEncryptionKey, WrappedKey, ENC_A256GCM};
use didseal_core::did::{multibase::encode_multikey, KeyType};
use didseal_core::services::memory::{MemoryMetadataStore, MemoryObjectStore, StaticDidResolver};
use didseal_core::services::{Collaborators, Wallet};
use didseal_core::{Error, Result};
use rand::rngs::OsRng;
use serde_json::{json, Value};
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroize;

pub struct LocalWallet {
    secret: StaticSecret,
    public: PublicKey,
}

impl LocalWallet {
    pub fn generate() -> Self {
        Self::from_secret(StaticSecret::random_from_rng(OsRng))
    }

    pub fn from_secret(secret: StaticSecret) -> Self {
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.public.to_bytes()
    }

    pub fn public_key_b64(&self) -> String {
        STANDARD.encode(self.public.as_bytes())
    }

    /// A did:web style document with a signing key listed ahead of the
    /// agreement key
    pub fn did_document(&self, did: &str) -> Value {
        json!({
            "id": did,
            "verificationMethod": [
                {
                    "id": format!("{}#owner", did),
                    "type": "Multikey",
                    "controller": did,
                    "publicKeyMultibase": encode_multikey(KeyType::Ed25519, &[0x11u8; 32]),
                },
                {
                    "id": format!("{}#encryption", did),
                    "type": "Multikey",
                    "controller": did,
                    "publicKeyMultibase": encode_multikey(KeyType::X25519, self.public.as_bytes()),
                },
            ],
            "assertionMethod": [format!("{}#owner", did)],
            "keyAgreement": ["#encryption"],
        })
    }

    pub fn unwrap(&self, wrapped: &WrappedKey) -> Result<ContentEncryptionKey> {
        let epk = PublicKey::from(wrapped.header().ephemeral_public_key()?);
        let shared = self.secret.diffie_hellman(&epk);
        let kek = concat_kdf(shared.as_bytes(), ENC_A256GCM, &[], &[])?;
        let cipher = Aes256Gcm::new_from_slice(kek.as_bytes())
            .map_err(|e| Error::Internal(e.to_string()))?;

        let mut buffer = *wrapped.ciphertext();
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(wrapped.iv()),
                wrapped.protected_segment().as_bytes(),
                &mut buffer,
                Tag::from_slice(wrapped.tag()),
            )
            .map_err(|_| Error::AuthenticationFailure)?;

        let cek = ContentEncryptionKey::from_bytes(buffer);
        buffer.zeroize();
        Ok(cek)
    }
}

#[async_trait]
impl Wallet for LocalWallet {
    async fn wallet_decrypt(
        &self,
        wrapped_key: &WrappedKey,
        recipient_public_key_b64: &str,
    ) -> Result<ContentEncryptionKey> {
        if recipient_public_key_b64 != self.public_key_b64() {
            return Err(Error::RemoteRejected("404: no key for recipient".into()));
        }
        self.unwrap(wrapped_key)
    }
}

pub struct Harness {
    pub resolver: Arc<StaticDidResolver>,
    pub wallet: Arc<LocalWallet>,
    pub objects: Arc<MemoryObjectStore>,
    pub metadata: Arc<MemoryMetadataStore>,
}

impl Harness {
    pub fn new(wallet: LocalWallet) -> Self {
        Self {
            resolver: Arc::new(StaticDidResolver::new()),
            wallet: Arc::new(wallet),
            objects: Arc::new(MemoryObjectStore::with_base_url("https://files.example")),
            metadata: Arc::new(MemoryMetadataStore::new()),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            resolver: self.resolver.clone(),
            wallet: self.wallet.clone(),
            objects: self.objects.clone(),
            metadata: self.metadata.clone(),
        }
    }
}
