//! # Cryptography Module
//!
//! All cryptographic primitives used by didseal-core.
//!
//! ## Security Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    CRYPTOGRAPHIC ARCHITECTURE                           │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    ENVELOPE ENCRYPTION                          │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │   plaintext ──► AES-256-GCM(CEK) ──► Envelope (stored)         │   │
//! │  │                        │                                        │   │
//! │  │                        ▼                                        │   │
//! │  │   CEK ──► ECDH-ES(recipient X25519) ──► compact JWE (shared)   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    KEY HIERARCHY                                │   │
//! │  ├─────────────────────────────────────────────────────────────────┤   │
//! │  │                                                                 │   │
//! │  │  Recipient X25519 key (long-term, held by the wallet)          │   │
//! │  │            │                                                    │   │
//! │  │            ▼                                                    │   │
//! │  │  Ephemeral X25519 key (one per wrap, dropped after DH)         │   │
//! │  │            │                                                    │   │
//! │  │            ▼                                                    │   │
//! │  │  KEK = Concat KDF(Z, "A256GCM")                                │   │
//! │  │            │                                                    │   │
//! │  │            ▼                                                    │   │
//! │  │  CEK (one per file, wiped after wrapping)                      │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Algorithm Choices
//!
//! | Algorithm | Purpose |
//! |-----------|---------|
//! | AES-256-GCM | Content encryption, CEK wrapping |
//! | X25519 | Recipient key agreement |
//! | Concat KDF (SHA-256) | KEK derivation |
//! | SHA-256 | Storage ids, plaintext digests |
//!
//! ## Security Considerations
//!
//! 1. **Key Zeroization**: CEKs, KEKs and ephemeral secrets are zeroized when dropped
//! 2. **Secure Random**: `rand::rngs::OsRng` only, with no fallback
//! 3. **No Key Reuse**: A fresh CEK per file, a fresh ephemeral key per wrap

mod cek;
mod cipher;
mod ecdh_es;
mod hash;

pub use cek::{ContentEncryptionKey, CEK_SIZE};
pub use cipher::{
    decrypt, decrypt_owned, encrypt, encrypt_owned, encrypt_with_iv, generate_iv, SealedContent,
    IV_SIZE, TAG_SIZE,
};
pub use ecdh_es::{
    concat_kdf, wrap, EphemeralJwk, ProtectedHeader, WrappedKey, WrappingKey, ALG_ECDH_ES,
    ENC_A256GCM, X25519_KEY_SIZE,
};
pub use hash::{hash_plaintext, sha256_hex, PlaintextHash, StorageObjectId};
