//! # DID Module
//!
//! Decentralized identifiers and key-agreement key resolution.
//!
//! ## Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         RECIPIENT KEY LOOKUP                            │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │   "did:web:example.com"                                                 │
//! │          │  Did::parse                                                  │
//! │          ▼                                                              │
//! │   remote resolver (services::DidResolver) ──► DID document (JSON)       │
//! │          │  DidDocument::from_value                                     │
//! │          ▼                                                              │
//! │   keyAgreement ──► VerificationMethod ──► PublicKeyMaterial             │
//! │          │  find_x25519_key                                             │
//! │          ▼                                                              │
//! │   32-byte X25519 public key                                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## References
//!
//! - [W3C DID Core](https://www.w3.org/TR/did-core/)
//! - [Multikey](https://www.w3.org/TR/controller-document/#multikey)
//! - [Multicodec](https://github.com/multiformats/multicodec)
//! - [Multibase](https://github.com/multiformats/multibase)

mod document;
mod identifier;
pub mod multibase;
mod resolver;

pub use document::{DidDocument, Jwk, KeyAgreementEntry, KeyType, PublicKeyMaterial, VerificationMethod};
pub use identifier::{Did, DID_PREFIX};
pub use resolver::{
    find_public_key_base64, find_public_key_base64_in_json, find_x25519_key, resolve_x25519_key,
};
