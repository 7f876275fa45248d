//! # DID Key Resolution
//!
//! Shows which key-agreement key is selected from various DID document
//! shapes.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example did_key_resolution
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use didseal_core::did::{find_public_key_base64, multibase::encode_multikey, KeyType};
use serde_json::{json, Value};

fn report(label: &str, document: &Value) {
    match find_public_key_base64(document) {
        Some(key) => println!("  {:<34} -> {}", label, key),
        None => println!("  {:<34} -> (no usable X25519 key)", label),
    }
}

fn main() {
    println!("=== didseal Core: DID Key Resolution ===\n");

    let base58 = bs58::encode([1u8; 32]).into_string();

    report(
        "Reference to verificationMethod",
        &json!({
            "id": "did:web:example.com",
            "verificationMethod": [{
                "id": "did:web:example.com#enc",
                "type": "X25519KeyAgreementKey2019",
                "publicKeyBase58": base58,
            }],
            "keyAgreement": ["did:web:example.com#enc"],
        }),
    );

    report(
        "Fragment-only reference",
        &json!({
            "id": "did:web:example.com",
            "verificationMethod": [{
                "id": "did:web:example.com#enc",
                "type": "X25519KeyAgreementKey2019",
                "publicKeyBase58": base58,
            }],
            "keyAgreement": ["#enc"],
        }),
    );

    report(
        "Embedded JWK",
        &json!({
            "id": "did:peer:123",
            "keyAgreement": [{
                "id": "#key-1",
                "type": "JsonWebKey2020",
                "publicKeyJwk": {"kty": "OKP", "crv": "X25519", "x": URL_SAFE_NO_PAD.encode([3u8; 32])},
            }],
        }),
    );

    report(
        "Ed25519 listed first, X25519 second",
        &json!({
            "id": "did:web:example.com",
            "verificationMethod": [
                {"id": "#sig", "type": "Multikey", "publicKeyMultibase": encode_multikey(KeyType::Ed25519, &[5u8; 32])},
                {"id": "#enc", "type": "Multikey", "publicKeyMultibase": encode_multikey(KeyType::X25519, &[6u8; 32])},
            ],
            "keyAgreement": ["#sig", "#enc"],
        }),
    );

    report(
        "Only a signing key",
        &json!({
            "id": "did:web:example.com",
            "verificationMethod": [{
                "id": "#sig",
                "type": "Ed25519VerificationKey2020",
                "publicKeyBase58": base58,
            }],
            "keyAgreement": ["#sig"],
        }),
    );

    report(
        "Dangling reference",
        &json!({"id": "did:web:example.com", "keyAgreement": ["#missing"]}),
    );

    report("Not a document", &json!(["did:web:example.com"]));

    println!();
    println!("=== Example Complete ===");
}
