//! # Seal Demo
//!
//! Demonstrates sealing a file for a DID recipient.
//!
//! ## Run
//!
//! ```bash
//! cargo run --example seal_demo
//! ```

use didseal_core::config::EncryptionConfig;
use didseal_core::crypto::{encrypt, ContentEncryptionKey};
use didseal_core::did::{find_public_key_base64, multibase::encode_multikey, KeyType};
use didseal_core::envelope::{Algorithm, Envelope};
use didseal_core::seal::{encrypt_for_recipient, open_envelope};
use didseal_core::services::WalletDecryptRequest;
use serde_json::json;
use x25519_dalek::{PublicKey, StaticSecret};

fn main() {
    println!("=== didseal Core: Seal Demo ===\n");

    // Step 1: The recipient publishes an X25519 key in their DID document
    println!("Step 1: Recipient publishes a key-agreement key...");

    let recipient_secret = StaticSecret::from([2u8; 32]); // In production, held only by the wallet
    let recipient_public = PublicKey::from(&recipient_secret);

    let document = json!({
        "id": "did:web:bob.example",
        "verificationMethod": [
            {
                "id": "did:web:bob.example#owner",
                "type": "Multikey",
                "publicKeyMultibase": encode_multikey(KeyType::Ed25519, &[1u8; 32]),
            },
            {
                "id": "did:web:bob.example#enc",
                "type": "Multikey",
                "publicKeyMultibase": encode_multikey(KeyType::X25519, recipient_public.as_bytes()),
            },
        ],
        "keyAgreement": ["#enc"],
    });
    println!("  DID: did:web:bob.example");
    println!();

    // Step 2: Resolve the recipient key from the document
    println!("Step 2: Resolving the X25519 key...");

    let recipient_b64 = find_public_key_base64(&document).expect("No X25519 key in document");
    println!("  Recipient key (base64): {}", recipient_b64);
    println!();

    // Step 3: Seal the file
    println!("Step 3: Sealing the file...");
    println!();
    println!("  ┌─────────────────────────────────────────────────────────────┐");
    println!("  │                      SEAL FLOW                              │");
    println!("  ├─────────────────────────────────────────────────────────────┤");
    println!("  │                                                             │");
    println!("  │   plaintext ──► AES-256-GCM(CEK) ──► envelope ──► storage   │");
    println!("  │                       │                                     │");
    println!("  │                       ▼                                     │");
    println!("  │   CEK ──► ECDH-ES(recipient key) ──► wrapped key ──► Bob    │");
    println!("  │                                                             │");
    println!("  │   CEK is wiped before encrypt_for_recipient returns         │");
    println!("  │                                                             │");
    println!("  └─────────────────────────────────────────────────────────────┘");
    println!();

    let config = EncryptionConfig::default();
    let plaintext = b"Quarterly report: all numbers are up.";
    let sealed =
        encrypt_for_recipient(&config, plaintext, &recipient_b64).expect("Sealing failed");

    println!("  Plaintext: \"{}\"", String::from_utf8_lossy(plaintext));
    println!("  Envelope: {} bytes", sealed.envelope.len());
    println!("  Storage id: {}", sealed.storage_id);
    println!();

    // Step 4: Inspect the wrapped key
    println!("Step 4: Inspecting the wrapped key...");

    let header = sealed.wrapped_key.header();
    println!("  alg: {}", header.alg);
    println!("  enc: {}", header.enc);
    println!("  epk: {} {} {}", header.epk.kty, header.epk.crv, header.epk.x);
    println!();

    let request = WalletDecryptRequest::new(&sealed.wrapped_key, &recipient_b64);
    println!("  Wallet request body:");
    println!(
        "  {}",
        serde_json::to_string(&request).expect("Failed to serialize request")
    );
    println!();

    // Step 5: Demonstrate tamper detection
    println!("Step 5: Tamper detection (AEAD integrity)...");

    let cek = ContentEncryptionKey::generate().expect("OS random source unavailable");
    let sealed_content = encrypt(plaintext, &cek).expect("Encryption failed");
    let mut envelope = Envelope::new(Algorithm::Aes256Gcm, sealed_content)
        .into_bytes()
        .expect("Encoding failed");

    match open_envelope(&config, &envelope, &cek) {
        Ok(_) => println!("  [OK] Untouched envelope opens"),
        Err(e) => println!("  [FAILED] {}", e),
    }

    let last = envelope.len() - 1;
    envelope[last] ^= 0xFF;
    match open_envelope(&config, &envelope, &cek) {
        Ok(_) => println!("  [FAILED] Tampered envelope was accepted!"),
        Err(e) => println!("  [OK] Tampered envelope rejected: {}", e),
    }
    println!();

    println!("=== Example Complete ===");
}
