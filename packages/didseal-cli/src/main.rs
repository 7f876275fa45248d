//! didseal CLI
//!
//! A thin front end over `didseal-core`:
//!
//! 1. **resolve-key**: Pick the X25519 key-agreement key out of a DID
//!    document.
//!
//! 2. **seal**: Encrypt a file for a recipient and write the envelope under
//!    its content-addressed name.
//!
//! 3. **open**: Decrypt an envelope with a CEK the recipient's wallet
//!    released.
//!
//! 4. **inspect-token**: Show the protected header of a wrapped key.
//!
//! The CLI never holds a recipient private key. Unwrapping a token is the
//! wallet's job.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use didseal_core::crypto::{hash_plaintext, PlaintextHash, WrappedKey};
use didseal_core::did::resolve_x25519_key;
use didseal_core::seal::{decode_recipient_key, encrypt_owned_for_recipient, open_envelope};
use didseal_core::services::cek_from_wallet_response;
use didseal_core::{Did, EncryptionConfig};
use serde::Serialize;
use serde_json::Value;

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "didseal", version, about = "Seal files for a DID recipient")]
struct Cli {
    /// Accept envelopes in the legacy concatenated layout when opening
    #[arg(long, global = true, env = "DIDSEAL_ACCEPT_LEGACY")]
    accept_legacy: bool,

    /// Largest plaintext accepted for sealing, in bytes
    #[arg(long, global = true, env = "DIDSEAL_MAX_PLAINTEXT_BYTES")]
    max_plaintext_bytes: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the base64 X25519 key-agreement key of a DID document
    ResolveKey {
        /// Path to the DID document (JSON)
        #[arg(long)]
        document: PathBuf,
    },

    /// Encrypt a file for a recipient
    Seal(SealArgs),

    /// Decrypt an envelope with a wallet-issued CEK
    Open {
        /// Path to the envelope bytes
        #[arg(long)]
        envelope: PathBuf,

        /// Base64 CEK returned by the recipient's wallet
        #[arg(long, env = "DIDSEAL_CEK", hide_env_values = true)]
        cek: String,

        /// Where to write the plaintext
        #[arg(long)]
        output: PathBuf,

        /// Expected SHA-256 of the plaintext (hex)
        #[arg(long)]
        expect_hash: Option<String>,
    },

    /// Print the protected header of a wrapped key
    InspectToken {
        /// Compact JWE produced by `seal`
        token: String,
    },
}

#[derive(Args, Debug)]
struct SealArgs {
    /// File to encrypt
    #[arg(long)]
    input: PathBuf,

    /// Recipient X25519 public key (base64)
    #[arg(long, conflicts_with = "document", required_unless_present = "document")]
    recipient_key: Option<String>,

    /// Recipient DID document (JSON)
    #[arg(long)]
    document: Option<PathBuf>,

    /// Directory the envelope is written into
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SealOutput {
    storage_id: String,
    wrapped_key: String,
    plaintext_hash: String,
    path: PathBuf,
}

// ── Entry Point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "didseal=info,didseal_core=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli);

    match cli.command {
        Command::ResolveKey { document } => {
            let key = resolve_key(&document)?;
            println!("{}", key);
        }
        Command::Seal(args) => {
            let output = seal(&config, &args)?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Open {
            envelope,
            cek,
            output,
            expect_hash,
        } => {
            open(&config, &envelope, &cek, &output, expect_hash.as_deref())?;
        }
        Command::InspectToken { token } => {
            println!("{}", inspect_token(&token)?);
        }
    }

    Ok(())
}

fn build_config(cli: &Cli) -> EncryptionConfig {
    let mut config = EncryptionConfig::default().with_legacy_envelopes(cli.accept_legacy);
    if let Some(limit) = cli.max_plaintext_bytes {
        config = config.with_max_plaintext_len(limit);
    }
    config
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn load_document(path: &Path) -> Result<(Did, Value)> {
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("reading DID document {}", path.display()))?;
    let document: Value = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("{} is not JSON", path.display()))?;

    let id = document
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| eyre!("{} has no \"id\"", path.display()))?;
    let did = Did::parse(id)?;

    Ok((did, document))
}

fn resolve_key(document_path: &Path) -> Result<String> {
    let (did, document) = load_document(document_path)?;
    let key = resolve_x25519_key(&did, &document)?;
    tracing::debug!(did = did.as_str(), "Resolved key-agreement key");
    Ok(STANDARD.encode(key))
}

fn seal(config: &EncryptionConfig, args: &SealArgs) -> Result<SealOutput> {
    let recipient = match (&args.recipient_key, &args.document) {
        (Some(key), _) => decode_recipient_key(key)?,
        (None, Some(document)) => {
            let (did, document) = load_document(document)?;
            resolve_x25519_key(&did, &document)?
        }
        (None, None) => bail!("either --recipient-key or --document is required"),
    };

    let plaintext = fs::read(&args.input)
        .wrap_err_with(|| format!("reading {}", args.input.display()))?;
    let plaintext_hash = hash_plaintext(&plaintext);

    let sealed = encrypt_owned_for_recipient(config, plaintext, &recipient)?;

    fs::create_dir_all(&args.out_dir)
        .wrap_err_with(|| format!("creating {}", args.out_dir.display()))?;
    let path = args.out_dir.join(sealed.storage_id.as_str());
    fs::write(&path, &sealed.envelope)
        .wrap_err_with(|| format!("writing {}", path.display()))?;

    tracing::info!(
        storage_id = sealed.storage_id.as_str(),
        len = sealed.envelope.len(),
        "Sealed file"
    );

    Ok(SealOutput {
        storage_id: sealed.storage_id.to_string(),
        wrapped_key: sealed.wrapped_key.to_string(),
        plaintext_hash: plaintext_hash.to_string(),
        path,
    })
}

fn open(
    config: &EncryptionConfig,
    envelope_path: &Path,
    cek_b64: &str,
    output: &Path,
    expect_hash: Option<&str>,
) -> Result<()> {
    let expected = expect_hash.map(PlaintextHash::parse).transpose()?;

    let envelope = fs::read(envelope_path)
        .wrap_err_with(|| format!("reading {}", envelope_path.display()))?;

    let mut cek = cek_from_wallet_response(cek_b64)?;
    let opened = open_envelope(config, &envelope, &cek);
    cek.destroy();
    let plaintext = opened?;

    if let Some(expected) = expected {
        if !expected.matches(&plaintext) {
            bail!("plaintext does not match the expected hash {}", expected);
        }
    }

    fs::write(output, &plaintext).wrap_err_with(|| format!("writing {}", output.display()))?;
    tracing::info!(len = plaintext.len(), "Opened envelope");
    Ok(())
}

fn inspect_token(token: &str) -> Result<String> {
    let wrapped = WrappedKey::parse(token)?;
    Ok(serde_json::to_string_pretty(wrapped.header())?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
