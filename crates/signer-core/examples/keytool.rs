//! EVM Signer Key Tool Example
//!
//! A small command-line front end to the signer library: generate keys,
//! derive addresses, sign digests and transactions, and recover signers.
//!
//! # Quick Start
//!
//! ```bash
//! cargo run --example keytool -- generate
//! cargo run --example keytool -- address 0x4646...46
//! cargo run --example keytool -- sign 0x4646...46 0xdaf5a779...4c8e53
//! cargo run --example keytool -- recover 0x<130 hex chars> 0xdaf5a779...4c8e53
//! cargo run --example keytool -- sign-tx 0x4646...46 tx.json --chain-id 1
//! ```
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `generate` | Generate a new private key |
//! | `address <key>` | Print the address of a private key |
//! | `sign <key> <hash>` | Sign a 32-byte hash |
//! | `recover <sig> <hash>` | Recover the signer of a 65-byte `r‖s‖v` signature |
//! | `sign-tx <key> <tx.json>` | Sign a legacy transaction read from JSON |
//!
//! # Transaction JSON
//!
//! ```json
//! {
//!   "nonce": 9,
//!   "gasPrice": "0x4a817c800",
//!   "gas": 21000,
//!   "to": "0x3535353535353535353535353535353535353535",
//!   "value": "0xde0b6b3a7640000",
//!   "input": "0x",
//!   "chainId": 1
//! }
//! ```
//!
//! Set `RUST_LOG=evm_signer_core=debug` (or pass `--verbose`) to see the
//! library's signing logs.

#![expect(unused_crate_dependencies, reason = "needed for CLI example")]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use evm_signer_core::{
    B256, Eip155Signer, PrivateKey, RecoverableSignature, Transaction, crypto,
};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keytool")]
#[command(about = "secp256k1 key and EVM transaction signing tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a new private key
    Generate,

    /// Print the address and public key of a private key
    Address {
        /// Hex-encoded private key
        key: String,
    },

    /// Sign a 32-byte hash
    Sign {
        /// Hex-encoded private key
        key: String,

        /// Hex-encoded 32-byte hash
        hash: String,
    },

    /// Recover the public key and address behind a signature
    Recover {
        /// Hex-encoded 65-byte signature (r || s || v)
        signature: String,

        /// Hex-encoded 32-byte hash
        hash: String,
    },

    /// Sign a legacy transaction read from a JSON file
    SignTx {
        /// Hex-encoded private key
        key: String,

        /// Path to the transaction JSON
        tx: PathBuf,

        /// Chain ID to sign for, overriding the one in the file
        #[arg(long)]
        chain_id: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str().to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::Generate => cmd_generate(),
        Command::Address { key } => cmd_address(&key),
        Command::Sign { key, hash } => cmd_sign(&key, &hash),
        Command::Recover { signature, hash } => cmd_recover(&signature, &hash),
        Command::SignTx { key, tx, chain_id } => cmd_sign_tx(&key, &tx, chain_id),
    }
}

fn parse_hash(hex_str: &str) -> anyhow::Result<B256> {
    let bytes = hex::decode(hex_str.strip_prefix("0x").unwrap_or(hex_str))
        .context("hash is not valid hex")?;
    if bytes.len() != 32 {
        bail!("hash must be 32 bytes, got {}", bytes.len());
    }
    Ok(B256::from_slice(&bytes))
}

fn parse_key(hex_str: &str) -> anyhow::Result<PrivateKey> {
    PrivateKey::from_hex(hex_str).context("invalid private key")
}

fn cmd_generate() -> anyhow::Result<()> {
    let key = PrivateKey::random()?;

    println!("Private key: {}", key.to_hex());
    println!("Public key:  {}", key.public_key().to_compressed_hex());
    println!("Address:     {}", key.address());
    Ok(())
}

fn cmd_address(key: &str) -> anyhow::Result<()> {
    let key = parse_key(key)?;

    println!("Public key:  {}", key.public_key());
    println!("Compressed:  {}", key.public_key().to_compressed_hex());
    println!("Address:     {}", key.address());
    Ok(())
}

fn cmd_sign(key: &str, hash: &str) -> anyhow::Result<()> {
    let key = parse_key(key)?;
    let hash = parse_hash(hash)?;

    let signature = key.sign_recoverable(&hash)?;

    println!("Signature: {signature}");
    println!("  r: 0x{}", hex::encode(signature.r()));
    println!("  s: 0x{}", hex::encode(signature.s()));
    println!("  v: {}", signature.v());
    Ok(())
}

fn cmd_recover(signature: &str, hash: &str) -> anyhow::Result<()> {
    let signature = RecoverableSignature::from_hex(signature).context("invalid signature")?;
    let hash = parse_hash(hash)?;

    let public_key =
        crypto::recover_public_key(signature.recovery_id(), signature.signature(), &hash)?;

    println!("Public key: {public_key}");
    println!("Address:    {}", public_key.address());
    Ok(())
}

fn cmd_sign_tx(key: &str, path: &Path, chain_id: Option<u64>) -> anyhow::Result<()> {
    let key = parse_key(key)?;
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let tx = Transaction::from_json(&json)?;

    let signer = Eip155Signer::new(chain_id.unwrap_or(tx.chain_id));
    let signed = signer.sign_transaction(&tx, &key)?;
    let sender = signer.sender(&signed)?;

    println!("Signing hash: {}", signer.signing_hash(&tx));
    println!("Sender:       {sender}");
    println!("Chain ID:     {}", signed.chain_id);
    println!("v: {}", signed.v);
    println!("r: {:#x}", signed.r);
    println!("s: {:#x}", signed.s);
    println!("Tx hash:      {}", signed.hash());
    println!("Raw:          0x{}", hex::encode(signed.encode_signed()));
    Ok(())
}
