//! EVM Signer Core Library
//!
//! This crate provides secp256k1 key management, deterministic ECDSA signing
//! and EIP-155 transaction signing for Ethereum-compatible chains.
//!
//! # Overview
//!
//! This library provides:
//!
//! - **Curve Arithmetic**: secp256k1 field and group operations on [`U256`]
//! - **Keys**: private keys with zeroize-on-drop, public keys in compressed,
//!   uncompressed and hybrid encodings
//! - **Signing**: RFC 6979 deterministic nonces, low-S normalization and
//!   public key recovery
//! - **Transactions**: EIP-155 legacy transactions, RLP encoding and sender
//!   recovery
//! - **Address Derivation**: Ethereum address computation from public keys
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Transaction  │  Eip155Signer  │   Address    │  Compact    │
//! │  RLP / Hash   │  v encoding    │  Derivation  │  Signatures │
//! ├─────────────────────────────────────────────────────────────┤
//! │          ECDSA: sign / verify / recover (crypto)            │
//! │  ┌──────────┐  ┌──────────┐  ┌──────────┐  ┌─────────────┐  │
//! │  │  Keys    │  │  Nonce   │  │ Keccak   │  │  Signature  │  │
//! │  │          │  │ RFC 6979 │  │ Hashing  │  │    Types    │  │
//! │  └──────────┘  └──────────┘  └──────────┘  └─────────────┘  │
//! ├─────────────────────────────────────────────────────────────┤
//! │              secp256k1 field and group arithmetic           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ## Signing a Transaction
//!
//! ```rust
//! use evm_signer_core::{Address, Eip155Signer, PrivateKey, Transaction, U256};
//!
//! let key = PrivateKey::random().unwrap();
//! let signer = Eip155Signer::new(1);
//!
//! let tx = Transaction {
//!     nonce: 0,
//!     gas_price: U256::from(20_000_000_000u64),
//!     gas_limit: 21000,
//!     to: Some(Address::zero()),
//!     value: U256::from(1_000_000_000_000_000_000u128),
//!     ..Transaction::default()
//! };
//!
//! let signed = signer.sign_transaction(&tx, &key).unwrap();
//! let raw = signed.encode_signed();
//!
//! let decoded = Transaction::decode_signed(&raw).unwrap();
//! assert_eq!(signer.sender(&decoded).unwrap(), key.address());
//! ```
//!
//! ## Signing and Recovering a Digest
//!
//! ```rust
//! use evm_signer_core::{B256, PrivateKey, crypto};
//!
//! let key = PrivateKey::random().unwrap();
//! let hash = B256::repeat_byte(0x42);
//!
//! let sig = key.sign_recoverable(&hash).unwrap();
//! let recovered = crypto::recover_public_key(sig.recovery_id(), sig.signature(), &hash).unwrap();
//! assert_eq!(&recovered, key.public_key());
//! ```
//!
//! # Security Considerations
//!
//! - Private key scalars are wiped from memory when dropped
//! - Nonces are derived deterministically, no randomness is needed to sign
//! - Signatures are normalized to low-S form to prevent malleability
//! - Field arithmetic is not constant-time

// Modules
pub mod address;
pub mod compact;
pub mod crypto;
pub mod curve;
pub mod error;
pub mod hash;
pub mod keys;
pub mod nonce;
pub mod signature;
pub mod signer;
pub mod transaction;

// Re-exports for convenience
pub use address::Address;
pub use error::{Error, Result};
pub use keys::{OsRandom, PrivateKey, PublicKey, RandomSource};
pub use signature::{RecoverableSignature, RecoveryId, Signature};
pub use signer::{Eip155Signer, HashSigner, recover_sender, sign_transaction};
pub use transaction::Transaction;

// Re-export commonly used alloy types
pub use alloy_primitives::{B256, Bytes, U256};
