//! Error types for the EVM signer library.
//!
//! This module provides a single error type [`enum@Error`] covering every
//! failure mode of key handling, signing, recovery and transaction encoding.
//!
//! # Error Categories
//!
//! - **Key errors**: malformed or off-curve public keys, out-of-range scalars
//! - **Signature errors**: bad encodings, failed public key recovery
//! - **Transaction errors**: chain id and `v` encoding, RLP decoding
//!
//! Errors in the "bad input" categories are expected in normal operation.
//! [`Error::RecoveryIdDerivationFailed`], [`Error::NonceExhausted`] and
//! [`Error::SigningFailed`] indicate an internal inconsistency instead.
//!
//! # Example
//!
//! ```
//! use evm_signer_core::{Error, PublicKey};
//!
//! let err = PublicKey::parse(&[0u8; 10]).unwrap_err();
//! assert!(matches!(err, Error::InvalidKeyLength(10)));
//! ```

use alloy_rlp::Error as AlloyRlpError;
use core::result::Result as CoreResult;
use hex::FromHexError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// The main error type for the EVM signer library.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Key Errors
    // =========================================================================
    /// A serialized key has a length matching none of the known formats.
    #[error("invalid key length {0}")]
    InvalidKeyLength(usize),

    /// The format byte of a serialized public key is not valid for its length.
    #[error("invalid magic byte {0:#04x} in public key")]
    InvalidMagicByte(u8),

    /// The point does not satisfy the curve equation.
    #[error("point is not on the secp256k1 curve")]
    PointNotOnCurve,

    /// A coordinate is not reduced modulo the field prime.
    #[error("public key {0} coordinate is >= P")]
    CoordinateOutOfRange(&'static str),

    /// The parity bit of a hybrid key contradicts its Y coordinate.
    #[error("hybrid key y-bit does not match the parity of Y")]
    YBitMismatch,

    /// A private key scalar is zero or not below the curve order.
    #[error("private key scalar is out of range")]
    ScalarOutOfRange,

    // =========================================================================
    // Signature Errors
    // =========================================================================
    /// A serialized signature does not have the expected length.
    #[error("invalid signature length {0}")]
    InvalidSignatureLength(usize),

    /// The signature scalars are malformed.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// No valid public key could be reconstructed from the signature.
    #[error("public key recovery failed")]
    RecoveryFailed,

    /// Neither recovery id reproduces the signer's own public key.
    #[error("failed to determine signature recovery id")]
    RecoveryIdDerivationFailed,

    /// The `v` value matches neither the legacy nor the EIP-155 form.
    #[error("invalid v value {0}")]
    InvalidVEncoding(u64),

    /// The sender of a transaction could not be recovered.
    #[error("failed to recover transaction sender: {0}")]
    SenderRecoveryFailed(#[source] Box<Error>),

    // =========================================================================
    // Randomness Errors
    // =========================================================================
    /// The randomness source failed or produced no usable scalar.
    #[error("randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// The deterministic nonce generator exceeded its retry bound.
    #[error("deterministic nonce generation exhausted its retry bound")]
    NonceExhausted,

    /// An arithmetic step of signing failed.
    #[error("signing failed: {0}")]
    SigningFailed(String),

    // =========================================================================
    // Transaction Errors
    // =========================================================================
    /// The chain ID cannot be encoded into `v`.
    #[error("invalid chain ID: {0}")]
    InvalidChainId(u64),

    /// The transaction was signed for another chain.
    #[error("chain ID mismatch: expected {expected}, got {actual}")]
    ChainIdMismatch {
        /// The chain the signer is configured for.
        expected: u64,
        /// The chain encoded in the transaction's `v`.
        actual: u64,
    },

    /// The transaction data is invalid.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Failed to RLP decode a transaction.
    #[error("RLP decoding failed: {0}")]
    RlpDecodingFailed(String),

    // =========================================================================
    // Serialization Errors
    // =========================================================================
    /// Failed to parse hex data.
    #[error("hex decoding failed: {0}")]
    HexDecodeFailed(String),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    JsonError(String),

    /// An address could not be parsed.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl From<FromHexError> for Error {
    fn from(err: FromHexError) -> Self {
        Error::HexDecodeFailed(err.to_string())
    }
}

impl From<SerdeJsonError> for Error {
    fn from(err: SerdeJsonError) -> Self {
        Error::JsonError(err.to_string())
    }
}

impl From<AlloyRlpError> for Error {
    fn from(err: AlloyRlpError) -> Self {
        Error::RlpDecodingFailed(err.to_string())
    }
}

/// A specialized [`Result`] type for signer operations.
pub type Result<T> = CoreResult<T, Error>;
