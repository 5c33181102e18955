//! ECDSA signature types for secp256k1.
//!
//! This module provides three types:
//!
//! - [`Signature`]: the `(r, s)` pair produced by [`crate::crypto::sign_hash`]
//! - [`RecoveryId`]: the small integer selecting which candidate public key
//!   a signature recovers to
//! - [`RecoverableSignature`]: a signature together with its recovery id
//!
//! # Signature Format
//!
//! Ethereum signatures consist of three components:
//!
//! - `r`: the x-coordinate of the ephemeral point, reduced modulo `n` (32 bytes)
//! - `s`: the signature scalar (32 bytes)
//! - `v`: the recovery id (1 byte)
//!
//! # Example
//!
//! ```
//! use evm_signer_core::{RecoverableSignature, RecoveryId, Signature};
//!
//! let mut r = [0u8; 32];
//! r[31] = 1;
//! let mut s = [0u8; 32];
//! s[31] = 2;
//!
//! let sig = Signature::from_bytes(r, s).unwrap();
//! let recoverable = RecoverableSignature::new(sig, RecoveryId::new(true, false));
//! assert_eq!(recoverable.v(), 1);
//! assert_eq!(recoverable.to_bytes()[64], 1);
//! ```

use core::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::curve::{HALF_N, N};
use crate::error::{Error, Result};

/// An ECDSA signature `(r, s)` over secp256k1.
///
/// Both scalars are guaranteed to lie in `[1, n-1]`. Signatures produced by
/// this crate additionally satisfy the low-S rule (`s <= n/2`), see
/// [`Signature::is_low_s`].
///
/// # Wire Format
///
/// Serialized as 64 bytes: `r (32 bytes) || s (32 bytes)`, big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl Signature {
    /// The length of a serialized `r || s` signature in bytes.
    pub const BYTE_LEN: usize = 64;

    /// Creates a signature from its big-endian components.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignature`] if `r` or `s` is zero or not below
    /// the curve order.
    ///
    /// # Example
    ///
    /// ```
    /// use evm_signer_core::Signature;
    ///
    /// assert!(Signature::from_bytes([0u8; 32], [1u8; 32]).is_err());
    /// ```
    pub fn from_bytes(r: [u8; 32], s: [u8; 32]) -> Result<Self> {
        Self::from_scalars(U256::from_be_bytes(r), U256::from_be_bytes(s))
    }

    /// Creates a signature from integer components.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignature`] if `r` or `s` is zero or not below
    /// the curve order.
    ///
    /// # Example
    ///
    /// ```
    /// use evm_signer_core::{Signature, U256};
    ///
    /// let sig = Signature::from_scalars(U256::from(2u8), U256::from(3u8)).unwrap();
    /// assert!(sig.is_low_s());
    /// assert!(Signature::from_scalars(U256::ZERO, U256::from(3u8)).is_err());
    /// ```
    pub fn from_scalars(r: U256, s: U256) -> Result<Self> {
        if r.is_zero() || r >= N {
            return Err(Error::InvalidSignature("r is out of range".to_string()));
        }
        if s.is_zero() || s >= N {
            return Err(Error::InvalidSignature("s is out of range".to_string()));
        }

        Ok(Self {
            r: r.to_be_bytes::<32>(),
            s: s.to_be_bytes::<32>(),
        })
    }

    /// Parses a 64-byte `r || s` slice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSignatureLength`] for any other length, and
    /// [`Error::InvalidSignature`] for out-of-range scalars.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::BYTE_LEN {
            return Err(Error::InvalidSignatureLength(bytes.len()));
        }

        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Self::from_bytes(r, s)
    }

    /// Serializes the signature as `r || s`.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::BYTE_LEN] {
        let mut bytes = [0u8; Self::BYTE_LEN];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..].copy_from_slice(&self.s);
        bytes
    }

    /// Returns the R component of the signature.
    #[must_use]
    pub const fn r(&self) -> &[u8; 32] {
        &self.r
    }

    /// Returns the S component of the signature.
    #[must_use]
    pub const fn s(&self) -> &[u8; 32] {
        &self.s
    }

    /// Returns the R component as a [`U256`].
    #[must_use]
    pub const fn r_u256(&self) -> U256 {
        U256::from_be_bytes(self.r)
    }

    /// Returns the S component as a [`U256`].
    #[must_use]
    pub const fn s_u256(&self) -> U256 {
        U256::from_be_bytes(self.s)
    }

    /// Returns `true` if `s <= n/2` (BIP-0062 canonical form).
    #[must_use]
    pub fn is_low_s(&self) -> bool {
        self.s_u256() <= HALF_N
    }

    /// Encodes the signature as a hex string with `0x` prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Parses a signature from a hex string, optionally prefixed with `0x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HexDecodeFailed`] for invalid hex, otherwise the
    /// errors of [`Signature::from_slice`].
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        Self::from_slice(&hex::decode(hex_str)?)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for Signature {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<Signature> for String {
    fn from(sig: Signature) -> Self {
        sig.to_hex()
    }
}

/// Identifies which of the candidate public keys a signature recovers to.
///
/// - bit 0: parity of the Y coordinate of the ephemeral point `R`
/// - bit 1: set when the X coordinate of `R` was `>= n` and got reduced
///
/// Bit 1 is practically never set, so signing only ever produces ids `0`
/// and `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct RecoveryId(u8);

impl RecoveryId {
    /// The largest valid recovery id.
    pub const MAX: u8 = 3;

    /// Creates a recovery id from its two flags.
    #[must_use]
    pub const fn new(is_y_odd: bool, is_x_reduced: bool) -> Self {
        Self(((is_x_reduced as u8) << 1) | (is_y_odd as u8))
    }

    /// Creates a recovery id from its byte value, `None` if above [`Self::MAX`].
    #[must_use]
    pub const fn from_byte(byte: u8) -> Option<Self> {
        if byte <= Self::MAX {
            Some(Self(byte))
        } else {
            None
        }
    }

    /// Returns the byte value (`0..=3`).
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self.0
    }

    /// Returns `true` if the ephemeral point has an odd Y coordinate.
    #[must_use]
    pub const fn is_y_odd(self) -> bool {
        self.0 & 1 == 1
    }

    /// Returns `true` if the ephemeral point's X coordinate was `>= n`.
    #[must_use]
    pub const fn is_x_reduced(self) -> bool {
        self.0 & 2 == 2
    }
}

impl TryFrom<u8> for RecoveryId {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self> {
        Self::from_byte(byte).ok_or(Error::InvalidVEncoding(u64::from(byte)))
    }
}

impl From<RecoveryId> for u8 {
    fn from(id: RecoveryId) -> Self {
        id.0
    }
}

/// A [`Signature`] together with its [`RecoveryId`].
///
/// # Wire Format
///
/// Serialized as 65 bytes: `r (32 bytes) || s (32 bytes) || v (1 byte)`,
/// where `v` is the raw recovery id. Parsing also accepts the legacy
/// `27`-offset form of `v`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecoverableSignature {
    signature: Signature,
    recovery_id: RecoveryId,
}

impl RecoverableSignature {
    /// The length of a serialized signature in bytes.
    pub const BYTE_LEN: usize = 65;

    /// Offset added to the recovery id by legacy (pre-EIP-155) encodings.
    pub const LEGACY_V_OFFSET: u8 = 27;

    /// Creates a recoverable signature from its parts.
    #[must_use]
    pub const fn new(signature: Signature, recovery_id: RecoveryId) -> Self {
        Self {
            signature,
            recovery_id,
        }
    }

    /// Parses a 65-byte `r || s || v` slice.
    ///
    /// `v` may be the raw recovery id (`0..=3`) or carry the legacy offset
    /// (`27..=30`); either way it is normalized to the raw id.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSignatureLength`] if the slice is not exactly 65 bytes
    /// - [`Error::InvalidSignature`] if `r` or `s` is out of range
    /// - [`Error::InvalidVEncoding`] if `v` is in neither form
    ///
    /// # Example
    ///
    /// ```
    /// use evm_signer_core::RecoverableSignature;
    ///
    /// let mut bytes = [0u8; 65];
    /// bytes[31] = 1;
    /// bytes[63] = 1;
    /// bytes[64] = 28;
    /// let sig = RecoverableSignature::from_bytes(&bytes).unwrap();
    /// assert_eq!(sig.v(), 1);
    /// ```
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::BYTE_LEN {
            return Err(Error::InvalidSignatureLength(bytes.len()));
        }

        let signature = Signature::from_slice(&bytes[..64])?;
        let recovery_id = normalize_v(bytes[64])?;

        Ok(Self::new(signature, recovery_id))
    }

    /// Serializes the signature to a 65-byte array `r || s || v`.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::BYTE_LEN] {
        let mut bytes = [0u8; Self::BYTE_LEN];
        bytes[..64].copy_from_slice(&self.signature.to_bytes());
        bytes[64] = self.recovery_id.to_byte();
        bytes
    }

    /// Returns the `(r, s)` signature.
    #[must_use]
    pub const fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Returns the recovery id.
    #[must_use]
    pub const fn recovery_id(&self) -> RecoveryId {
        self.recovery_id
    }

    /// Returns the R component of the signature.
    #[must_use]
    pub const fn r(&self) -> &[u8; 32] {
        self.signature.r()
    }

    /// Returns the S component of the signature.
    #[must_use]
    pub const fn s(&self) -> &[u8; 32] {
        self.signature.s()
    }

    /// Returns the recovery parameter (`v`) without any offset.
    #[must_use]
    pub const fn v(&self) -> u8 {
        self.recovery_id.to_byte()
    }

    /// Encodes the signature as a hex string with `0x` prefix.
    ///
    /// # Example
    ///
    /// ```
    /// use evm_signer_core::RecoverableSignature;
    ///
    /// let hex = format!("0x{}01{}01{}", "00".repeat(31), "00".repeat(31), "00");
    /// let sig = RecoverableSignature::from_hex(&hex).unwrap();
    /// assert_eq!(sig.to_hex(), hex);
    /// assert_eq!(sig.to_hex().len(), 132); // "0x" + 130 hex chars
    /// ```
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Parses a signature from a hex string, optionally prefixed with `0x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HexDecodeFailed`] if the hex string is invalid,
    /// otherwise the errors of [`RecoverableSignature::from_bytes`].
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)?;
        Self::from_bytes(&bytes)
    }
}

/// Maps a raw or `27`-offset `v` byte to a recovery id.
fn normalize_v(v: u8) -> Result<RecoveryId> {
    let raw = match v {
        0..=RecoveryId::MAX => v,
        27..=30 => v - RecoverableSignature::LEGACY_V_OFFSET,
        _ => return Err(Error::InvalidVEncoding(u64::from(v))),
    };

    Ok(RecoveryId(raw))
}

impl fmt::Display for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for RecoverableSignature {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<RecoverableSignature> for String {
    fn from(sig: RecoverableSignature) -> Self {
        sig.to_hex()
    }
}
