//! Ethereum address derivation from secp256k1 public keys.
//!
//! The address of a key is the last 20 bytes of the Keccak-256 hash of its
//! uncompressed `X || Y` coordinates (the `0x04` prefix is not hashed).
//!
//! # Example
//!
//! ```
//! use evm_signer_core::{Address, PrivateKey};
//!
//! let mut secret = [0u8; 32];
//! secret[31] = 1;
//! let key = PrivateKey::from_bytes(&secret).unwrap();
//!
//! assert_eq!(
//!     key.address().to_hex(),
//!     "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
//! );
//! assert!(Address::zero().is_zero());
//! ```

use core::fmt;
use core::str::FromStr;

use alloy_primitives::Address as AlloyAddress;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::keccak256;
use crate::keys::PublicKey;

/// An Ethereum address (20 bytes).
///
/// This is a wrapper around [`alloy_primitives::Address`] that adds
/// derivation from [`PublicKey`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(AlloyAddress);

impl Address {
    /// The length of an Ethereum address in bytes.
    pub const BYTE_LEN: usize = 20;

    /// Creates a new address from a 20-byte array.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The raw 20 address bytes
    ///
    /// # Example
    ///
    /// ```
    /// use evm_signer_core::Address;
    ///
    /// let addr = Address::new([0x35; 20]);
    /// assert_eq!(addr.to_hex(), "0x3535353535353535353535353535353535353535");
    /// ```
    #[must_use]
    pub const fn new(bytes: [u8; Self::BYTE_LEN]) -> Self {
        Self(AlloyAddress::new(bytes))
    }

    /// Returns the zero address (`0x0000...0000`).
    #[must_use]
    pub const fn zero() -> Self {
        Self(AlloyAddress::ZERO)
    }

    /// Checks if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Derives the address of a public key.
    ///
    /// # Returns
    ///
    /// The last 20 bytes of `keccak256(X || Y)`.
    #[must_use]
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let uncompressed = public_key.serialize_uncompressed();
        Self::from_coordinates(&uncompressed[1..])
    }

    /// Derives an address from raw uncompressed public key bytes.
    ///
    /// Accepts either 65 bytes (`0x04 || X || Y`) or 64 bytes (`X || Y`).
    /// The point itself is not validated; use [`PublicKey::parse`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyLength`] if the byte length is not 64 or 65,
    /// and [`Error::InvalidMagicByte`] if a 65-byte key does not start with
    /// `0x04`.
    ///
    /// # Example
    ///
    /// ```
    /// use evm_signer_core::Address;
    ///
    /// let with_prefix = [&[0x04u8][..], &[0u8; 64][..]].concat();
    /// assert_eq!(
    ///     Address::from_public_key_bytes(&with_prefix).unwrap(),
    ///     Address::from_public_key_bytes(&[0u8; 64]).unwrap(),
    /// );
    /// ```
    pub fn from_public_key_bytes(bytes: &[u8]) -> Result<Self> {
        let coordinates = match bytes.len() {
            64 => bytes,
            65 => {
                if bytes[0] != 0x04 {
                    return Err(Error::InvalidMagicByte(bytes[0]));
                }
                &bytes[1..]
            }
            len => return Err(Error::InvalidKeyLength(len)),
        };

        Ok(Self::from_coordinates(coordinates))
    }

    fn from_coordinates(coordinates: &[u8]) -> Self {
        let hash = keccak256([coordinates]);
        Self(AlloyAddress::from_slice(&hash[12..]))
    }

    /// Returns the [`Address`] as a byte slice.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; Self::BYTE_LEN] {
        self.0.as_ref()
    }

    /// Returns the [`Address`] as a 20-byte array.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; Self::BYTE_LEN] {
        self.0.0.0
    }

    /// Returns the [`Address`] as an EIP-55 checksummed hex string.
    #[must_use]
    pub fn to_checksum_hex(&self) -> String {
        self.0.to_checksum(None)
    }

    /// Returns the [`Address`] as a lowercase hex string with `0x` prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.as_bytes()))
    }

    /// Parses an [`Address`] from a hex string, optionally prefixed with `0x`.
    ///
    /// The checksum of mixed-case input is not enforced.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HexDecodeFailed`] if the hex string is invalid, or
    /// [`Error::InvalidAddress`] if the decoded bytes are not 20 bytes.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)?;

        if bytes.len() != Self::BYTE_LEN {
            return Err(Error::InvalidAddress(format!(
                "expected {} bytes, got {}",
                Self::BYTE_LEN,
                bytes.len()
            )));
        }

        Ok(Self(AlloyAddress::from_slice(&bytes)))
    }

    /// Returns the inner [`alloy_primitives::Address`].
    #[must_use]
    pub const fn inner(&self) -> AlloyAddress {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_checksum_hex())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl From<AlloyAddress> for Address {
    fn from(addr: AlloyAddress) -> Self {
        Self(addr)
    }
}

impl From<Address> for AlloyAddress {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self::new(bytes)
    }
}

impl From<&PublicKey> for Address {
    fn from(public_key: &PublicKey) -> Self {
        Self::from_public_key(public_key)
    }
}
