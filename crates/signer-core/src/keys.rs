//! secp256k1 private and public keys.
//!
//! [`PrivateKey`] holds the secret scalar together with its derived
//! [`PublicKey`] so that signing never recomputes `d·G`. The scalar is wiped
//! from memory on drop.
//!
//! # Public Key Encodings
//!
//! | Format       | Length | Prefix          |
//! |--------------|--------|-----------------|
//! | compressed   | 33     | `0x02` / `0x03` |
//! | uncompressed | 65     | `0x04`          |
//! | hybrid       | 65     | `0x06` / `0x07` |
//!
//! Compressed and hybrid prefixes carry the parity of `Y` in their low bit.
//!
//! # Example
//!
//! ```
//! use evm_signer_core::{PrivateKey, PublicKey};
//!
//! let key = PrivateKey::from_hex(
//!     "0x4646464646464646464646464646464646464646464646464646464646464646",
//! )
//! .unwrap();
//!
//! let compressed = key.public_key().serialize_compressed();
//! assert_eq!(PublicKey::parse(&compressed).unwrap(), *key.public_key());
//! ```

use core::fmt;

use alloy_primitives::{B256, U256};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::address::Address;
use crate::crypto;
use crate::curve::{self, AffinePoint, N, P};
use crate::error::{Error, Result};
use crate::signature::{RecoverableSignature, Signature};

/// Maximum number of 32-byte draws [`PrivateKey::generate`] makes before
/// giving up on the randomness source.
pub const MAX_GENERATE_ATTEMPTS: usize = 64;

/// A source of random bytes for key generation.
///
/// Implemented by [`OsRandom`] for production use. Tests can provide a
/// scripted source to drive [`PrivateKey::generate`] deterministically.
pub trait RandomSource {
    /// Fills `dest` entirely with random bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RandomnessUnavailable`] if the source cannot produce
    /// bytes.
    fn read(&mut self, dest: &mut [u8]) -> Result<()>;
}

/// The operating system's random number generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn read(&mut self, dest: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| Error::RandomnessUnavailable(e.to_string()))
    }
}

/// A secp256k1 private key.
///
/// The scalar is always in `[1, n-1]`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PrivateKey {
    secret: [u8; 32],
    #[zeroize(skip)]
    public: PublicKey,
}

impl PrivateKey {
    /// The length of a serialized private key in bytes.
    pub const BYTE_LEN: usize = 32;

    /// Generates a key from `rng` by rejection sampling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RandomnessUnavailable`] if `rng` fails, or if it
    /// produced no scalar in `[1, n-1]` within [`MAX_GENERATE_ATTEMPTS`]
    /// draws.
    pub fn generate<R: RandomSource + ?Sized>(rng: &mut R) -> Result<Self> {
        let mut candidate = [0u8; Self::BYTE_LEN];

        for attempt in 1..=MAX_GENERATE_ATTEMPTS {
            rng.read(&mut candidate)?;

            if let Ok(key) = Self::from_bytes(&candidate) {
                candidate.zeroize();
                tracing::debug!(attempt, address = %key.address(), "generated private key");
                return Ok(key);
            }
            tracing::trace!(attempt, "rejected out-of-range key candidate");
        }

        candidate.zeroize();
        Err(Error::RandomnessUnavailable(format!(
            "no valid scalar after {MAX_GENERATE_ATTEMPTS} draws"
        )))
    }

    /// Generates a key from the operating system's random number generator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RandomnessUnavailable`] if the OS source fails.
    pub fn random() -> Result<Self> {
        Self::generate(&mut OsRandom)
    }

    /// Creates a key from a big-endian scalar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScalarOutOfRange`] if the scalar is zero or `>= n`.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let scalar = U256::from_be_bytes(*bytes);
        if scalar.is_zero() || scalar >= N {
            return Err(Error::ScalarOutOfRange);
        }

        let point = curve::scalar_base_mult(scalar).ok_or(Error::ScalarOutOfRange)?;

        Ok(Self {
            secret: *bytes,
            public: PublicKey { point },
        })
    }

    /// Creates a key from a 32-byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKeyLength`] for any other length, otherwise
    /// the errors of [`PrivateKey::from_bytes`].
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let bytes: &[u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::InvalidKeyLength(bytes.len()))?;
        Self::from_bytes(bytes)
    }

    /// Parses a key from a hex string, optionally prefixed with `0x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HexDecodeFailed`] for invalid hex, otherwise the
    /// errors of [`PrivateKey::from_slice`].
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let mut bytes = hex::decode(hex_str)?;
        let key = Self::from_slice(&bytes);
        bytes.zeroize();
        key
    }

    /// Returns the big-endian scalar.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; 32] {
        self.secret
    }

    /// Encodes the scalar as a lower-case hex string with `0x` prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.secret))
    }

    /// Returns the matching public key.
    #[must_use]
    pub const fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Returns the Ethereum address of the matching public key.
    #[must_use]
    pub fn address(&self) -> Address {
        self.public.address()
    }

    /// Signs a 32-byte digest with a deterministic (RFC 6979) nonce.
    ///
    /// The returned signature is in low-S form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonceExhausted`] if no usable nonce was found, which
    /// does not happen in practice.
    pub fn sign(&self, hash: &B256) -> Result<Signature> {
        crypto::sign_hash(self, hash)
    }

    /// Signs a digest and attaches the recovery id for this key.
    ///
    /// # Errors
    ///
    /// See [`PrivateKey::sign`]. Additionally returns
    /// [`Error::RecoveryIdDerivationFailed`] if no recovery id reproduces the
    /// public key.
    pub fn sign_recoverable(&self, hash: &B256) -> Result<RecoverableSignature> {
        crypto::sign_recoverable(self, hash)
    }

    pub(crate) const fn secret(&self) -> &[u8; 32] {
        &self.secret
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("secret", &"<redacted>")
            .field("public", &self.public)
            .finish()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.secret == other.secret
    }
}

impl Eq for PrivateKey {}

/// A secp256k1 public key: a finite point on the curve.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey {
    point: AffinePoint,
}

impl PublicKey {
    /// Length of the compressed encoding.
    pub const COMPRESSED_LEN: usize = 33;

    /// Length of the uncompressed and hybrid encodings.
    pub const UNCOMPRESSED_LEN: usize = 65;

    /// Creates a public key from a point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CoordinateOutOfRange`] or [`Error::PointNotOnCurve`]
    /// if the point is not a valid curve point.
    pub fn from_point(point: AffinePoint) -> Result<Self> {
        if point.x >= P {
            return Err(Error::CoordinateOutOfRange("X"));
        }
        if point.y >= P {
            return Err(Error::CoordinateOutOfRange("Y"));
        }
        if !point.is_on_curve() {
            return Err(Error::PointNotOnCurve);
        }
        Ok(Self { point })
    }

    /// Parses a compressed, uncompressed or hybrid public key.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidKeyLength`] if `bytes` is neither 33 nor 65 bytes long
    /// - [`Error::InvalidMagicByte`] if the prefix does not fit the length
    /// - [`Error::CoordinateOutOfRange`] if `X` or `Y` is `>= P`
    /// - [`Error::PointNotOnCurve`] if the point is off the curve, or a
    ///   compressed `X` has no matching `Y`
    /// - [`Error::YBitMismatch`] if a hybrid prefix contradicts the parity of `Y`
    ///
    /// # Example
    ///
    /// ```
    /// use evm_signer_core::{PrivateKey, PublicKey};
    ///
    /// let key = PrivateKey::from_bytes(&[0x46; 32]).unwrap();
    /// let compressed = key.public_key().serialize_compressed();
    ///
    /// let parsed = PublicKey::parse(&compressed).unwrap();
    /// assert_eq!(&parsed, key.public_key());
    /// assert!(PublicKey::parse(&compressed[..32]).is_err());
    /// ```
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        match bytes.len() {
            Self::COMPRESSED_LEN => {
                let format = bytes[0];
                if format != 0x02 && format != 0x03 {
                    return Err(Error::InvalidMagicByte(format));
                }

                let x = U256::from_be_slice(&bytes[1..]);
                let y = curve::decompress_point(x, format == 0x03)?;
                Ok(Self {
                    point: AffinePoint::new(x, y),
                })
            }
            Self::UNCOMPRESSED_LEN => {
                let format = bytes[0];
                let hybrid = match format {
                    0x04 => false,
                    0x06 | 0x07 => true,
                    _ => return Err(Error::InvalidMagicByte(format)),
                };

                let x = U256::from_be_slice(&bytes[1..33]);
                let y = U256::from_be_slice(&bytes[33..]);
                let key = Self::from_point(AffinePoint::new(x, y))?;

                if hybrid && key.point.is_y_odd() != (format == 0x07) {
                    return Err(Error::YBitMismatch);
                }
                Ok(key)
            }
            len => Err(Error::InvalidKeyLength(len)),
        }
    }

    /// Parses a hex-encoded public key, optionally prefixed with `0x`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::HexDecodeFailed`] for invalid hex, otherwise the
    /// errors of [`PublicKey::parse`].
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        Self::parse(&hex::decode(hex_str)?)
    }

    /// Returns the underlying curve point.
    #[must_use]
    pub const fn point(&self) -> &AffinePoint {
        &self.point
    }

    /// Returns the X coordinate.
    #[must_use]
    pub const fn x(&self) -> U256 {
        self.point.x
    }

    /// Returns the Y coordinate.
    #[must_use]
    pub const fn y(&self) -> U256 {
        self.point.y
    }

    /// Serializes as `[0x02 | 0x03] || X`.
    #[must_use]
    pub fn serialize_compressed(&self) -> [u8; Self::COMPRESSED_LEN] {
        let mut out = [0u8; Self::COMPRESSED_LEN];
        out[0] = 0x02 | u8::from(self.point.is_y_odd());
        out[1..].copy_from_slice(&self.point.x.to_be_bytes::<32>());
        out
    }

    /// Serializes as `0x04 || X || Y`.
    #[must_use]
    pub fn serialize_uncompressed(&self) -> [u8; Self::UNCOMPRESSED_LEN] {
        self.serialize_with_prefix(0x04)
    }

    /// Serializes as `[0x06 | 0x07] || X || Y`.
    #[must_use]
    pub fn serialize_hybrid(&self) -> [u8; Self::UNCOMPRESSED_LEN] {
        self.serialize_with_prefix(0x06 | u8::from(self.point.is_y_odd()))
    }

    fn serialize_with_prefix(&self, prefix: u8) -> [u8; Self::UNCOMPRESSED_LEN] {
        let mut out = [0u8; Self::UNCOMPRESSED_LEN];
        out[0] = prefix;
        out[1..33].copy_from_slice(&self.point.x.to_be_bytes::<32>());
        out[33..].copy_from_slice(&self.point.y.to_be_bytes::<32>());
        out
    }

    /// Encodes the uncompressed form as hex with `0x` prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.serialize_uncompressed()))
    }

    /// Encodes the compressed form as hex with `0x` prefix.
    #[must_use]
    pub fn to_compressed_hex(&self) -> String {
        format!("0x{}", hex::encode(self.serialize_compressed()))
    }

    /// Derives the Ethereum address of this key.
    #[must_use]
    pub fn address(&self) -> Address {
        Address::from_public_key(self)
    }

    /// Checks a signature over `hash` against this key.
    #[must_use]
    pub fn verify(&self, hash: &B256, signature: &Signature) -> bool {
        crypto::verify_signature(hash, signature, self)
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey")
            .field(&self.to_compressed_hex())
            .finish()
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for PublicKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::from_hex(&value)
    }
}

impl From<PublicKey> for String {
    fn from(key: PublicKey) -> Self {
        key.to_hex()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::curve::{G, GX, GY};

    const FIXTURE_KEY: &str = "22861a2fbd5c05cf30e86a3370bbbc7d122e83aa4b2530629d14ae6ada41cc7b";
    const FIXTURE_PUBKEY: &str = "0494058d7c0e28c3c8ec8ec5fb980da343f4e0217371517d2895bba659bedb48faeaa0f861466ad726bed3cf3081f7be8e103e2814e0423ab50eae462db41e4c0a";

    /// A random source replaying scripted draws.
    struct MockRandom {
        draws: VecDeque<[u8; 32]>,
    }

    impl MockRandom {
        fn new(draws: Vec<[u8; 32]>) -> Self {
            Self {
                draws: draws.into_iter().collect(),
            }
        }
    }

    impl RandomSource for MockRandom {
        fn read(&mut self, dest: &mut [u8]) -> Result<()> {
            let draw = self
                .draws
                .pop_front()
                .ok_or_else(|| Error::RandomnessUnavailable("exhausted".to_string()))?;
            dest.copy_from_slice(&draw[..dest.len()]);
            Ok(())
        }
    }

    fn scalar(byte: u8) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[31] = byte;
        bytes
    }

    #[test]
    fn key_one_is_generator() {
        let key = PrivateKey::from_bytes(&scalar(1)).unwrap();
        assert_eq!(key.public_key().point(), &G);
        assert_eq!(
            key.address().to_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn from_bytes_rejects_out_of_range() {
        assert!(matches!(
            PrivateKey::from_bytes(&[0u8; 32]),
            Err(Error::ScalarOutOfRange)
        ));
        assert!(matches!(
            PrivateKey::from_bytes(&N.to_be_bytes::<32>()),
            Err(Error::ScalarOutOfRange)
        ));
        assert!(matches!(
            PrivateKey::from_bytes(&[0xff; 32]),
            Err(Error::ScalarOutOfRange)
        ));
    }

    #[test]
    fn from_slice_checks_length() {
        assert!(matches!(
            PrivateKey::from_slice(&[1u8; 31]),
            Err(Error::InvalidKeyLength(31))
        ));
    }

    #[test]
    fn hex_roundtrip() {
        let key = PrivateKey::from_hex(FIXTURE_KEY).unwrap();
        assert_eq!(key.to_hex(), format!("0x{FIXTURE_KEY}"));
        assert_eq!(PrivateKey::from_hex(&key.to_hex()).unwrap(), key);
        assert_eq!(key.public_key().to_hex(), format!("0x{FIXTURE_PUBKEY}"));
    }

    #[test]
    fn debug_redacts_secret() {
        let key = PrivateKey::from_hex(FIXTURE_KEY).unwrap();
        let debug = format!("{key:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains(FIXTURE_KEY));
    }

    #[test]
    fn generate_skips_invalid_draws() {
        let mut rng = MockRandom::new(vec![[0u8; 32], [0xff; 32], scalar(1)]);
        let key = PrivateKey::generate(&mut rng).unwrap();
        assert_eq!(key.to_bytes(), scalar(1));
        assert!(rng.draws.is_empty());
    }

    #[test]
    fn generate_propagates_source_failure() {
        let mut rng = MockRandom::new(vec![]);
        assert!(matches!(
            PrivateKey::generate(&mut rng),
            Err(Error::RandomnessUnavailable(_))
        ));
    }

    #[test]
    fn generate_gives_up_on_broken_source() {
        let mut rng = MockRandom::new(vec![[0u8; 32]; MAX_GENERATE_ATTEMPTS + 1]);
        assert!(matches!(
            PrivateKey::generate(&mut rng),
            Err(Error::RandomnessUnavailable(_))
        ));
        assert_eq!(rng.draws.len(), 1);
    }

    #[test]
    fn random_keys_differ() {
        let a = PrivateKey::random().unwrap();
        let b = PrivateKey::random().unwrap();
        assert_ne!(a, b);
        assert!(a.public_key().point().is_on_curve());
    }

    #[test]
    fn serialization_formats() {
        let key = PublicKey::from_hex(FIXTURE_PUBKEY).unwrap();

        let compressed = key.serialize_compressed();
        assert_eq!(compressed[0], 0x02);
        assert_eq!(&compressed[1..], &key.serialize_uncompressed()[1..33]);

        let hybrid = key.serialize_hybrid();
        assert_eq!(hybrid[0], 0x06);
        assert_eq!(&hybrid[1..], &key.serialize_uncompressed()[1..]);

        assert_eq!(PublicKey::parse(&compressed).unwrap(), key);
        assert_eq!(PublicKey::parse(&hybrid).unwrap(), key);
        assert_eq!(
            key.to_compressed_hex(),
            format!("0x02{}", &FIXTURE_PUBKEY[2..66])
        );
    }

    #[test]
    fn odd_y_prefixes() {
        // -G has an odd Y coordinate.
        let key = PublicKey::from_point(AffinePoint::new(GX, P - GY)).unwrap();
        assert_eq!(key.serialize_compressed()[0], 0x03);
        assert_eq!(key.serialize_hybrid()[0], 0x07);
        assert_eq!(PublicKey::parse(&key.serialize_compressed()).unwrap(), key);
    }

    #[test]
    fn parse_rejects_bad_length() {
        assert!(matches!(
            PublicKey::parse(&[0u8; 10]),
            Err(Error::InvalidKeyLength(10))
        ));
        assert!(matches!(
            PublicKey::parse(&[]),
            Err(Error::InvalidKeyLength(0))
        ));
    }

    #[test]
    fn parse_rejects_bad_magic() {
        let key = PublicKey::from_hex(FIXTURE_PUBKEY).unwrap();

        let mut compressed = key.serialize_compressed();
        compressed[0] = 0x04;
        assert!(matches!(
            PublicKey::parse(&compressed),
            Err(Error::InvalidMagicByte(0x04))
        ));

        let mut uncompressed = key.serialize_uncompressed();
        uncompressed[0] = 0x05;
        assert!(matches!(
            PublicKey::parse(&uncompressed),
            Err(Error::InvalidMagicByte(0x05))
        ));
    }

    #[test]
    fn parse_rejects_hybrid_parity_mismatch() {
        let key = PublicKey::from_hex(FIXTURE_PUBKEY).unwrap();
        let mut hybrid = key.serialize_hybrid();
        hybrid[0] = 0x07;
        assert!(matches!(
            PublicKey::parse(&hybrid),
            Err(Error::YBitMismatch)
        ));
    }

    #[test]
    fn parse_rejects_out_of_range_coordinates() {
        let mut compressed = [0xffu8; 33];
        compressed[0] = 0x02;
        assert!(matches!(
            PublicKey::parse(&compressed),
            Err(Error::CoordinateOutOfRange("X"))
        ));

        let mut uncompressed = PublicKey::from_hex(FIXTURE_PUBKEY)
            .unwrap()
            .serialize_uncompressed();
        uncompressed[33..].copy_from_slice(&[0xff; 32]);
        assert!(matches!(
            PublicKey::parse(&uncompressed),
            Err(Error::CoordinateOutOfRange("Y"))
        ));
    }

    #[test]
    fn parse_rejects_off_curve() {
        let mut uncompressed = PublicKey::from_hex(FIXTURE_PUBKEY)
            .unwrap()
            .serialize_uncompressed();
        uncompressed[64] ^= 1;
        assert!(matches!(
            PublicKey::parse(&uncompressed),
            Err(Error::PointNotOnCurve)
        ));

        let mut compressed = [0u8; 33];
        compressed[0] = 0x02;
        compressed[32] = 5;
        assert!(matches!(
            PublicKey::parse(&compressed),
            Err(Error::PointNotOnCurve)
        ));
    }

    #[test]
    fn serde_as_hex_string() {
        let key = PublicKey::from_hex(FIXTURE_PUBKEY).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, format!("\"0x{FIXTURE_PUBKEY}\""));
        assert_eq!(serde_json::from_str::<PublicKey>(&json).unwrap(), key);
    }
}
