//! The historical 65-byte compact signature format.
//!
//! Unlike [`RecoverableSignature::to_bytes`], which places the recovery id
//! last, this format leads with a header byte:
//!
//! ```text
//! v (1 byte) || r (32 bytes) || s (32 bytes)
//! ```
//!
//! | `v`       | meaning                                   |
//! |-----------|-------------------------------------------|
//! | `27..=30` | recovery id `v - 27`, uncompressed key    |
//! | `31..=34` | recovery id `v - 31`, compressed key      |
//!
//! The compressed flag only tells the verifier how the signer serialized its
//! public key; it does not change the recovered point.
//!
//! # Example
//!
//! ```
//! use alloy_primitives::B256;
//! use evm_signer_core::{PrivateKey, compact};
//!
//! let key = PrivateKey::from_hex(
//!     "0x22861a2fbd5c05cf30e86a3370bbbc7d122e83aa4b2530629d14ae6ada41cc7b",
//! )
//! .unwrap();
//! let hash = B256::repeat_byte(0x11);
//!
//! let bytes = compact::sign_compact(&key, &hash, true).unwrap();
//! let (public_key, compressed) = compact::recover_compact(&bytes, &hash).unwrap();
//! assert_eq!(&public_key, key.public_key());
//! assert!(compressed);
//! ```

use alloy_primitives::B256;

use crate::crypto;
use crate::error::{Error, Result};
use crate::keys::{PrivateKey, PublicKey};
use crate::signature::{RecoverableSignature, RecoveryId, Signature};

/// Length of a compact signature.
pub const COMPACT_LEN: usize = 65;

const HEADER_BASE: u8 = 27;
const COMPRESSED_FLAG: u8 = 4;

/// Encodes a signature in compact form.
#[must_use]
pub fn encode(signature: &RecoverableSignature, compressed: bool) -> [u8; COMPACT_LEN] {
    let mut header = HEADER_BASE + signature.v();
    if compressed {
        header += COMPRESSED_FLAG;
    }

    let mut out = [0u8; COMPACT_LEN];
    out[0] = header;
    out[1..].copy_from_slice(&signature.signature().to_bytes());
    out
}

/// Decodes a compact signature into the signature and the compressed flag.
///
/// # Errors
///
/// - [`Error::InvalidSignatureLength`] if `bytes` is not 65 bytes long
/// - [`Error::InvalidVEncoding`] if the header is outside `27..=34`
/// - [`Error::InvalidSignature`] if `r` or `s` is out of range
pub fn decode(bytes: &[u8]) -> Result<(RecoverableSignature, bool)> {
    if bytes.len() != COMPACT_LEN {
        return Err(Error::InvalidSignatureLength(bytes.len()));
    }

    let header = bytes[0];
    let offset = header
        .checked_sub(HEADER_BASE)
        .filter(|offset| *offset < 2 * COMPRESSED_FLAG)
        .ok_or(Error::InvalidVEncoding(u64::from(header)))?;

    let compressed = offset >= COMPRESSED_FLAG;
    let recovery_id = RecoveryId::from_byte(offset % COMPRESSED_FLAG)
        .ok_or(Error::InvalidVEncoding(u64::from(header)))?;
    let signature = Signature::from_slice(&bytes[1..])?;

    Ok((RecoverableSignature::new(signature, recovery_id), compressed))
}

/// Signs `hash` and returns the compact encoding.
///
/// # Errors
///
/// The errors of [`crypto::sign_recoverable`].
pub fn sign_compact(key: &PrivateKey, hash: &B256, compressed: bool) -> Result<[u8; COMPACT_LEN]> {
    let signature = crypto::sign_recoverable(key, hash)?;
    Ok(encode(&signature, compressed))
}

/// Recovers the signer's public key from a compact signature.
///
/// Returns the key and whether the signer declared it compressed.
///
/// # Errors
///
/// The errors of [`decode`], and [`Error::RecoveryFailed`] if no key can be
/// recovered.
pub fn recover_compact(bytes: &[u8], hash: &B256) -> Result<(PublicKey, bool)> {
    let (signature, compressed) = decode(bytes)?;
    let public_key =
        crypto::recover_public_key(signature.recovery_id(), signature.signature(), hash)?;
    Ok((public_key, compressed))
}
