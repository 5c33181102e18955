//! Keccak hashing helpers.
//!
//! Ethereum uses the original Keccak padding, not the standardized SHA-3 one,
//! so these helpers go through [`alloy_primitives::Keccak256`] and
//! [`sha3::Keccak512`] rather than `sha3::Sha3_*`.
//!
//! Every function hashes the concatenation of its parts in order.
//!
//! # Example
//!
//! ```
//! use evm_signer_core::hash::{keccak256, method_signature};
//!
//! let digest = keccak256([b"hel".as_slice(), b"lo".as_slice()]);
//! assert_eq!(digest, keccak256([b"hello"]));
//!
//! let selector = method_signature("totalSupply");
//! assert_eq!(hex::encode(selector), "18160ddd");
//! ```

use alloy_primitives::{B256, B512, Keccak256, Selector};
use sha3::{Digest, Keccak512};

/// Computes the Keccak-256 digest of the concatenated `parts`.
#[must_use]
pub fn keccak256<I, T>(parts: I) -> B256
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut hasher = Keccak256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

/// Computes the Keccak-512 digest of the concatenated `parts`.
#[must_use]
pub fn keccak512<I, T>(parts: I) -> B512
where
    I: IntoIterator<Item = T>,
    T: AsRef<[u8]>,
{
    let mut hasher = Keccak512::new();
    for part in parts {
        hasher.update(part.as_ref());
    }
    B512::from_slice(&hasher.finalize())
}

/// Derives the 4-byte selector of a method that takes no arguments.
///
/// `name` is the bare method name; `"()"` is appended before hashing.
#[must_use]
pub fn method_signature(name: &str) -> Selector {
    let digest = keccak256([name.as_bytes(), b"()".as_slice()]);
    Selector::from_slice(&digest[..4])
}

/// Computes the log topic of a canonical event signature such as
/// `"Transfer(address,address,uint256)"`.
#[must_use]
pub fn event_topic(signature: &str) -> B256 {
    keccak256([signature.as_bytes()])
}
