//! ECDSA signing, verification and public key recovery over secp256k1.
//!
//! This module provides:
//!
//! - Deterministic signing with RFC 6979 nonces ([`sign_hash`])
//! - Signature normalization (low-S)
//! - Public key recovery from a signature and its recovery id
//! - Recovery id calculation against a known public key
//! - Signature verification
//!
//! # Recovery
//!
//! [`recover_public_key`] expects the exact recovery id. Searching over the
//! candidate ids is the job of [`derive_recovery_id`], which the signing path
//! uses to attach an id to a fresh signature.
//!
//! # Example
//!
//! ```
//! use alloy_primitives::B256;
//! use evm_signer_core::PrivateKey;
//! use evm_signer_core::crypto::{recover_public_key, sign_recoverable};
//!
//! let key = PrivateKey::from_hex(
//!     "0x4646464646464646464646464646464646464646464646464646464646464646",
//! )
//! .unwrap();
//! let hash = B256::repeat_byte(0xab);
//!
//! let sig = sign_recoverable(&key, &hash).unwrap();
//! let recovered = recover_public_key(sig.recovery_id(), sig.signature(), &hash).unwrap();
//! assert_eq!(&recovered, key.public_key());
//! ```

use alloy_primitives::{B256, U256};

use crate::curve::{self, AffinePoint, HALF_N, N, P};
use crate::error::{Error, Result};
use crate::keys::{PrivateKey, PublicKey};
use crate::nonce::NonceGenerator;
use crate::signature::{RecoverableSignature, RecoveryId, Signature};

/// Interprets a digest as an integer modulo `n`.
fn hash_to_scalar(hash: &B256) -> U256 {
    U256::from_be_bytes(hash.0).reduce_mod(N)
}

/// Signs a 32-byte digest.
///
/// The nonce is derived deterministically from the key and the digest, so
/// the same inputs always yield the same signature. Candidates leading to
/// `r = 0` or `s = 0` are skipped. The result is in low-S form.
///
/// # Errors
///
/// Returns [`Error::NonceExhausted`] if the nonce generator hits its retry
/// bound, and [`Error::SigningFailed`] on an arithmetic inconsistency.
pub fn sign_hash(key: &PrivateKey, hash: &B256) -> Result<Signature> {
    let d = U256::from_be_bytes(*key.secret());
    let e = hash_to_scalar(hash);
    let mut nonces = NonceGenerator::new(key.secret(), hash)?;

    loop {
        let k = nonces.next_candidate()?;

        let Some(point) = curve::scalar_base_mult(k) else {
            continue;
        };
        let r = point.x.reduce_mod(N);
        if r.is_zero() {
            tracing::trace!("nonce produced r = 0, retrying");
            continue;
        }

        let k_inv = k
            .inv_mod(N)
            .ok_or_else(|| Error::SigningFailed("nonce is not invertible".to_string()))?;
        let s = k_inv.mul_mod(e.add_mod(r.mul_mod(d, N), N), N);
        if s.is_zero() {
            tracing::trace!("nonce produced s = 0, retrying");
            continue;
        }

        let (s, _) = normalize_s(s);
        return Signature::from_scalars(r, s);
    }
}

/// Normalizes `s` to low-S form.
///
/// Per BIP-62 and EIP-2, the S value should be in the lower half of the curve
/// order to prevent signature malleability.
///
/// Returns the normalized value and whether it was negated. Negating `s`
/// flips the parity of the recovery id.
///
/// # Example
///
/// ```
/// use alloy_primitives::U256;
/// use evm_signer_core::crypto::normalize_s;
/// use evm_signer_core::curve::N;
///
/// let (s, flipped) = normalize_s(N - U256::from(1));
/// assert_eq!(s, U256::from(1));
/// assert!(flipped);
/// ```
#[must_use]
pub fn normalize_s(s: U256) -> (U256, bool) {
    if s > HALF_N { (N - s, true) } else { (s, false) }
}

/// Signs a digest and attaches the recovery id matching `key`.
///
/// # Errors
///
/// The errors of [`sign_hash`] and [`derive_recovery_id`].
pub fn sign_recoverable(key: &PrivateKey, hash: &B256) -> Result<RecoverableSignature> {
    let signature = sign_hash(key, hash)?;
    let recovery_id = derive_recovery_id(hash, &signature, key.public_key())?;

    tracing::debug!(
        hash = %hash,
        recovery_id = recovery_id.to_byte(),
        "signed digest"
    );

    Ok(RecoverableSignature::new(signature, recovery_id))
}

/// Calculates the recovery id for a signature.
///
/// Tries ids `0` and `1` and returns the first whose recovered key equals
/// `public_key`. Ids with the overflow bit set are not tried since `r >= n`
/// has negligible probability.
///
/// # Errors
///
/// Returns [`Error::RecoveryIdDerivationFailed`] if neither id matches.
pub fn derive_recovery_id(
    hash: &B256,
    signature: &Signature,
    public_key: &PublicKey,
) -> Result<RecoveryId> {
    for byte in 0u8..2u8 {
        let id = RecoveryId::new(byte == 1, false);
        if let Ok(recovered) = recover_public_key(id, signature, hash) {
            if recovered == *public_key {
                return Ok(id);
            }
        }
    }

    Err(Error::RecoveryIdDerivationFailed)
}

/// Recovers the public key that produced `signature` over `hash`.
///
/// Computes `Q = r⁻¹ · (s·R − e·G)` where `R` is the ephemeral point
/// selected by `recovery_id`.
///
/// # Errors
///
/// Returns [`Error::RecoveryFailed`] if `R` cannot be reconstructed or the
/// result is the point at infinity.
pub fn recover_public_key(
    recovery_id: RecoveryId,
    signature: &Signature,
    hash: &B256,
) -> Result<PublicKey> {
    let r = signature.r_u256();
    let s = signature.s_u256();

    let x = if recovery_id.is_x_reduced() {
        r.checked_add(N)
            .filter(|x| *x < P)
            .ok_or(Error::RecoveryFailed)?
    } else {
        r
    };

    let y = curve::decompress_point(x, recovery_id.is_y_odd()).map_err(|e| {
        tracing::trace!(error = %e, "no ephemeral point for recovery id");
        Error::RecoveryFailed
    })?;
    let ephemeral = AffinePoint::new(x, y);

    let r_inv = r.inv_mod(N).ok_or(Error::RecoveryFailed)?;
    let e = hash_to_scalar(hash);

    // Q = (-e · r⁻¹)·G + (s · r⁻¹)·R
    let u1 = (N - e).reduce_mod(N).mul_mod(r_inv, N);
    let u2 = s.mul_mod(r_inv, N);

    let point = curve::double_scalar_mult(u1, u2, &ephemeral).ok_or(Error::RecoveryFailed)?;
    PublicKey::from_point(point).map_err(|_| Error::RecoveryFailed)
}

/// Verifies a signature against a public key.
///
/// Both low-S and high-S signatures are accepted.
///
/// # Returns
///
/// [`true`](bool) if the signature is valid, [`false`](bool) otherwise.
#[must_use]
pub fn verify_signature(hash: &B256, signature: &Signature, public_key: &PublicKey) -> bool {
    let r = signature.r_u256();
    let Some(w) = signature.s_u256().inv_mod(N) else {
        return false;
    };

    let u1 = hash_to_scalar(hash).mul_mod(w, N);
    let u2 = r.mul_mod(w, N);

    curve::double_scalar_mult(u1, u2, public_key.point())
        .is_some_and(|point| point.x.reduce_mod(N) == r)
}
