//! Transaction signing and sender recovery.
//!
//! The recovery id of a transaction signature is folded into `v`:
//!
//! | chain id | `v`                  |
//! |----------|----------------------|
//! | `0`      | `27 + id`            |
//! | `C > 0`  | `35 + 2·C + id`      |
//!
//! Signing goes through the [`HashSigner`] trait so that any holder of a key
//! (an in-memory [`PrivateKey`] or an external device) can sign transactions.
//!
//! # Example
//!
//! ```
//! use alloy_primitives::U256;
//! use evm_signer_core::{Address, Eip155Signer, PrivateKey, Transaction};
//!
//! let key = PrivateKey::from_bytes(&[0x46; 32]).unwrap();
//! let signer = Eip155Signer::new(1);
//!
//! let tx = Transaction {
//!     nonce: 9,
//!     gas_price: U256::from(20_000_000_000u64),
//!     gas_limit: 21000,
//!     to: Some(Address::new([0x35; 20])),
//!     value: U256::from(1_000_000_000_000_000_000u128),
//!     ..Transaction::default()
//! };
//!
//! let signed = signer.sign_transaction(&tx, &key).unwrap();
//! assert_eq!(signed.v, 37);
//! assert_eq!(signer.sender(&signed).unwrap(), key.address());
//! ```

use alloy_primitives::B256;

use crate::address::Address;
use crate::crypto::recover_public_key;
use crate::error::{Error, Result};
use crate::keys::PrivateKey;
use crate::signature::{RecoverableSignature, RecoveryId, Signature};
use crate::transaction::Transaction;

/// `v` offset for signatures without replay protection.
pub const LEGACY_V_OFFSET: u64 = 27;

/// `v` offset for EIP-155 signatures, before adding `2 · chain_id`.
pub const EIP155_V_OFFSET: u64 = 35;

/// Something that can sign a 32-byte digest on behalf of an address.
pub trait HashSigner {
    /// Signs `hash`, returning the signature with its recovery id.
    ///
    /// # Errors
    ///
    /// Returns an error if the signer cannot produce a signature.
    fn sign_hash(&self, hash: &B256) -> Result<RecoverableSignature>;

    /// Returns the address whose key produces the signatures.
    fn address(&self) -> Address;
}

impl HashSigner for PrivateKey {
    fn sign_hash(&self, hash: &B256) -> Result<RecoverableSignature> {
        self.sign_recoverable(hash)
    }

    fn address(&self) -> Address {
        self.public_key().address()
    }
}

/// Folds a recovery id and chain into `v`.
///
/// # Errors
///
/// Returns [`Error::InvalidChainId`] if `35 + 2·chain_id + id` overflows.
///
/// # Example
///
/// ```
/// use evm_signer_core::RecoveryId;
/// use evm_signer_core::signer::encode_v;
///
/// assert_eq!(encode_v(RecoveryId::new(true, false), 0).unwrap(), 28);
/// assert_eq!(encode_v(RecoveryId::new(false, false), 1).unwrap(), 37);
/// assert!(encode_v(RecoveryId::new(false, false), u64::MAX).is_err());
/// ```
pub fn encode_v(recovery_id: RecoveryId, chain_id: u64) -> Result<u64> {
    let id = u64::from(recovery_id.to_byte());

    if chain_id == 0 {
        return Ok(LEGACY_V_OFFSET + id);
    }

    chain_id
        .checked_mul(2)
        .and_then(|v| v.checked_add(EIP155_V_OFFSET))
        .and_then(|v| v.checked_add(id))
        .ok_or(Error::InvalidChainId(chain_id))
}

/// Splits `v` into the chain ID and recovery id.
///
/// `27` and `28` map to chain `0`; values from `35` up carry a chain ID.
///
/// # Errors
///
/// Returns [`Error::InvalidVEncoding`] for any other value.
pub fn decode_v(v: u64) -> Result<(u64, RecoveryId)> {
    let (chain_id, parity) = match v {
        27 | 28 => (0, v - LEGACY_V_OFFSET),
        v if v >= EIP155_V_OFFSET => {
            let folded = v - EIP155_V_OFFSET;
            (folded / 2, folded % 2)
        }
        _ => return Err(Error::InvalidVEncoding(v)),
    };

    Ok((chain_id, RecoveryId::new(parity == 1, false)))
}

/// Signs a transaction for its own [`Transaction::chain_id`].
///
/// Returns a copy of `tx` with `v`, `r` and `s` set.
///
/// # Errors
///
/// Returns [`Error::InvalidChainId`] if the chain cannot be encoded, or any
/// error of the signer.
pub fn sign_transaction<S: HashSigner + ?Sized>(tx: &Transaction, signer: &S) -> Result<Transaction> {
    // Surface an unusable chain before spending a signature on it.
    encode_v(RecoveryId::new(true, false), tx.chain_id)?;

    let hash = tx.signing_hash();
    let signature = signer.sign_hash(&hash)?;
    let v = encode_v(signature.recovery_id(), tx.chain_id)?;

    tracing::debug!(
        chain_id = tx.chain_id,
        nonce = tx.nonce,
        v,
        signer = %signer.address(),
        "signed transaction"
    );

    Ok(Transaction {
        v,
        r: signature.signature().r_u256(),
        s: signature.signature().s_u256(),
        ..tx.clone()
    })
}

/// Recovers the address that signed `tx`.
///
/// The chain ID used for the signing hash is taken from `v`, not from
/// [`Transaction::chain_id`].
///
/// # Errors
///
/// - [`Error::InvalidVEncoding`] if `v` is malformed
/// - [`Error::InvalidSignature`] if `r` or `s` is out of range
/// - [`Error::SenderRecoveryFailed`] if no public key can be recovered
pub fn recover_sender(tx: &Transaction) -> Result<Address> {
    let (chain_id, recovery_id) = decode_v(tx.v)?;
    let signature = Signature::from_scalars(tx.r, tx.s)?;
    let hash = tx.signing_hash_for_chain(chain_id);

    let public_key = recover_public_key(recovery_id, &signature, &hash)
        .map_err(|e| Error::SenderRecoveryFailed(Box::new(e)))?;
    let sender = public_key.address();

    tracing::debug!(chain_id, sender = %sender, "recovered transaction sender");

    Ok(sender)
}

/// Signs and verifies transactions for one fixed chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Eip155Signer {
    chain_id: u64,
}

impl Eip155Signer {
    /// Creates a signer for `chain_id`.
    #[must_use]
    pub const fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    /// Returns the chain this signer is bound to.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Returns the hash to sign for `tx` on this chain.
    #[must_use]
    pub fn signing_hash(&self, tx: &Transaction) -> B256 {
        tx.signing_hash_for_chain(self.chain_id)
    }

    /// Stamps this signer's chain into `tx` and signs it.
    ///
    /// # Errors
    ///
    /// The errors of [`sign_transaction`].
    pub fn sign_transaction<S: HashSigner + ?Sized>(
        &self,
        tx: &Transaction,
        signer: &S,
    ) -> Result<Transaction> {
        let stamped = Transaction {
            chain_id: self.chain_id,
            ..tx.clone()
        };
        sign_transaction(&stamped, signer)
    }

    /// Recovers the sender of a transaction signed for this chain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChainIdMismatch`] if `v` encodes another chain,
    /// otherwise the errors of [`recover_sender`].
    pub fn sender(&self, tx: &Transaction) -> Result<Address> {
        let (chain_id, _) = decode_v(tx.v)?;
        if chain_id != self.chain_id {
            return Err(Error::ChainIdMismatch {
                expected: self.chain_id,
                actual: chain_id,
            });
        }
        recover_sender(tx)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U256;

    use super::*;

    fn key() -> PrivateKey {
        PrivateKey::from_bytes(&[0x46; 32]).unwrap()
    }

    fn transfer() -> Transaction {
        Transaction {
            chain_id: 1,
            nonce: 9,
            gas_price: U256::from(20_000_000_000u64),
            gas_limit: 21000,
            to: Some(Address::new([0x35; 20])),
            value: U256::from(1_000_000_000_000_000_000u128),
            ..Transaction::default()
        }
    }

    /// A signer that refuses to sign.
    struct OfflineSigner;

    impl HashSigner for OfflineSigner {
        fn sign_hash(&self, _hash: &B256) -> Result<RecoverableSignature> {
            Err(Error::SigningFailed("device offline".to_string()))
        }

        fn address(&self) -> Address {
            Address::zero()
        }
    }

    #[test]
    fn v_roundtrip() {
        for chain_id in [0u64, 1, 5, 137, 80001] {
            for byte in 0u8..2 {
                let id = RecoveryId::new(byte == 1, false);
                let v = encode_v(id, chain_id).unwrap();
                assert_eq!(decode_v(v).unwrap(), (chain_id, id));
            }
        }
    }

    #[test]
    fn v_boundaries() {
        assert!(matches!(
            encode_v(RecoveryId::new(false, false), u64::MAX / 2),
            Err(Error::InvalidChainId(_))
        ));
        assert!(encode_v(RecoveryId::new(true, false), (u64::MAX - 36) / 2).is_ok());

        for v in [0u64, 1, 26, 29, 30, 34] {
            assert!(matches!(decode_v(v), Err(Error::InvalidVEncoding(x)) if x == v));
        }
    }

    #[test]
    fn sign_eip155_vector() {
        let signed = sign_transaction(&transfer(), &key()).unwrap();

        assert_eq!(signed.v, 37);
        assert_eq!(
            hex::encode(signed.r.to_be_bytes::<32>()),
            "28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276"
        );
        assert_eq!(
            hex::encode(signed.s.to_be_bytes::<32>()),
            "67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(recover_sender(&signed).unwrap(), key().address());
    }

    #[test]
    fn sign_without_chain() {
        let tx = Transaction {
            chain_id: 0,
            ..transfer()
        };
        let signed = sign_transaction(&tx, &key()).unwrap();

        assert!(signed.v == 27 || signed.v == 28);
        assert_eq!(recover_sender(&signed).unwrap(), key().address());
    }

    #[test]
    fn sign_rejects_unencodable_chain() {
        let tx = Transaction {
            chain_id: u64::MAX,
            ..transfer()
        };
        assert!(matches!(
            sign_transaction(&tx, &key()),
            Err(Error::InvalidChainId(u64::MAX))
        ));
    }

    #[test]
    fn signer_errors_propagate() {
        assert!(matches!(
            sign_transaction(&transfer(), &OfflineSigner),
            Err(Error::SigningFailed(_))
        ));
    }

    #[test]
    fn tampered_transaction_recovers_other_sender() {
        let mut signed = sign_transaction(&transfer(), &key()).unwrap();
        signed.nonce += 1;

        match recover_sender(&signed) {
            Ok(sender) => assert_ne!(sender, key().address()),
            Err(e) => assert!(matches!(e, Error::SenderRecoveryFailed(_))),
        }
    }

    #[test]
    fn recover_rejects_unsigned() {
        assert!(matches!(
            recover_sender(&transfer()),
            Err(Error::InvalidVEncoding(0))
        ));
    }

    #[test]
    fn eip155_signer_stamps_chain() {
        let signer = Eip155Signer::new(80001);
        let tx = Transaction {
            chain_id: 1,
            ..transfer()
        };

        let signed = signer.sign_transaction(&tx, &key()).unwrap();
        assert_eq!(signed.chain_id, 80001);
        assert!(signed.v == 160_037 || signed.v == 160_038);
        assert_eq!(signer.signing_hash(&tx), signed.signing_hash());
        assert_eq!(signer.sender(&signed).unwrap(), key().address());
    }

    #[test]
    fn eip155_signer_rejects_other_chain() {
        let signed = Eip155Signer::new(1)
            .sign_transaction(&transfer(), &key())
            .unwrap();

        assert!(matches!(
            Eip155Signer::new(5).sender(&signed),
            Err(Error::ChainIdMismatch {
                expected: 5,
                actual: 1
            })
        ));
    }

    #[test]
    fn dyn_signer() {
        let signer: Box<dyn HashSigner> = Box::new(key());
        let signed = sign_transaction(&transfer(), signer.as_ref()).unwrap();
        assert_eq!(recover_sender(&signed).unwrap(), signer.address());
    }
}
