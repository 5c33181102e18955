//! Legacy Ethereum transactions with EIP-155 replay protection.
//!
//! A [`Transaction`] carries the six payload fields, the chain it targets and,
//! once signed, its `v`, `r` and `s` values.
//!
//! # Signing Payload
//!
//! | chain id | payload hashed for signing                                      |
//! |----------|-----------------------------------------------------------------|
//! | `C != 0` | `rlp([nonce, gasPrice, gas, to, value, input, C, 0, 0])`        |
//! | `0`      | `rlp([nonce, gasPrice, gas, to, value, input])` (pre-EIP-155)   |
//!
//! Chain `0` is the Homestead form: it hashes the six payload fields and
//! signs with `v = 27 + id`, so `v` is `27` or `28`. Every other chain uses
//! `v = 35 + 2·C + id`.
//!
//! # Signing Flow
//!
//! 1. Build a [`Transaction`] with the target `chain_id`
//! 2. Sign it with [`crate::signer::sign_transaction`] (or an
//!    [`crate::signer::Eip155Signer`]), which fills in `v`, `r` and `s`
//! 3. Broadcast [`Transaction::encode_signed`]
//!
//! # Example
//!
//! ```
//! use alloy_primitives::U256;
//! use evm_signer_core::{Address, Transaction};
//!
//! let tx = Transaction {
//!     chain_id: 1,
//!     nonce: 9,
//!     gas_price: U256::from(20_000_000_000u64),
//!     gas_limit: 21000,
//!     to: Some(Address::new([0x35; 20])),
//!     value: U256::from(1_000_000_000_000_000_000u128),
//!     ..Transaction::default()
//! };
//!
//! assert_eq!(
//!     hex::encode(tx.signing_hash()),
//!     "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
//! );
//! ```

use alloy_primitives::{Address as AlloyAddress, B256, Bytes, U256};
use alloy_rlp::{Decodable, EMPTY_STRING_CODE, Encodable, Header};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::{Error, Result};
use crate::hash::keccak256;
use crate::signature::{RecoverableSignature, Signature};
use crate::signer::decode_v;

/// A legacy (type 0) Ethereum transaction.
///
/// `v`, `r` and `s` are zero until the transaction is signed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transaction {
    /// The sender's account nonce.
    pub nonce: u64,

    /// The gas price in wei.
    pub gas_price: U256,

    /// The gas limit.
    #[serde(alias = "gas")]
    pub gas_limit: u64,

    /// The recipient address, or `None` for contract creation.
    pub to: Option<Address>,

    /// The value to transfer in wei.
    pub value: U256,

    /// The call data.
    #[serde(alias = "data")]
    pub input: Bytes,

    /// The chain ID for replay protection; `0` signs without it.
    pub chain_id: u64,

    /// The encoded recovery id.
    pub v: u64,

    /// The R component of the signature.
    pub r: U256,

    /// The S component of the signature.
    pub s: U256,
}

impl Transaction {
    /// Returns the hash to sign for [`Transaction::chain_id`].
    #[must_use]
    pub fn signing_hash(&self) -> B256 {
        self.signing_hash_for_chain(self.chain_id)
    }

    /// Returns the hash to sign for an explicit chain.
    ///
    /// Chain `0` hashes the six payload fields only.
    #[must_use]
    pub fn signing_hash_for_chain(&self, chain_id: u64) -> B256 {
        let mut buf = Vec::with_capacity(128);

        encode_rlp_list(&mut buf, |buf| {
            self.encode_payload(buf);
            if chain_id != 0 {
                chain_id.encode(buf);
                0u8.encode(buf);
                0u8.encode(buf);
            }
        });

        keccak256([&buf])
    }

    /// Returns `true` once a signature has been attached.
    #[must_use]
    pub fn is_signed(&self) -> bool {
        !self.r.is_zero() || !self.s.is_zero()
    }

    /// Returns the attached signature with its recovery id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVEncoding`] if `v` is malformed, and
    /// [`Error::InvalidSignature`] if `r` or `s` is out of range (including
    /// an unsigned transaction).
    pub fn signature(&self) -> Result<RecoverableSignature> {
        let (_, recovery_id) = decode_v(self.v)?;
        let signature = Signature::from_scalars(self.r, self.s)?;
        Ok(RecoverableSignature::new(signature, recovery_id))
    }

    /// Encodes the signed transaction as
    /// `rlp([nonce, gasPrice, gas, to, value, input, v, r, s])`.
    #[must_use]
    pub fn encode_signed(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(192);

        encode_rlp_list(&mut buf, |buf| {
            self.encode_payload(buf);
            self.v.encode(buf);
            self.r.encode(buf);
            self.s.encode(buf);
        });

        buf
    }

    /// Decodes a signed transaction produced by [`Transaction::encode_signed`].
    ///
    /// The chain ID is restored from `v`.
    ///
    /// # Errors
    ///
    /// - [`Error::RlpDecodingFailed`] on malformed RLP
    /// - [`Error::InvalidTransaction`] if the list shape is wrong
    /// - [`Error::InvalidVEncoding`] if `v` is neither legacy nor EIP-155
    pub fn decode_signed(bytes: &[u8]) -> Result<Self> {
        let mut buf = bytes;
        let header = Header::decode(&mut buf)?;

        if !header.list {
            return Err(Error::InvalidTransaction("expected an RLP list".to_string()));
        }
        if header.payload_length != buf.len() {
            return Err(Error::InvalidTransaction(format!(
                "list payload is {} bytes but {} bytes follow",
                header.payload_length,
                buf.len()
            )));
        }

        let nonce = u64::decode(&mut buf)?;
        let gas_price = U256::decode(&mut buf)?;
        let gas_limit = u64::decode(&mut buf)?;
        let to = decode_optional_address(&mut buf)?;
        let value = U256::decode(&mut buf)?;
        let input = Bytes::decode(&mut buf)?;
        let v = u64::decode(&mut buf)?;
        let r = U256::decode(&mut buf)?;
        let s = U256::decode(&mut buf)?;

        if !buf.is_empty() {
            return Err(Error::InvalidTransaction(
                "unexpected trailing list items".to_string(),
            ));
        }

        let (chain_id, _) = decode_v(v)?;

        Ok(Self {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            input,
            chain_id,
            v,
            r,
            s,
        })
    }

    /// Returns the transaction hash: Keccak-256 of the signed encoding.
    #[must_use]
    pub fn hash(&self) -> B256 {
        keccak256([self.encode_signed()])
    }

    /// Parses a transaction from JSON.
    ///
    /// Missing fields default to zero. Integers other than `nonce`, `gas`,
    /// `chainId` and `v` are `0x`-prefixed hex strings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JsonError`] if parsing fails.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the transaction to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::JsonError`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn encode_payload(&self, out: &mut Vec<u8>) {
        self.nonce.encode(out);
        self.gas_price.encode(out);
        self.gas_limit.encode(out);
        encode_optional_address(self.to.as_ref(), out);
        self.value.encode(out);
        self.input.encode(out);
    }
}

/// Encodes an RLP list using a closure to write elements.
fn encode_rlp_list<F>(out: &mut Vec<u8>, f: F)
where
    F: FnOnce(&mut Vec<u8>),
{
    let mut content = Vec::new();
    f(&mut content);

    let header = Header {
        list: true,
        payload_length: content.len(),
    };
    header.encode(out);
    out.extend_from_slice(&content);
}

/// Encodes an optional address; contract creation is the empty string.
fn encode_optional_address(addr: Option<&Address>, out: &mut Vec<u8>) {
    match addr {
        Some(a) => a.inner().encode(out),
        None => out.push(EMPTY_STRING_CODE),
    }
}

fn decode_optional_address(buf: &mut &[u8]) -> Result<Option<Address>> {
    if buf.first() == Some(&EMPTY_STRING_CODE) {
        *buf = &buf[1..];
        return Ok(None);
    }
    Ok(Some(AlloyAddress::decode(buf)?.into()))
}
