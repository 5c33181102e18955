//! Known-answer vectors and property tests for signing and recovery.
//!
//! The transaction vectors are the worked example from EIP-155 and a
//! contract call signed on a test network.

// Silence unused crate dependency warnings for test binary
use alloy_rlp as _;
use anyhow as _;
use clap as _;
use hmac as _;
use rand as _;
use serde as _;
use serde_json as _;
use sha2 as _;
use sha3 as _;
use thiserror as _;
use tracing as _;
use tracing_subscriber as _;
use zeroize as _;

use alloy_primitives::{B256, Bytes, U256};
use evm_signer_core::{
    Address, Eip155Signer, Error, PrivateKey, PublicKey, RecoverableSignature, Transaction,
    compact, crypto, hash, recover_sender, sign_transaction,
};
use proptest::prelude::*;

const FIXTURE_KEY: &str = "22861a2fbd5c05cf30e86a3370bbbc7d122e83aa4b2530629d14ae6ada41cc7b";
const FIXTURE_COMPACT: &str = "1f2a3f8181094733ae467c28910690d9019f2b2a2e63a86b57023dfda8bffb2486215445a4bbe4232a16b2dd3623c909bd62fc564d20f4d71f7f34b3251ed2ea9d";

const WALLET_KEY: &str = "22a90d9711350a0b7c7c697ccb26dd1224ffbf16f6430220d28f0a30235fb01e";
const WALLET_RAW: &str = "f8ad3285012a05f200830394e3940079fbaceb8f886009f55639b5506b5de4ed75cb80b84440c10f19000000000000000000000000d615c42cf7856e0634404b7584ef8fcd6cc9b896000000000000000000000000000000000000000000000000000000000000000183027126a0cab804a7118649bdcf20ac4c14bd80d52335750050510479cb08ac0d2edbf434a058d7b36cc77c182b86d3ecbb004cc6f0d7e2a87c5ca4e69209fb5d2ad896e3c6";

fn b256(hex_str: &str) -> B256 {
    B256::from_slice(&hex::decode(hex_str).unwrap())
}

fn mint_call() -> Transaction {
    Transaction {
        nonce: 50,
        gas_price: U256::from(5_000_000_000u64),
        gas_limit: 234_723,
        to: Some(Address::from_hex("0x0079fbaceb8f886009f55639b5506b5de4ed75cb").unwrap()),
        value: U256::ZERO,
        input: Bytes::from(
            hex::decode(
                "40c10f19000000000000000000000000d615c42cf7856e0634404b7584ef8fcd6cc9b8960000000000000000000000000000000000000000000000000000000000000001",
            )
            .unwrap(),
        ),
        chain_id: 80001,
        ..Transaction::default()
    }
}

#[test]
fn eip155_example() {
    let key = PrivateKey::from_bytes(&[0x46; 32]).unwrap();
    let tx = Transaction {
        chain_id: 1,
        nonce: 9,
        gas_price: U256::from(20_000_000_000u64),
        gas_limit: 21000,
        to: Some(Address::new([0x35; 20])),
        value: U256::from(1_000_000_000_000_000_000u128),
        ..Transaction::default()
    };

    let signed = sign_transaction(&tx, &key).unwrap();
    assert_eq!(
        hex::encode(signed.encode_signed()),
        "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
    );
    assert_eq!(
        recover_sender(&signed).unwrap().to_hex(),
        "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f"
    );
}

#[test]
fn contract_call_on_test_network() {
    let key = PrivateKey::from_hex(WALLET_KEY).unwrap();
    let tx = mint_call();

    assert_eq!(
        tx.signing_hash(),
        b256("dd49df893371ea1870b7ab0f80cc83e7e862a42075b0d04aa15e3812eea58ee3")
    );

    let signed = Eip155Signer::new(80001).sign_transaction(&tx, &key).unwrap();
    assert_eq!(signed.v, 160_038);
    assert_eq!(hex::encode(signed.encode_signed()), WALLET_RAW);

    let decoded = Transaction::decode_signed(&hex::decode(WALLET_RAW).unwrap()).unwrap();
    assert_eq!(decoded, signed);
    assert_eq!(
        Eip155Signer::new(80001).sender(&decoded).unwrap().to_hex(),
        "0xd615c42cf7856e0634404b7584ef8fcd6cc9b896"
    );
}

#[test]
fn contract_call_without_replay_protection() {
    let key = PrivateKey::from_hex(WALLET_KEY).unwrap();
    let tx = Transaction {
        chain_id: 0,
        ..mint_call()
    };

    assert_eq!(
        tx.signing_hash(),
        b256("739e5f3c8f9d813067a82250b647a497d2add7a3897329e0b80edb850eea9fc8")
    );

    let signed = sign_transaction(&tx, &key).unwrap();
    assert_eq!(signed.v, 27);
    assert_eq!(recover_sender(&signed).unwrap(), key.address());
}

#[test]
fn fixture_compact_signature() {
    let key = PrivateKey::from_hex(FIXTURE_KEY).unwrap();
    let digest = hash::keccak256([b"hello"]);

    let sig = key.sign_recoverable(&digest).unwrap();
    let recovered = crypto::recover_public_key(sig.recovery_id(), sig.signature(), &digest).unwrap();
    assert_eq!(&recovered, key.public_key());

    let fixture = hex::decode(FIXTURE_COMPACT).unwrap();
    let (public_key, compressed) = compact::recover_compact(&fixture, &digest).unwrap();
    assert_eq!(&public_key, key.public_key());
    assert!(compressed);
    assert_eq!(compact::encode(&sig, true).as_slice(), fixture.as_slice());
}

#[test]
fn malformed_public_keys() {
    assert!(matches!(
        PublicKey::parse(&[0u8; 10]),
        Err(Error::InvalidKeyLength(10))
    ));

    let mut compressed = [0xffu8; 33];
    compressed[0] = 0x03;
    assert!(matches!(
        PublicKey::parse(&compressed),
        Err(Error::CoordinateOutOfRange(_))
    ));

    let key = PrivateKey::from_hex(FIXTURE_KEY).unwrap();
    let mut hybrid = key.public_key().serialize_hybrid();
    hybrid[0] ^= 1;
    assert!(matches!(PublicKey::parse(&hybrid), Err(Error::YBitMismatch)));
}

fn private_key() -> impl Strategy<Value = PrivateKey> {
    any::<[u8; 32]>().prop_filter_map("scalar out of range", |bytes| {
        PrivateKey::from_bytes(&bytes).ok()
    })
}

fn digest() -> impl Strategy<Value = B256> {
    any::<[u8; 32]>().prop_map(B256::from)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn sign_then_recover(key in private_key(), hash in digest()) {
        let sig = key.sign_recoverable(&hash).unwrap();

        prop_assert!(sig.signature().is_low_s());
        prop_assert!(key.public_key().verify(&hash, sig.signature()));

        let recovered = crypto::recover_public_key(sig.recovery_id(), sig.signature(), &hash).unwrap();
        prop_assert_eq!(&recovered, key.public_key());
    }

    #[test]
    fn signing_is_deterministic(key in private_key(), hash in digest()) {
        prop_assert_eq!(key.sign(&hash).unwrap(), key.sign(&hash).unwrap());
    }

    #[test]
    fn recoverable_signature_bytes(key in private_key(), hash in digest()) {
        let sig = key.sign_recoverable(&hash).unwrap();
        prop_assert_eq!(RecoverableSignature::from_bytes(&sig.to_bytes()).unwrap(), sig);

        let mut legacy = sig.to_bytes();
        legacy[64] += 27;
        prop_assert_eq!(RecoverableSignature::from_bytes(&legacy).unwrap(), sig);
    }

    #[test]
    fn public_key_encodings(key in private_key()) {
        let public_key = key.public_key();
        prop_assert_eq!(&PublicKey::parse(&public_key.serialize_compressed()).unwrap(), public_key);
        prop_assert_eq!(&PublicKey::parse(&public_key.serialize_uncompressed()).unwrap(), public_key);
        prop_assert_eq!(&PublicKey::parse(&public_key.serialize_hybrid()).unwrap(), public_key);
    }

    #[test]
    fn transaction_roundtrip(
        key in private_key(),
        chain_id in prop::sample::select(vec![1337u64, 80001, 100, 97]),
        nonce in any::<u64>(),
        gas_price in any::<u64>(),
        gas_limit in any::<u64>(),
        to in prop::option::of(any::<[u8; 20]>()),
        value in any::<u128>(),
        input in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        let tx = Transaction {
            nonce,
            gas_price: U256::from(gas_price),
            gas_limit,
            to: to.map(Address::new),
            value: U256::from(value),
            input: Bytes::from(input),
            ..Transaction::default()
        };

        let signer = Eip155Signer::new(chain_id);
        let signed = signer.sign_transaction(&tx, &key).unwrap();
        let decoded = Transaction::decode_signed(&signed.encode_signed()).unwrap();

        prop_assert_eq!(&decoded, &signed);
        prop_assert_eq!(decoded.hash(), signed.hash());
        prop_assert_eq!(signer.sender(&decoded).unwrap(), key.address());
    }
}
