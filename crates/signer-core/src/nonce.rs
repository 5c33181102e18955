//! Deterministic ECDSA nonces (RFC 6979, HMAC-SHA256).
//!
//! The generator yields a stream of candidate nonces for a given key and
//! message hash. The first candidate is the RFC 6979 nonce; every further
//! call continues the HMAC-DRBG as section 3.2 step h.3 prescribes, which is
//! what the signer needs when a candidate produces `r = 0` or `s = 0`.

use alloy_primitives::{B256, U256};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::curve::N;
use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Upper bound on HMAC-DRBG outputs consumed for a single signature.
pub const MAX_CANDIDATES: usize = 32;

/// HMAC-DRBG state seeded from a private key and a message hash.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct NonceGenerator {
    k: [u8; 32],
    v: [u8; 32],
    drawn: usize,
}

impl NonceGenerator {
    /// Seeds the generator.
    ///
    /// `secret` is the big-endian private scalar; `hash` is reduced modulo
    /// `n` before use (`bits2octets`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::SigningFailed`] if the HMAC cannot be keyed.
    pub fn new(secret: &[u8; 32], hash: &B256) -> Result<Self> {
        let h1 = U256::from_be_bytes(hash.0).reduce_mod(N).to_be_bytes::<32>();

        let mut generator = Self {
            k: [0u8; 32],
            v: [1u8; 32],
            drawn: 0,
        };

        generator.k = generator.mac(&[&generator.v, &[0x00], secret, &h1])?;
        generator.v = generator.mac(&[&generator.v])?;
        generator.k = generator.mac(&[&generator.v, &[0x01], secret, &h1])?;
        generator.v = generator.mac(&[&generator.v])?;

        Ok(generator)
    }

    /// Returns the next candidate nonce in `[1, n-1]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonceExhausted`] once [`MAX_CANDIDATES`] outputs have
    /// been drawn.
    pub fn next_candidate(&mut self) -> Result<U256> {
        loop {
            if self.drawn >= MAX_CANDIDATES {
                return Err(Error::NonceExhausted);
            }
            if self.drawn > 0 {
                self.k = self.mac(&[&self.v, &[0x00]])?;
                self.v = self.mac(&[&self.v])?;
            }

            self.v = self.mac(&[&self.v])?;
            self.drawn += 1;

            let candidate = U256::from_be_bytes(self.v);
            if !candidate.is_zero() && candidate < N {
                return Ok(candidate);
            }
            tracing::trace!(drawn = self.drawn, "nonce candidate out of range");
        }
    }

    fn mac(&self, parts: &[&[u8]]) -> Result<[u8; 32]> {
        let mut mac = HmacSha256::new_from_slice(&self.k)
            .map_err(|e| Error::SigningFailed(e.to_string()))?;
        for part in parts {
            mac.update(part);
        }
        let mut out = [0u8; 32];
        out.copy_from_slice(&mac.finalize().into_bytes());
        Ok(out)
    }
}
