//! secp256k1 field and group arithmetic.
//!
//! The curve is `y² = x³ + 7` over the prime field `F_P`. All values are
//! [`U256`] integers reduced modulo [`P`] (coordinates) or [`N`] (scalars);
//! the modular helpers come from `ruint` through `alloy-primitives`.
//!
//! Public functions work on affine points and use `None` for the point at
//! infinity. Internally, chains of group operations run in Jacobian
//! coordinates so that a scalar multiplication costs a single field
//! inversion.
//!
//! # Example
//!
//! ```
//! use alloy_primitives::U256;
//! use evm_signer_core::curve::{self, G};
//!
//! let two_g = curve::scalar_base_mult(U256::from(2)).unwrap();
//! assert_eq!(Some(two_g), curve::double(&G));
//! assert!(curve::is_on_curve(two_g.x, two_g.y));
//! ```

use alloy_primitives::U256;

use crate::error::{Error, Result};

/// The field prime `P = 2^256 - 2^32 - 977`.
pub const P: U256 = U256::from_be_bytes([
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0xFF, 0xFC, 0x2F,
]);

/// The order of the group generated by [`G`].
pub const N: U256 = U256::from_be_bytes([
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE,
    0xBA, 0xAE, 0xDC, 0xE6, 0xAF, 0x48, 0xA0, 0x3B, 0xBF, 0xD2, 0x5E, 0x8C, 0xD0, 0x36, 0x41, 0x41,
]);

/// `N / 2`, the largest canonical (low-S) signature scalar.
pub const HALF_N: U256 = U256::from_be_bytes([
    0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0x5D, 0x57, 0x6E, 0x73, 0x57, 0xA4, 0x50, 0x1D, 0xDF, 0xE9, 0x2F, 0x46, 0x68, 0x1B, 0x20, 0xA0,
]);

/// The curve constant `B` in `y² = x³ + B`.
pub const B: U256 = U256::from_limbs([7, 0, 0, 0]);

/// X coordinate of the generator.
pub const GX: U256 = U256::from_be_bytes([
    0x79, 0xBE, 0x66, 0x7E, 0xF9, 0xDC, 0xBB, 0xAC, 0x55, 0xA0, 0x62, 0x95, 0xCE, 0x87, 0x0B, 0x07,
    0x02, 0x9B, 0xFC, 0xDB, 0x2D, 0xCE, 0x28, 0xD9, 0x59, 0xF2, 0x81, 0x5B, 0x16, 0xF8, 0x17, 0x98,
]);

/// Y coordinate of the generator.
pub const GY: U256 = U256::from_be_bytes([
    0x48, 0x3A, 0xDA, 0x77, 0x26, 0xA3, 0xC4, 0x65, 0x5D, 0xA4, 0xFB, 0xFC, 0x0E, 0x11, 0x08, 0xA8,
    0xFD, 0x17, 0xB4, 0x48, 0xA6, 0x85, 0x54, 0x19, 0x9C, 0x47, 0xD0, 0x8F, 0xFB, 0x10, 0xD4, 0xB8,
]);

/// The generator point.
pub const G: AffinePoint = AffinePoint { x: GX, y: GY };

/// `(P + 1) / 4`. Since `P ≡ 3 (mod 4)`, `a^((P+1)/4)` is a square root of
/// `a` whenever one exists.
const SQRT_EXP: U256 = U256::from_be_bytes([
    0x3F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xBF, 0xFF, 0xFF, 0x0C,
]);

const ONE: U256 = U256::from_limbs([1, 0, 0, 0]);

/// The secp256k1 domain parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveParams {
    /// Field prime.
    pub p: U256,
    /// Group order.
    pub n: U256,
    /// Half the group order.
    pub half_n: U256,
    /// Curve constant `B`.
    pub b: U256,
    /// Generator point.
    pub g: AffinePoint,
    /// Size of the field in bits.
    pub bit_size: usize,
}

static SECP256K1: CurveParams = CurveParams {
    p: P,
    n: N,
    half_n: HALF_N,
    b: B,
    g: G,
    bit_size: 256,
};

/// Returns the process-wide secp256k1 parameter table.
#[must_use]
pub fn params() -> &'static CurveParams {
    &SECP256K1
}

/// A finite point in affine coordinates.
///
/// The type does not enforce that the point lies on the curve; parsers in
/// [`crate::keys`] do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AffinePoint {
    /// X coordinate.
    pub x: U256,
    /// Y coordinate.
    pub y: U256,
}

impl AffinePoint {
    /// Creates a point from its coordinates without validation.
    #[must_use]
    pub const fn new(x: U256, y: U256) -> Self {
        Self { x, y }
    }

    /// Checks whether the point satisfies the curve equation.
    #[must_use]
    pub fn is_on_curve(&self) -> bool {
        is_on_curve(self.x, self.y)
    }

    /// Returns `true` if the Y coordinate is odd.
    #[must_use]
    pub fn is_y_odd(&self) -> bool {
        self.y.bit(0)
    }
}

#[inline]
fn fadd(a: U256, b: U256) -> U256 {
    a.add_mod(b, P)
}

/// `a - b mod P` for `b < P`.
#[inline]
fn fsub(a: U256, b: U256) -> U256 {
    a.add_mod(P - b, P)
}

#[inline]
fn fneg(a: U256) -> U256 {
    if a.is_zero() { a } else { P - a }
}

#[inline]
fn fmul(a: U256, b: U256) -> U256 {
    a.mul_mod(b, P)
}

#[inline]
fn fsqr(a: U256) -> U256 {
    a.mul_mod(a, P)
}

/// `x³ + 7 mod P`.
fn curve_rhs(x: U256) -> U256 {
    fadd(fmul(fsqr(x), x), B)
}

/// A point in Jacobian coordinates `(X / Z², Y / Z³)`; `Z = 0` is infinity.
#[derive(Debug, Clone, Copy)]
struct JacobianPoint {
    x: U256,
    y: U256,
    z: U256,
}

impl JacobianPoint {
    const INFINITY: Self = Self {
        x: ONE,
        y: ONE,
        z: U256::ZERO,
    };

    const fn from_affine(point: &AffinePoint) -> Self {
        Self {
            x: point.x,
            y: point.y,
            z: ONE,
        }
    }

    fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    fn to_affine(self) -> Option<AffinePoint> {
        if self.is_infinity() {
            return None;
        }
        let z_inv = self.z.inv_mod(P)?;
        let z_inv2 = fsqr(z_inv);
        Some(AffinePoint {
            x: fmul(self.x, z_inv2),
            y: fmul(self.y, fmul(z_inv2, z_inv)),
        })
    }

    /// dbl-2009-l, valid for `a = 0`.
    fn double(&self) -> Self {
        if self.is_infinity() || self.y.is_zero() {
            return Self::INFINITY;
        }

        let a = fsqr(self.x);
        let b = fsqr(self.y);
        let c = fsqr(b);

        let t = fsub(fsub(fsqr(fadd(self.x, b)), a), c);
        let d = fadd(t, t);
        let e = fadd(fadd(a, a), a);
        let f = fsqr(e);

        let x3 = fsub(f, fadd(d, d));

        let c2 = fadd(c, c);
        let c4 = fadd(c2, c2);
        let c8 = fadd(c4, c4);
        let y3 = fsub(fmul(e, fsub(d, x3)), c8);

        let yz = fmul(self.y, self.z);
        let z3 = fadd(yz, yz);

        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    fn add(&self, other: &Self) -> Self {
        if self.is_infinity() {
            return *other;
        }
        if other.is_infinity() {
            return *self;
        }

        let z1z1 = fsqr(self.z);
        let z2z2 = fsqr(other.z);
        let u1 = fmul(self.x, z2z2);
        let u2 = fmul(other.x, z1z1);
        let s1 = fmul(self.y, fmul(other.z, z2z2));
        let s2 = fmul(other.y, fmul(self.z, z1z1));

        let h = fsub(u2, u1);
        let r = fsub(s2, s1);

        if h.is_zero() {
            // Same x: either the same point or its negation.
            return if r.is_zero() {
                self.double()
            } else {
                Self::INFINITY
            };
        }

        let h2 = fsqr(h);
        let h3 = fmul(h2, h);
        let u1h2 = fmul(u1, h2);

        let x3 = fsub(fsub(fsqr(r), h3), fadd(u1h2, u1h2));
        let y3 = fsub(fmul(r, fsub(u1h2, x3)), fmul(s1, h3));
        let z3 = fmul(h, fmul(self.z, other.z));

        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }
}

/// Checks `y² ≡ x³ + 7 (mod P)` with both coordinates reduced.
///
/// # Example
///
/// ```
/// use evm_signer_core::curve::{self, GX, GY};
///
/// assert!(curve::is_on_curve(GX, GY));
/// assert!(!curve::is_on_curve(GX, GX));
/// ```
#[must_use]
pub fn is_on_curve(x: U256, y: U256) -> bool {
    if x >= P || y >= P {
        return false;
    }
    fsqr(y) == curve_rhs(x)
}

/// Recovers the Y coordinate for `x`, choosing the root whose parity matches
/// `y_odd`.
///
/// # Errors
///
/// Returns [`Error::CoordinateOutOfRange`] if `x >= P`, or
/// [`Error::PointNotOnCurve`] if `x³ + 7` has no square root.
pub fn decompress_point(x: U256, y_odd: bool) -> Result<U256> {
    if x >= P {
        return Err(Error::CoordinateOutOfRange("X"));
    }

    let rhs = curve_rhs(x);
    let y = rhs.pow_mod(SQRT_EXP, P);
    if fsqr(y) != rhs {
        return Err(Error::PointNotOnCurve);
    }

    if y.bit(0) == y_odd {
        Ok(y)
    } else {
        Ok(fneg(y))
    }
}

/// Adds two points.
#[must_use]
pub fn add(a: &AffinePoint, b: &AffinePoint) -> Option<AffinePoint> {
    JacobianPoint::from_affine(a)
        .add(&JacobianPoint::from_affine(b))
        .to_affine()
}

/// Doubles a point.
#[must_use]
pub fn double(a: &AffinePoint) -> Option<AffinePoint> {
    JacobianPoint::from_affine(a).double().to_affine()
}

/// Computes `k · point` by double-and-add over the bits of `k`.
///
/// `k` is not reduced first; any `k` yields `(k mod N) · point` for points of
/// order `N`.
#[must_use]
pub fn scalar_mult(point: &AffinePoint, k: U256) -> Option<AffinePoint> {
    let base = JacobianPoint::from_affine(point);
    let mut acc = JacobianPoint::INFINITY;

    for i in (0..k.bit_len()).rev() {
        acc = acc.double();
        if k.bit(i) {
            acc = acc.add(&base);
        }
    }

    acc.to_affine()
}

/// Computes `k · G`.
#[must_use]
pub fn scalar_base_mult(k: U256) -> Option<AffinePoint> {
    scalar_mult(&G, k)
}

/// Computes `u1 · G + u2 · point` in a single pass (Shamir's trick).
#[must_use]
pub fn double_scalar_mult(u1: U256, u2: U256, point: &AffinePoint) -> Option<AffinePoint> {
    let g = JacobianPoint::from_affine(&G);
    let q = JacobianPoint::from_affine(point);
    let gq = g.add(&q);

    let mut acc = JacobianPoint::INFINITY;
    for i in (0..u1.bit_len().max(u2.bit_len())).rev() {
        acc = acc.double();
        match (u1.bit(i), u2.bit(i)) {
            (true, true) => acc = acc.add(&gq),
            (true, false) => acc = acc.add(&g),
            (false, true) => acc = acc.add(&q),
            (false, false) => {}
        }
    }

    acc.to_affine()
}
