//! Curve selection over the RustCrypto NIST curves.
//!
//! A [`Curve`] is a static descriptor: keys and signatures hold a
//! `&'static Curve` and never own one. Field and group arithmetic comes from
//! the `p224` and `p256` crates; the helpers here are written once against
//! the `elliptic_curve` traits and reached through a match on [`CurveId`].

use std::fmt;
use std::str::FromStr;

use elliptic_curve::ff::{Field, PrimeField};
use elliptic_curve::group::{Curve as _, Group};
use elliptic_curve::point::DecompressPoint;
use elliptic_curve::sec1::{EncodedPoint, FromEncodedPoint, ToEncodedPoint};
use elliptic_curve::subtle::Choice;
use elliptic_curve::{AffinePoint, CurveArithmetic, FieldBytes, ProjectivePoint, Scalar};
use p224::NistP224;
use p256::NistP256;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveId {
    P224, // NIST P-224 / secp224r1
    P256, // NIST P-256 / secp256r1 / prime256v1
}

impl CurveId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurveId::P224 => "p224",
            CurveId::P256 => "p256",
        }
    }

    pub fn curve(&self) -> &'static Curve {
        Curve::from_id(*self)
    }
}

impl FromStr for CurveId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "p224" | "p-224" | "secp224r1" => Ok(CurveId::P224),
            "p256" | "p-256" | "secp256r1" | "prime256v1" => Ok(CurveId::P256),
            _ => Err(Error::UnknownCurve(s.to_string())),
        }
    }
}

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Curve {
    id: CurveId,
    bit_size: usize,
}

static P224: Curve = Curve {
    id: CurveId::P224,
    bit_size: 224,
};

static P256: Curve = Curve {
    id: CurveId::P256,
    bit_size: 256,
};

impl Curve {
    /// NIST P-224
    pub fn p224() -> &'static Curve {
        &P224
    }

    /// NIST P-256
    pub fn p256() -> &'static Curve {
        &P256
    }

    pub fn from_id(id: CurveId) -> &'static Curve {
        match id {
            CurveId::P224 => &P224,
            CurveId::P256 => &P256,
        }
    }

    pub fn id(&self) -> CurveId {
        self.id
    }

    pub fn bit_size(&self) -> usize {
        self.bit_size
    }

    /// Width in bytes of a field element or scalar encoding.
    pub fn byte_len(&self) -> usize {
        self.bit_size.div_ceil(8)
    }

    /// Base point G.
    pub fn generator(&self) -> Point {
        match self.id {
            CurveId::P224 => Point::P224(ProjectivePoint::<NistP224>::generator().to_affine()),
            CurveId::P256 => Point::P256(ProjectivePoint::<NistP256>::generator().to_affine()),
        }
    }

    /// Whether `(x, y)`, each fixed-width big-endian, lies on the curve.
    pub fn is_on_curve(&self, x: &[u8], y: &[u8]) -> bool {
        let len = self.byte_len();
        if x.len() != len || y.len() != len {
            return false;
        }
        let mut sec1 = Vec::with_capacity(1 + 2 * len);
        sec1.push(0x04);
        sec1.extend_from_slice(x);
        sec1.extend_from_slice(y);

        match self.id {
            CurveId::P224 => NistP224::from_sec1(&sec1).is_some(),
            CurveId::P256 => NistP256::from_sec1(&sec1).is_some(),
        }
    }
}

/// An affine point tagged with its curve. The identity is representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Point {
    P224(AffinePoint<NistP224>),
    P256(AffinePoint<NistP256>),
}

impl Point {
    pub fn curve(&self) -> &'static Curve {
        match self {
            Point::P224(_) => &P224,
            Point::P256(_) => &P256,
        }
    }

    pub fn is_identity(&self) -> bool {
        match self {
            Point::P224(point) => is_identity::<NistP224>(point),
            Point::P256(point) => is_identity::<NistP256>(point),
        }
    }

    /// Fixed-width big-endian `(x, y)`; `None` for the identity.
    pub fn coordinates(&self) -> Option<(Vec<u8>, Vec<u8>)> {
        match self {
            Point::P224(point) => coordinates::<NistP224>(point),
            Point::P256(point) => coordinates::<NistP256>(point),
        }
    }

    pub fn x(&self) -> Option<Vec<u8>> {
        self.coordinates().map(|(x, _)| x)
    }

    pub fn y(&self) -> Option<Vec<u8>> {
        self.coordinates().map(|(_, y)| y)
    }
}

/// The SEC1 glue each supported curve provides on top of its group law.
pub(crate) trait NistCurve: CurveArithmetic {
    fn descriptor() -> &'static Curve;

    fn wrap(point: AffinePoint<Self>) -> Point;

    fn to_sec1(point: &AffinePoint<Self>, compress: bool) -> Vec<u8>;

    /// Decode a SEC1 encoding, rejecting points off the curve.
    fn from_sec1(bytes: &[u8]) -> Option<AffinePoint<Self>>;

    /// The point with x-coordinate `x` and the requested y parity.
    fn decompress(x: &FieldBytes<Self>, y_is_odd: bool) -> Option<AffinePoint<Self>>;
}

macro_rules! impl_nist_curve {
    ($curve:ty, $variant:ident) => {
        impl NistCurve for $curve {
            fn descriptor() -> &'static Curve {
                Curve::from_id(CurveId::$variant)
            }

            fn wrap(point: AffinePoint<Self>) -> Point {
                Point::$variant(point)
            }

            fn to_sec1(point: &AffinePoint<Self>, compress: bool) -> Vec<u8> {
                point.to_encoded_point(compress).as_bytes().to_vec()
            }

            fn from_sec1(bytes: &[u8]) -> Option<AffinePoint<Self>> {
                let encoded = EncodedPoint::<Self>::from_bytes(bytes).ok()?;
                Option::from(<AffinePoint<Self> as FromEncodedPoint<Self>>::from_encoded_point(
                    &encoded,
                ))
            }

            fn decompress(x: &FieldBytes<Self>, y_is_odd: bool) -> Option<AffinePoint<Self>> {
                Option::from(<AffinePoint<Self> as DecompressPoint<Self>>::decompress(
                    x,
                    Choice::from(u8::from(y_is_odd)),
                ))
            }
        }
    };
}

impl_nist_curve!(NistP224, P224);
impl_nist_curve!(NistP256, P256);

pub(crate) fn is_identity<C: CurveArithmetic>(point: &AffinePoint<C>) -> bool {
    bool::from(ProjectivePoint::<C>::from(*point).is_identity())
}

fn coordinates<C: NistCurve>(point: &AffinePoint<C>) -> Option<(Vec<u8>, Vec<u8>)> {
    if is_identity::<C>(point) {
        return None;
    }
    let len = C::descriptor().byte_len();
    let sec1 = C::to_sec1(point, false);
    Some((sec1[1..=len].to_vec(), sec1[1 + len..].to_vec()))
}

/// Uniform scalar in [1, n-1] by rejection sampling.
pub(crate) fn random_scalar<C, R>(rng: &mut R) -> Result<Scalar<C>>
where
    C: CurveArithmetic,
    R: RngCore + CryptoRng + ?Sized,
{
    let mut repr = FieldBytes::<C>::default();
    loop {
        rng.try_fill_bytes(&mut repr).map_err(Error::RandomSource)?;
        if let Some(k) = scalar_from_be_bytes::<C>(&repr) {
            return Ok(k);
        }
    }
}

/// Big-endian scalar in [1, n-1], left-padded to the field width.
/// Zero, values at or above n, and over-long input give `None`.
pub(crate) fn scalar_from_be_bytes<C: CurveArithmetic>(bytes: &[u8]) -> Option<Scalar<C>> {
    let mut repr = FieldBytes::<C>::default();
    let len = repr.len();
    if bytes.len() > len {
        return None;
    }
    repr[len - bytes.len()..].copy_from_slice(bytes);
    Option::<Scalar<C>>::from(Scalar::<C>::from_repr(repr)).filter(|s| !bool::from(s.is_zero()))
}

/// Big-endian integer of any width, reduced mod n.
pub(crate) fn reduce_be_bytes<C: CurveArithmetic>(bytes: &[u8]) -> Scalar<C> {
    let radix = Scalar::<C>::from(256u64);
    bytes.iter().fold(Scalar::<C>::ZERO, |acc, byte| {
        acc * radix + Scalar::<C>::from(u64::from(*byte))
    })
}
