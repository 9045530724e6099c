use std::fmt;

use elliptic_curve::{CurveArithmetic, NonZeroScalar, Scalar, SecretKey};
use p224::NistP224;
use p256::NistP256;
use rand::{CryptoRng, RngCore};

use crate::address::Address;
use crate::curve::{random_scalar, scalar_from_be_bytes, Curve, CurveId, NistCurve, Point};
use crate::ecmath::{constant_eq, dual_roots};
use crate::error::{Error, Result};
use crate::signature::{self, Signature};

const COMPRESSED_EVEN: u8 = 0x02;
const COMPRESSED_ODD: u8 = 0x03;
const UNCOMPRESSED_TAG: u8 = 0x04;

/// A secret scalar `d` in `[1, n-1]`. Zeroized on drop.
#[derive(Clone)]
pub struct PrivateKey {
    secret: Secret,
}

#[derive(Clone)]
pub(crate) enum Secret {
    P224(p224::SecretKey),
    P256(p256::SecretKey),
}

impl PrivateKey {
    /// Draw a fresh key from `rng`.
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(
        curve: &'static Curve,
        rng: &mut R,
    ) -> Result<Self> {
        let secret = match curve.id() {
            CurveId::P224 => Secret::P224(random_secret::<NistP224, R>(rng)?),
            CurveId::P256 => Secret::P256(random_secret::<NistP256, R>(rng)?),
        };
        Ok(PrivateKey { secret })
    }

    /// Decode a fixed-width big-endian scalar.
    pub fn from_bytes(curve: &'static Curve, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != curve.byte_len() {
            return Err(Error::InvalidScalarEncoding {
                reason: "private key has wrong length",
            });
        }
        let secret = match curve.id() {
            CurveId::P224 => Secret::P224(secret_from_bytes(bytes)?),
            CurveId::P256 => Secret::P256(secret_from_bytes(bytes)?),
        };
        Ok(PrivateKey { secret })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match &self.secret {
            Secret::P224(sk) => sk.to_bytes().to_vec(),
            Secret::P256(sk) => sk.to_bytes().to_vec(),
        }
    }

    /// Q = d·G
    pub fn public_key(&self) -> PublicKey {
        let point = match &self.secret {
            Secret::P224(sk) => KeyPoint::P224(sk.public_key()),
            Secret::P256(sk) => KeyPoint::P256(sk.public_key()),
        };
        PublicKey { point }
    }

    pub fn address(&self, compressed: bool) -> Address {
        Address::from_public_key(&self.public_key(), compressed)
    }

    /// Sign a message hash (at least 32 bytes) with a fresh nonce from `rng`.
    pub fn sign<R: RngCore + CryptoRng + ?Sized>(
        &self,
        msg_hash: &[u8],
        rng: &mut R,
    ) -> Result<Signature> {
        signature::sign(self, msg_hash, rng)
    }

    pub fn curve(&self) -> &'static Curve {
        match self.secret {
            Secret::P224(_) => Curve::p224(),
            Secret::P256(_) => Curve::p256(),
        }
    }

    pub(crate) fn secret(&self) -> &Secret {
        &self.secret
    }
}

fn random_secret<C, R>(rng: &mut R) -> Result<SecretKey<C>>
where
    C: CurveArithmetic,
    R: RngCore + CryptoRng + ?Sized,
{
    let d = random_scalar::<C, R>(rng)?;
    secret_from_scalar(d).ok_or(Error::InvalidScalarEncoding {
        reason: "private key out of range",
    })
}

fn secret_from_bytes<C: CurveArithmetic>(bytes: &[u8]) -> Result<SecretKey<C>> {
    scalar_from_be_bytes::<C>(bytes)
        .and_then(secret_from_scalar)
        .ok_or(Error::InvalidScalarEncoding {
            reason: "private key out of range",
        })
}

fn secret_from_scalar<C: CurveArithmetic>(d: Scalar<C>) -> Option<SecretKey<C>> {
    Option::<NonZeroScalar<C>>::from(NonZeroScalar::new(d)).map(SecretKey::from)
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.curve().id() == other.curve().id()
            && constant_eq(&self.to_bytes(), &other.to_bytes())
    }
}

impl Eq for PrivateKey {}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("curve", &self.curve().id())
            .field("d", &"<redacted>")
            .finish()
    }
}

/// A finite curve point (X, Y) known to lie on its curve.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    point: KeyPoint,
}

#[derive(Clone, PartialEq, Eq)]
pub(crate) enum KeyPoint {
    P224(p224::PublicKey),
    P256(p256::PublicKey),
}

impl PublicKey {
    /// Wrap an arithmetic result. Only the identity is rejected.
    pub fn from_point(point: Point) -> Result<Self> {
        let at_infinity = |_| Error::InvalidPointEncoding {
            reason: "point at infinity",
        };
        let point = match point {
            Point::P224(p) => {
                KeyPoint::P224(p224::PublicKey::from_affine(p).map_err(at_infinity)?)
            }
            Point::P256(p) => {
                KeyPoint::P256(p256::PublicKey::from_affine(p).map_err(at_infinity)?)
            }
        };
        Ok(PublicKey { point })
    }

    /// Decode `X || Y`, each coordinate fixed-width big-endian.
    pub fn from_bytes(curve: &'static Curve, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 2 * curve.byte_len() {
            return Err(Error::InvalidPointEncoding {
                reason: "uncompressed key has wrong length",
            });
        }
        let mut sec1 = Vec::with_capacity(1 + bytes.len());
        sec1.push(UNCOMPRESSED_TAG);
        sec1.extend_from_slice(bytes);

        let point = match curve.id() {
            CurveId::P224 => KeyPoint::P224(decode_sec1(&sec1)?),
            CurveId::P256 => KeyPoint::P256(decode_sec1(&sec1)?),
        };
        Ok(PublicKey { point })
    }

    /// Decode `parity || X` where parity is 0x02 (even y) or 0x03 (odd y).
    pub fn from_compressed_bytes(curve: &'static Curve, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 1 + curve.byte_len() {
            return Err(Error::InvalidPointEncoding {
                reason: "compressed key has wrong length",
            });
        }
        let want_odd = match bytes[0] {
            COMPRESSED_EVEN => false,
            COMPRESSED_ODD => true,
            _ => {
                return Err(Error::InvalidPointEncoding {
                    reason: "unknown compression prefix",
                })
            }
        };

        let (even, odd) =
            dual_roots(&bytes[1..], curve).map_err(|_| Error::InvalidPointEncoding {
                reason: "x coordinate is not on the curve",
            })?;
        PublicKey::from_point(if want_odd { odd } else { even })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut sec1 = self.to_sec1(false);
        sec1.remove(0);
        sec1
    }

    pub fn to_compressed_bytes(&self) -> Vec<u8> {
        self.to_sec1(true)
    }

    /// Sanity check that the coordinates satisfy the curve equation.
    pub fn is_on_curve(&self) -> bool {
        let len = self.curve().byte_len();
        let raw = self.to_bytes();
        self.curve().is_on_curve(&raw[..len], &raw[len..])
    }

    pub fn verify(&self, msg_hash: &[u8], sig: &Signature) -> bool {
        signature::verify(self, msg_hash, sig)
    }

    pub fn address(&self, compressed: bool) -> Address {
        Address::from_public_key(self, compressed)
    }

    pub fn x(&self) -> Vec<u8> {
        self.to_bytes()[..self.curve().byte_len()].to_vec()
    }

    pub fn y(&self) -> Vec<u8> {
        self.to_bytes()[self.curve().byte_len()..].to_vec()
    }

    pub fn curve(&self) -> &'static Curve {
        match self.point {
            KeyPoint::P224(_) => Curve::p224(),
            KeyPoint::P256(_) => Curve::p256(),
        }
    }

    pub fn to_point(&self) -> Point {
        match &self.point {
            KeyPoint::P224(pk) => Point::P224(*pk.as_affine()),
            KeyPoint::P256(pk) => Point::P256(*pk.as_affine()),
        }
    }

    pub(crate) fn point(&self) -> &KeyPoint {
        &self.point
    }

    fn to_sec1(&self, compress: bool) -> Vec<u8> {
        match &self.point {
            KeyPoint::P224(pk) => NistP224::to_sec1(pk.as_affine(), compress),
            KeyPoint::P256(pk) => NistP256::to_sec1(pk.as_affine(), compress),
        }
    }
}

fn decode_sec1<C: NistCurve>(sec1: &[u8]) -> Result<elliptic_curve::PublicKey<C>> {
    C::from_sec1(sec1)
        .and_then(|point| elliptic_curve::PublicKey::from_affine(point).ok())
        .ok_or(Error::InvalidPointEncoding {
            reason: "point is not on the curve",
        })
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("curve", &self.curve().id())
            .field("compressed", &hex::encode(self.to_compressed_bytes()))
            .finish()
    }
}
