//! Public key reconstruction from a signature and the signed hash.
//!
//! Q = r⁻¹(s·K − z·G), where K is the nonce point whose x-coordinate is `r`
//! and whose y-coordinate is picked by the recovery id `v`.
//!
//! A reconstructed key only tells you *which* key would have produced the
//! signature. It proves nothing on its own: compare it against an expected
//! key or address before trusting it.

use elliptic_curve::ff::{Field, PrimeField};
use elliptic_curve::group::{Curve as _, Group};
use elliptic_curve::{ProjectivePoint, Scalar};
use p224::NistP224;
use p256::NistP256;

use crate::curve::{Curve, CurveId, NistCurve, Point};
use crate::ecmath::{dual_roots_on, negate_on};
use crate::error::{Error, Result};
use crate::keys::PublicKey;
use crate::signature::{message_scalar, Signature};

pub fn reconstruct_public_key(
    sig: &Signature,
    msg_hash: &[u8],
    curve: &'static Curve,
) -> Result<PublicKey> {
    let point = match curve.id() {
        CurveId::P224 => reconstruct_on::<NistP224>(sig, msg_hash)?,
        CurveId::P256 => reconstruct_on::<NistP256>(sig, msg_hash)?,
    };
    PublicKey::from_point(point)
}

fn reconstruct_on<C: NistCurve>(sig: &Signature, msg_hash: &[u8]) -> Result<Point> {
    let z = message_scalar::<C>(msg_hash)?;
    if sig.v > 1 {
        return Err(Error::InvalidRecoveryId(sig.v));
    }
    let (r, s) = sig.scalars::<C>().ok_or(Error::InvalidScalarEncoding {
        reason: "signature scalar out of range",
    })?;

    let (first, second) = dual_roots_on::<C>(&r.to_repr())?;
    let nonce_point = if sig.v == 0 { first } else { second };

    let s_k = ProjectivePoint::<C>::from(nonce_point) * s;
    let z_g = (ProjectivePoint::<C>::generator() * z).to_affine();
    let t = s_k + ProjectivePoint::<C>::from(negate_on::<C>(&z_g));

    let r_inv = Option::<Scalar<C>>::from(r.invert()).ok_or(Error::InvalidScalarEncoding {
        reason: "signature scalar out of range",
    })?;
    Ok(C::wrap((t * r_inv).to_affine()))
}
