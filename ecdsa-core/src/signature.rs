//! ECDSA signing and verification with a recovery id.

use elliptic_curve::ff::{Field, PrimeField};
use elliptic_curve::group::{Curve as _, Group};
use elliptic_curve::point::AffineCoordinates;
use elliptic_curve::{ProjectivePoint, Scalar, SecretKey};
use p224::NistP224;
use p256::NistP256;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::curve::{
    is_identity, random_scalar, reduce_be_bytes, scalar_from_be_bytes, Curve, NistCurve,
};
use crate::ecmath::dual_roots_on;
use crate::error::{Error, Result};
use crate::keys::{KeyPoint, PrivateKey, PublicKey, Secret};

/// Bytes of the message hash that feed the signature scalar.
pub const HASH_LEN: usize = 32;

/// An ECDSA signature extended with a recovery id and multisig order.
///
/// `r` and `s` are big-endian scalars; signing emits them at the curve's full
/// width, shorter input is left-padded when read. `v` selects which of the
/// two y-roots of `x = r` was the nonce point's y, see
/// [`crate::ecmath::dual_roots`]. `o` is the signer's slot in a multisig
/// group and is zero for single-signer use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde(with = "hex::serde")]
    pub r: Vec<u8>,
    #[serde(with = "hex::serde")]
    pub s: Vec<u8>,
    pub v: u8,
    pub o: u8,
}

impl Signature {
    /// Fixed layout `r || s || v || o`, scalars left-padded to the curve's width.
    pub fn to_bytes(&self, curve: &Curve) -> Vec<u8> {
        let len = curve.byte_len();
        let mut out = Vec::with_capacity(2 * len + 2);
        for scalar in [&self.r, &self.s] {
            out.resize(out.len() + len.saturating_sub(scalar.len()), 0);
            out.extend_from_slice(scalar);
        }
        out.push(self.v);
        out.push(self.o);
        out
    }

    pub fn from_bytes(curve: &Curve, bytes: &[u8]) -> Result<Self> {
        let len = curve.byte_len();
        if bytes.len() != 2 * len + 2 {
            return Err(Error::InvalidScalarEncoding {
                reason: "signature has wrong length",
            });
        }
        let v = bytes[2 * len];
        if v > 1 {
            return Err(Error::InvalidRecoveryId(v));
        }
        Ok(Signature {
            r: bytes[..len].to_vec(),
            s: bytes[len..2 * len].to_vec(),
            v,
            o: bytes[2 * len + 1],
        })
    }

    /// See [`crate::recover::reconstruct_public_key`].
    pub fn reconstruct_public_key(
        &self,
        msg_hash: &[u8],
        curve: &'static Curve,
    ) -> Result<PublicKey> {
        crate::recover::reconstruct_public_key(self, msg_hash, curve)
    }

    /// `(r, s)` when both are in [1, n-1].
    pub(crate) fn scalars<C: NistCurve>(&self) -> Option<(Scalar<C>, Scalar<C>)> {
        Some((
            scalar_from_be_bytes::<C>(&self.r)?,
            scalar_from_be_bytes::<C>(&self.s)?,
        ))
    }
}

/// z: the first 32 bytes of the hash as a big-endian integer, reduced mod n.
pub(crate) fn message_scalar<C: NistCurve>(msg_hash: &[u8]) -> Result<Scalar<C>> {
    if msg_hash.len() < HASH_LEN {
        return Err(Error::HashTooShort {
            len: msg_hash.len(),
        });
    }
    Ok(reduce_be_bytes::<C>(&msg_hash[..HASH_LEN]))
}

/// Sign `msg_hash` with `key`, drawing nonces from `rng` until the result
/// is non-degenerate.
pub fn sign<R: RngCore + CryptoRng + ?Sized>(
    key: &PrivateKey,
    msg_hash: &[u8],
    rng: &mut R,
) -> Result<Signature> {
    match key.secret() {
        Secret::P224(sk) => sign_on::<NistP224, R>(sk, msg_hash, rng),
        Secret::P256(sk) => sign_on::<NistP256, R>(sk, msg_hash, rng),
    }
}

fn sign_on<C, R>(key: &SecretKey<C>, msg_hash: &[u8], rng: &mut R) -> Result<Signature>
where
    C: NistCurve,
    R: RngCore + CryptoRng + ?Sized,
{
    let z = message_scalar::<C>(msg_hash)?;
    let d: Scalar<C> = *key.to_nonzero_scalar();

    loop {
        let k = random_scalar::<C, R>(rng)?;
        if let Some(sig) = sign_with_nonce::<C>(&d, &z, &k)? {
            return Ok(sig);
        }
        tracing::trace!(curve = %C::descriptor().id(), "degenerate nonce, drawing another");
    }
}

/// `Ok(None)` means the nonce was degenerate and must be replaced.
fn sign_with_nonce<C: NistCurve>(
    d: &Scalar<C>,
    z: &Scalar<C>,
    k: &Scalar<C>,
) -> Result<Option<Signature>> {
    let nonce_point = (ProjectivePoint::<C>::generator() * *k).to_affine();
    if is_identity::<C>(&nonce_point) {
        return Ok(None);
    }

    // r must equal Kx exactly, otherwise (r, v) no longer identifies K
    let Some(r) = scalar_from_be_bytes::<C>(&nonce_point.x()) else {
        return Ok(None);
    };
    let Some(k_inv) = Option::<Scalar<C>>::from(k.invert()) else {
        return Ok(None);
    };

    let s = k_inv * (*z + r * *d);
    if bool::from(s.is_zero()) {
        return Ok(None);
    }

    let (first_root, _) = dual_roots_on::<C>(&r.to_repr())?;
    let v = if first_root == nonce_point { 0 } else { 1 };

    Ok(Some(Signature {
        r: r.to_repr().to_vec(),
        s: s.to_repr().to_vec(),
        v,
        o: 0,
    }))
}

/// Standard ECDSA verification. Any malformed input yields `false`.
pub fn verify(key: &PublicKey, msg_hash: &[u8], sig: &Signature) -> bool {
    match key.point() {
        KeyPoint::P224(pk) => verify_on::<NistP224>(pk, msg_hash, sig),
        KeyPoint::P256(pk) => verify_on::<NistP256>(pk, msg_hash, sig),
    }
}

fn verify_on<C: NistCurve>(
    key: &elliptic_curve::PublicKey<C>,
    msg_hash: &[u8],
    sig: &Signature,
) -> bool {
    let z = match message_scalar::<C>(msg_hash) {
        Ok(z) => z,
        Err(e) => {
            tracing::debug!(error = %e, "rejecting signature");
            return false;
        }
    };
    let Some((r, s)) = sig.scalars::<C>() else {
        tracing::debug!("rejecting signature: r or s out of range");
        return false;
    };
    let Some(w) = Option::<Scalar<C>>::from(s.invert()) else {
        return false;
    };

    let u1 = z * w;
    let u2 = r * w;
    let point = ProjectivePoint::<C>::generator() * u1 + key.to_projective() * u2;
    if bool::from(point.is_identity()) {
        tracing::debug!("rejecting signature: u1·G + u2·Q is the identity");
        return false;
    }

    reduce_be_bytes::<C>(&point.to_affine().x()) == r
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::{sha256, Hash};
    use elliptic_curve::group::Curve as _;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn digest(msg: &[u8]) -> [u8; 32] {
        sha256::Hash::hash(msg).to_byte_array()
    }

    #[test]
    fn test_sign_and_verify_both_curves() {
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        let data = digest(b"test data");
        for curve in [Curve::p224(), Curve::p256()] {
            let key = PrivateKey::generate(curve, &mut rng).unwrap();
            let sig = key.sign(&data, &mut rng).unwrap();
            assert!(sig.v <= 1);
            assert_eq!(sig.o, 0);
            assert_eq!(sig.r.len(), curve.byte_len());
            assert_eq!(sig.s.len(), curve.byte_len());
            assert!(key.public_key().verify(&data, &sig));
        }
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let curve = Curve::p256();
        let data = digest(b"test data");
        let key = PrivateKey::generate(curve, &mut rng).unwrap();
        let pubkey = key.public_key();
        let sig = key.sign(&data, &mut rng).unwrap();

        // short data
        assert!(!pubkey.verify(&data[1..4], &sig));

        let mut altered = data;
        altered[7] ^= 0x80;
        assert!(!pubkey.verify(&altered, &sig));

        let mut bad_r = sig.clone();
        bad_r.r[20] ^= 0x05;
        assert!(!pubkey.verify(&data, &bad_r));

        let mut bad_s = sig.clone();
        bad_s.s[31] ^= 0x01;
        assert!(!pubkey.verify(&data, &bad_s));

        let other = PrivateKey::generate(curve, &mut rng).unwrap().public_key();
        assert!(!other.verify(&data, &sig));
    }

    #[test]
    fn test_verify_rejects_out_of_range_scalars() {
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        let curve = Curve::p224();
        let data = digest(b"range");
        let key = PrivateKey::generate(curve, &mut rng).unwrap();
        let sig = key.sign(&data, &mut rng).unwrap();

        let mut zero_s = sig.clone();
        zero_s.s = vec![0u8; 28];
        assert!(!key.public_key().verify(&data, &zero_s));

        let mut high_r = sig.clone();
        high_r.r = vec![0xffu8; 28];
        assert!(!key.public_key().verify(&data, &high_r));

        let mut wide_r = sig;
        wide_r.r.insert(0, 0x01);
        assert!(!key.public_key().verify(&data, &wide_r));
    }

    #[test]
    fn test_sign_rejects_short_hash() {
        let mut rng = ChaCha20Rng::seed_from_u64(13);
        let key = PrivateKey::generate(Curve::p256(), &mut rng).unwrap();
        let err = key.sign(&[0u8; 31], &mut rng).unwrap_err();
        assert!(matches!(err, Error::HashTooShort { len: 31 }));
    }

    #[test]
    fn test_only_first_32_bytes_are_signed() {
        let mut rng = ChaCha20Rng::seed_from_u64(14);
        for curve in [Curve::p224(), Curve::p256()] {
            let key = PrivateKey::generate(curve, &mut rng).unwrap();
            let mut long = [7u8; 48];
            let sig = key.sign(&long, &mut rng).unwrap();
            long[40] = 0;
            assert!(key.public_key().verify(&long, &sig));
            assert!(key.public_key().verify(&long[..32], &sig));

            // on P-224 the trailing four of the 32 bytes still count
            long[31] ^= 0x01;
            assert!(!key.public_key().verify(&long, &sig));
        }
    }

    #[test]
    fn test_recovery_id_selects_nonce_point() {
        let d = p256::Scalar::from(0x1234_5678u64);
        let z = p256::Scalar::from(42u64);
        let mut seen = [false; 2];
        for k in 1u64..24 {
            let k = p256::Scalar::from(k);
            let Some(sig) = sign_with_nonce::<NistP256>(&d, &z, &k).unwrap() else {
                continue;
            };
            let r = scalar_from_be_bytes::<NistP256>(&sig.r).unwrap();
            let (first, second) = dual_roots_on::<NistP256>(&r.to_repr()).unwrap();
            let expected = (p256::ProjectivePoint::generator() * k).to_affine();
            let chosen = if sig.v == 0 { first } else { second };
            assert_eq!(chosen, expected);
            seen[sig.v as usize] = true;
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn test_signature_bytes_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(15);
        let curve = Curve::p224();
        let key = PrivateKey::generate(curve, &mut rng).unwrap();
        let mut sig = key.sign(&digest(b"bytes"), &mut rng).unwrap();
        sig.o = 9;

        let bytes = sig.to_bytes(curve);
        assert_eq!(bytes.len(), 2 * 28 + 2);
        assert_eq!(Signature::from_bytes(curve, &bytes).unwrap(), sig);

        let mut bad_v = bytes.clone();
        bad_v[56] = 2;
        assert!(matches!(
            Signature::from_bytes(curve, &bad_v),
            Err(Error::InvalidRecoveryId(2))
        ));
        assert!(Signature::from_bytes(curve, &bytes[1..]).is_err());
    }

    #[test]
    fn test_signature_json_uses_hex() {
        let sig = Signature {
            r: vec![0xab, 0xcd],
            s: vec![0x01],
            v: 1,
            o: 3,
        };
        let json = serde_json::to_string(&sig).unwrap();
        assert_eq!(json, r#"{"r":"abcd","s":"01","v":1,"o":3}"#);
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);

        // short scalars are left-padded
        let (r, s) = sig.scalars::<NistP256>().unwrap();
        assert_eq!(r, p256::Scalar::from(0xabcdu64));
        assert_eq!(s, p256::Scalar::ONE);
        assert_eq!(sig.to_bytes(Curve::p256())[..32][30..], [0xab, 0xcd]);
    }
}
