//! Point helpers shared by signing, key decoding and reconstruction.

use elliptic_curve::group::Curve as _;
use elliptic_curve::subtle::ConstantTimeEq;
use elliptic_curve::{AffinePoint, CurveArithmetic, FieldBytes, ProjectivePoint};
use p224::NistP224;
use p256::NistP256;

use crate::curve::{Curve, CurveId, NistCurve, Point};
use crate::error::{Error, Result};

/// Both points with x-coordinate `x`, as `(even y, odd y)`.
///
/// Recovery ids are defined against this ordering: `v = 0` names the first
/// root, so it must stay stable.
pub fn dual_roots(x: &[u8], curve: &Curve) -> Result<(Point, Point)> {
    if x.len() != curve.byte_len() {
        return Err(Error::InvalidPointEncoding {
            reason: "x coordinate has wrong length",
        });
    }
    match curve.id() {
        CurveId::P224 => wrapped_roots::<NistP224>(x),
        CurveId::P256 => wrapped_roots::<NistP256>(x),
    }
}

fn wrapped_roots<C: NistCurve>(x: &[u8]) -> Result<(Point, Point)> {
    let (even, odd) = dual_roots_on::<C>(FieldBytes::<C>::from_slice(x))?;
    Ok((C::wrap(even), C::wrap(odd)))
}

/// Square roots of `x³ - 3x + b`, lifted to points. `x` at or above the
/// field prime, or with no root, gives [`Error::NoValidRoot`].
pub(crate) fn dual_roots_on<C: NistCurve>(
    x: &FieldBytes<C>,
) -> Result<(AffinePoint<C>, AffinePoint<C>)> {
    let even = C::decompress(x, false).ok_or(Error::NoValidRoot)?;
    let odd = C::decompress(x, true).ok_or(Error::NoValidRoot)?;
    Ok((even, odd))
}

/// Additive inverse: (x, p - y).
pub fn negate(point: &Point) -> Point {
    match point {
        Point::P224(p) => Point::P224(negate_on::<NistP224>(p)),
        Point::P256(p) => Point::P256(negate_on::<NistP256>(p)),
    }
}

pub(crate) fn negate_on<C: CurveArithmetic>(point: &AffinePoint<C>) -> AffinePoint<C> {
    (-ProjectivePoint::<C>::from(*point)).to_affine()
}

/// Byte equality that does not short-circuit on the first difference.
/// Slices of different length compare unequal.
pub fn constant_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use elliptic_curve::group::{Curve as _, Group};
    use elliptic_curve::sec1::ToEncodedPoint;

    #[test]
    fn test_dual_roots_contain_generator() {
        for curve in [Curve::p224(), Curve::p256()] {
            let g = curve.generator();
            let x = g.x().unwrap();
            let (even, odd) = dual_roots(&x, curve).unwrap();
            assert_ne!(even, odd);
            assert!(g == even || g == odd);

            for root in [even, odd] {
                let (rx, ry) = root.coordinates().unwrap();
                assert_eq!(rx, x);
                assert!(curve.is_on_curve(&rx, &ry));
            }
            assert_eq!(even.y().unwrap().last().unwrap() & 1, 0);
            assert_eq!(odd.y().unwrap().last().unwrap() & 1, 1);
        }
    }

    // Published P-256 multiple 2·G
    #[test]
    fn test_dual_roots_p256_vector() {
        let x = hex::decode("7cf27b188d034f7e8a52380304b51ac3c08969e277f21b35a60b48fc47669978")
            .unwrap();
        let y = hex::decode("07775510db8ed040293d9ac69f7430dbba7dade63ce982299e04b79d227873d1")
            .unwrap();
        let (first, second) = dual_roots(&x, Curve::p256()).unwrap();
        assert_eq!(second.y().unwrap(), y);
        assert_eq!(negate(&second), first);
    }

    // Published P-224 multiple 2·G; p ≡ 1 (mod 4) here, so this hits Tonelli-Shanks
    #[test]
    fn test_dual_roots_p224_vector() {
        let x = hex::decode("706a46dc76dcb76798e60e6d89474788d16dc18032d268fd1a704fa6").unwrap();
        let y = hex::decode("1c2b76a7bc25e7702a704fa986892849fca629487acf3709d2e4e8bb").unwrap();
        let (first, second) = dual_roots(&x, Curve::p224()).unwrap();
        assert_eq!(second.y().unwrap(), y);
        assert_eq!(negate(&second), first);

        let doubled = (ProjectivePoint::<NistP224>::generator().double()).to_affine();
        assert_eq!(Point::P224(doubled), second);
    }

    #[test]
    fn test_dual_roots_rejects_x_off_curve() {
        let curve = Curve::p256();
        // roughly half of all x have no point; walk until one fails
        let mut x = [0u8; 32];
        loop {
            x[31] += 1;
            if dual_roots(&x, curve).is_err() {
                break;
            }
        }
        assert!(matches!(dual_roots(&x, curve), Err(Error::NoValidRoot)));

        // at or above the field prime
        assert!(matches!(
            dual_roots(&[0xffu8; 32], curve),
            Err(Error::NoValidRoot)
        ));
        assert!(dual_roots(&x[1..], curve).is_err());
    }

    #[test]
    fn test_negate_adds_to_identity() {
        let g = ProjectivePoint::<NistP256>::generator();
        let point = (g + g + g).to_affine();
        let neg = negate_on::<NistP256>(&point);
        let sum = ProjectivePoint::<NistP256>::from(point) + ProjectivePoint::<NistP256>::from(neg);
        assert!(bool::from(sum.is_identity()));

        let encoded = point.to_encoded_point(false);
        let neg_encoded = neg.to_encoded_point(false);
        assert_eq!(encoded.x(), neg_encoded.x());
        assert_ne!(encoded.y(), neg_encoded.y());

        let wrapped = Point::P256(point);
        assert_eq!(negate(&negate(&wrapped)), wrapped);
        assert!(negate(&Point::P224(AffinePoint::<NistP224>::default())).is_identity());
    }

    #[test]
    fn test_constant_eq() {
        assert!(constant_eq(b"abc", b"abc"));
        assert!(!constant_eq(b"abc", b"abd"));
        assert!(!constant_eq(b"abc", b"abcd"));
        assert!(constant_eq(&[], &[]));
    }
}
