//! Cross-check key derivation and signatures against the RustCrypto P-224
//! implementation.
//!
//! Signing uses the first 32 bytes of the hash, which is wider than the P-224
//! field. A hash whose first four bytes are zero has the same integer value
//! as its last 28 bytes, and that is the prehash handed to `p224`.

use bitcoin::hashes::{sha256, Hash};
use p224::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use p224::ecdsa::{Signature as P224Signature, SigningKey, VerifyingKey};
use p224::elliptic_curve::sec1::ToEncodedPoint;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use recoverable_ecdsa::{reconstruct_public_key, Curve, PrivateKey, PublicKey, Signature};

fn narrow_hash(msg: &[u8]) -> [u8; 32] {
    let digest = sha256::Hash::hash(msg).to_byte_array();
    let mut hash = [0u8; 32];
    hash[4..].copy_from_slice(&digest[..28]);
    hash
}

#[test]
fn test_public_key_matches_p224() {
    let mut rng = ChaCha20Rng::seed_from_u64(224);
    for _ in 0..5 {
        let key = PrivateKey::generate(Curve::p224(), &mut rng).unwrap();
        let secret = p224::SecretKey::from_slice(&key.to_bytes()).unwrap();

        let uncompressed = secret.public_key().to_encoded_point(false);
        assert_eq!(
            &uncompressed.as_bytes()[1..],
            key.public_key().to_bytes().as_slice()
        );

        let compressed = secret.public_key().to_encoded_point(true);
        assert_eq!(
            compressed.as_bytes(),
            key.public_key().to_compressed_bytes().as_slice()
        );
    }
}

#[test]
fn test_compressed_key_from_p224_decodes() {
    let mut rng = ChaCha20Rng::seed_from_u64(225);
    for _ in 0..5 {
        let secret = p224::SecretKey::random(&mut rng);
        let encoded = secret.public_key().to_encoded_point(true);

        let key = PublicKey::from_compressed_bytes(Curve::p224(), encoded.as_bytes()).unwrap();
        let uncompressed = secret.public_key().to_encoded_point(false);
        assert_eq!(&uncompressed.as_bytes()[1..], key.to_bytes().as_slice());
    }
}

#[test]
fn test_signature_verifies_with_p224() {
    let mut rng = ChaCha20Rng::seed_from_u64(226);
    let curve = Curve::p224();
    let hash = narrow_hash(b"interop");

    for _ in 0..5 {
        let key = PrivateKey::generate(curve, &mut rng).unwrap();
        let sig = key.sign(&hash, &mut rng).unwrap();
        assert_eq!(sig.r.len(), 28);

        let rs = sig.to_bytes(curve);
        let theirs = P224Signature::from_slice(&rs[..56]).unwrap();

        let mut sec1 = vec![0x04];
        sec1.extend(key.public_key().to_bytes());
        let verifying_key = VerifyingKey::from_sec1_bytes(&sec1).unwrap();

        assert!(verifying_key.verify_prehash(&hash[4..], &theirs).is_ok());
    }
}

#[test]
fn test_p224_signature_verifies_and_reconstructs() {
    let mut rng = ChaCha20Rng::seed_from_u64(227);
    let curve = Curve::p224();
    let hash = narrow_hash(b"signed elsewhere");

    for _ in 0..5 {
        let key = PrivateKey::generate(curve, &mut rng).unwrap();
        let signing_key = SigningKey::from_slice(&key.to_bytes()).unwrap();
        let theirs: P224Signature = signing_key.sign_prehash(&hash[4..]).unwrap();
        let bytes = theirs.to_bytes();

        let mut sig = Signature {
            r: bytes[..28].to_vec(),
            s: bytes[28..].to_vec(),
            v: 0,
            o: 0,
        };
        assert!(key.public_key().verify(&hash, &sig));

        // no recovery id comes with it; exactly one of the two names the signer
        let first = reconstruct_public_key(&sig, &hash, curve).unwrap();
        sig.v = 1;
        let second = reconstruct_public_key(&sig, &hash, curve).unwrap();
        assert_ne!(first, second);
        assert!(first == key.public_key() || second == key.public_key());
    }
}
