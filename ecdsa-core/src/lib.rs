//! ECDSA over the NIST prime curves with public key reconstruction and
//! Merkle-addressed multisig.
//!
//! Signatures carry a recovery id so the signer's public key can be rebuilt
//! from `(signature, hash)` alone. A group of partner keys shares one 22-byte
//! address built from a Merkle root over their compressed keys; the group
//! authorizes by presenting one signature per partner, each stamped with the
//! partner's order index.
//!
//! All randomness is injected: pass `rand::rngs::OsRng` in production or a
//! seeded RNG in tests.

pub mod address;
pub mod curve;
pub mod ecmath;
pub mod error;
pub mod keys;
pub mod merkle;
pub mod multisig;
pub mod recover;
pub mod signature;

// Re-export commonly used items
pub use address::{
    is_address_compressed, is_address_valid, is_multisig_address, partner_count, Address,
};
pub use curve::{Curve, CurveId, Point};
pub use error::{Error, Result};
pub use keys::{PrivateKey, PublicKey};
pub use multisig::{multisig_address, verify_multisig, MultiSigKey};
pub use recover::reconstruct_public_key;
pub use signature::{sign, verify, Signature};
