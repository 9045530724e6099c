//! Merkle-addressed multisig: N partner keys share one address, each partner
//! signs independently, and the set of signatures is checked by rebuilding
//! the address from the reconstructed keys.

use rand::{CryptoRng, RngCore};

use crate::address::{Address, DIGEST_LEN};
use crate::curve::Curve;
use crate::ecmath::constant_eq;
use crate::error::{Error, Result};
use crate::keys::{PrivateKey, PublicKey};
use crate::merkle::{MerkleProof, MerkleTree};
use crate::recover::reconstruct_public_key;
use crate::signature::Signature;

/// A partner key: a private key plus its slot in the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiSigKey {
    key: PrivateKey,
    order: u8,
    partners: u8,
}

impl MultiSigKey {
    pub fn new(key: PrivateKey, order: u8, partners: u8) -> Result<Self> {
        if order >= partners {
            return Err(Error::InvalidOrder { order, partners });
        }
        Ok(MultiSigKey {
            key,
            order,
            partners,
        })
    }

    /// Fresh random key for slot `order` of a `partners`-sized group.
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(
        curve: &'static Curve,
        order: u8,
        partners: u8,
        rng: &mut R,
    ) -> Result<Self> {
        Self::new(PrivateKey::generate(curve, rng)?, order, partners)
    }

    /// Sign and stamp the signature with this partner's order.
    pub fn sign<R: RngCore + CryptoRng + ?Sized>(
        &self,
        msg_hash: &[u8],
        rng: &mut R,
    ) -> Result<Signature> {
        let mut sig = self.key.sign(msg_hash, rng)?;
        sig.o = self.order;
        Ok(sig)
    }

    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn order(&self) -> u8 {
        self.order
    }

    pub fn partners(&self) -> u8 {
        self.partners
    }
}

/// Multisig address for keys already arranged in partner order.
pub fn multisig_address(ordered_keys: &[PublicKey]) -> Result<Address> {
    Address::multisig(ordered_keys)
}

/// Check a full set of partner signatures over `msg_hash` against `address`.
///
/// Every partner must contribute exactly one signature: the set is rejected
/// when its size differs from the address's partner count, when an order
/// index is out of range, or when two signatures claim the same slot. Each
/// signature's key is reconstructed into its slot and the address is rebuilt
/// from the slots.
pub fn verify_multisig(
    signatures: &[Signature],
    msg_hash: &[u8],
    address: &Address,
    curve: &'static Curve,
) -> bool {
    let Some(partners) = address.partner_count() else {
        tracing::debug!(%address, "rejecting multisig: not a multisig address");
        return false;
    };
    if signatures.len() != partners as usize {
        tracing::debug!(
            got = signatures.len(),
            expected = partners,
            "rejecting multisig: wrong number of signatures"
        );
        return false;
    }

    let mut slots: Vec<Option<PublicKey>> = vec![None; signatures.len()];
    for sig in signatures {
        let slot = sig.o as usize;
        if slot >= slots.len() {
            tracing::debug!(order = sig.o, partners, "rejecting multisig: order out of range");
            return false;
        }
        if slots[slot].is_some() {
            tracing::debug!(order = sig.o, "rejecting multisig: duplicate order");
            return false;
        }

        let key = match reconstruct_public_key(sig, msg_hash, curve) {
            Ok(key) => key,
            Err(e) => {
                tracing::debug!(order = sig.o, error = %e, "rejecting multisig: reconstruction failed");
                return false;
            }
        };
        if !key.verify(msg_hash, sig) {
            tracing::debug!(order = sig.o, "rejecting multisig: signature does not verify");
            return false;
        }
        slots[slot] = Some(key);
    }

    // every slot is filled: one signature per slot, no duplicates, none out of range
    let Some(keys) = slots.into_iter().collect::<Option<Vec<_>>>() else {
        return false;
    };

    match Address::multisig(&keys) {
        Ok(rebuilt) => constant_eq(rebuilt.as_bytes(), address.as_bytes()),
        Err(_) => false,
    }
}

/// Inclusion proof that the key at `order` belongs to the group's address.
pub fn member_proof(ordered_keys: &[PublicKey], order: u8) -> Option<MerkleProof> {
    let leaves: Vec<Vec<u8>> = ordered_keys
        .iter()
        .map(PublicKey::to_compressed_bytes)
        .collect();
    MerkleTree::build(&leaves).proof(order as usize)
}

/// Check a single partner's membership without the rest of the group's keys.
pub fn verify_member(address: &Address, key: &PublicKey, proof: &MerkleProof) -> bool {
    if !address.is_multisig() {
        return false;
    }
    let root = proof.compute_root(&key.to_compressed_bytes());
    constant_eq(&root[..DIGEST_LEN], address.digest())
}
