//! 22-byte addresses: `[compression flag][partner count][20-byte digest]`.
//!
//! Single-signer addresses carry HASH160 of the key encoding and a zero count
//! byte. Multisig addresses carry the first 20 bytes of the Merkle root over
//! the partners' compressed keys, in partner order, with the compression flag
//! set and the partner count in the second byte.

use std::fmt;
use std::str::FromStr;

use bitcoin::hashes::{hash160, Hash};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::keys::PublicKey;
use crate::merkle::MerkleTree;

pub const ADDRESS_LEN: usize = 22;
pub const DIGEST_LEN: usize = 20;

const UNCOMPRESSED: u8 = 0x00;
const COMPRESSED: u8 = 0x01;
const SINGLE_SIGNER: u8 = 0x00;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// Single-signer address over the compressed or uncompressed key bytes.
    pub fn from_public_key(key: &PublicKey, compressed: bool) -> Self {
        let (flag, encoded) = if compressed {
            (COMPRESSED, key.to_compressed_bytes())
        } else {
            (UNCOMPRESSED, key.to_bytes())
        };
        let digest = hash160::Hash::hash(&encoded).to_byte_array();
        Address::from_parts(flag, SINGLE_SIGNER, &digest)
    }

    /// Multisig address over an ordered set of partner keys.
    ///
    /// Order is significant: slot `i` belongs to the partner whose signatures
    /// carry `o = i`.
    pub fn multisig(keys: &[PublicKey]) -> Result<Self> {
        let partners = u8::try_from(keys.len())
            .ok()
            .filter(|count| *count > 0)
            .ok_or(Error::InvalidPartnerCount(keys.len()))?;

        let leaves: Vec<Vec<u8>> = keys.iter().map(PublicKey::to_compressed_bytes).collect();
        let root = MerkleTree::build(&leaves).root();
        Ok(Address::from_parts(COMPRESSED, partners, &root[..DIGEST_LEN]))
    }

    fn from_parts(flag: u8, count: u8, digest: &[u8]) -> Self {
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes[0] = flag;
        bytes[1] = count;
        bytes[2..].copy_from_slice(digest);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    pub fn digest(&self) -> &[u8] {
        &self.0[2..]
    }

    pub fn is_compressed(&self) -> bool {
        is_address_compressed(&self.0)
    }

    pub fn is_multisig(&self) -> bool {
        is_multisig_address(&self.0)
    }

    /// Number of partners for a multisig address.
    pub fn partner_count(&self) -> Option<u8> {
        partner_count(&self.0)
    }
}

/// Length is 22, the flag byte is 0 or 1, and a non-zero count byte only
/// appears together with the compression flag.
pub fn is_address_valid(bytes: &[u8]) -> bool {
    if bytes.len() != ADDRESS_LEN {
        return false;
    }
    matches!(
        (bytes[0], bytes[1]),
        (UNCOMPRESSED, SINGLE_SIGNER) | (COMPRESSED, _)
    )
}

pub fn is_address_compressed(bytes: &[u8]) -> bool {
    is_address_valid(bytes) && bytes[0] == COMPRESSED
}

pub fn is_multisig_address(bytes: &[u8]) -> bool {
    is_address_valid(bytes) && bytes[1] != SINGLE_SIGNER
}

pub fn partner_count(bytes: &[u8]) -> Option<u8> {
    is_multisig_address(bytes).then(|| bytes[1])
}

impl TryFrom<&[u8]> for Address {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ADDRESS_LEN {
            return Err(Error::InvalidAddress {
                reason: "address must be 22 bytes",
            });
        }
        if !is_address_valid(bytes) {
            return Err(Error::InvalidAddress {
                reason: "unknown flag bytes",
            });
        }
        let mut out = [0u8; ADDRESS_LEN];
        out.copy_from_slice(bytes);
        Ok(Address(out))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(|_| Error::InvalidAddress {
            reason: "address is not valid hex",
        })?;
        Address::try_from(bytes.as_slice())
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
