use thiserror::Error;

/// Errors surfaced by key generation, decoding and signing.
///
/// Verification never produces one of these: a signature that does not check
/// out is reported as `false`.
#[derive(Debug, Error)]
pub enum Error {
    /// The injected random source failed to produce bytes.
    #[error("random source failure: {0}")]
    RandomSource(#[source] rand::Error),

    /// A private scalar or signature scalar is the wrong width or out of range.
    #[error("invalid scalar encoding: {reason}")]
    InvalidScalarEncoding { reason: &'static str },

    /// A public key encoding is malformed or does not lie on the curve.
    #[error("invalid point encoding: {reason}")]
    InvalidPointEncoding { reason: &'static str },

    /// `x^3 - 3x + b` has no square root modulo `p` for the given x.
    #[error("x coordinate has no square root on the curve")]
    NoValidRoot,

    /// Message hashes must carry at least 32 bytes.
    #[error("message hash must be at least 32 bytes, got {len}")]
    HashTooShort { len: usize },

    #[error("recovery id must be 0 or 1, got {0}")]
    InvalidRecoveryId(u8),

    /// A multisig partner index outside `0..partners`.
    #[error("invalid partner order {order}: must be below {partners}")]
    InvalidOrder { order: u8, partners: u8 },

    /// A multisig group must hold between 1 and 255 keys.
    #[error("invalid partner count {0}: must be between 1 and 255")]
    InvalidPartnerCount(usize),

    #[error("invalid address: {reason}")]
    InvalidAddress { reason: &'static str },

    #[error("unsupported curve: {0}")]
    UnknownCurve(String),
}

pub type Result<T> = std::result::Result<T, Error>;
