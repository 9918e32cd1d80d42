//! Error taxonomy for key material, signing and derivation.
//!
//! Every variant is a local validation failure. None of them carry key
//! bytes: payloads are lengths, indices or static text.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },
    #[error("Invalid scalar: must be in [1, n-1]")]
    InvalidScalar,
    #[error("Invalid seed length: {0} bytes (must be 16..=64)")]
    InvalidSeedLength(usize),
    #[error("Invalid digest length: {0} bytes (must be 32)")]
    InvalidDigestLength(usize),
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Cannot derive hardened child of neutered node")]
    CannotDeriveFromNeutered,
    #[error("Key material has been disposed")]
    UseAfterDispose,
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(&'static str),
    #[error("Invalid derivation candidate at index {index:#010x}")]
    InvalidDerivationCandidate { index: u32 },
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Maximum derivation depth exceeded")]
    MaxDepthExceeded,
}
