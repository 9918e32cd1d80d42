//! BIP-32 master key generation from a raw seed
//!
//! `I = HMAC-SHA512(key = "Bitcoin seed", data = seed)`; the left half is
//! the master scalar and the right half the master chain code. `I` lives in
//! a zeroizing buffer and is wiped as soon as it has been split.
//!
//! Mnemonic handling (BIP-39) is not done here; callers pass seed bytes.

use std::ops::RangeInclusive;

use zeroize::Zeroizing;

use crate::backend::CurveBackend;
use crate::error::KeyError;
use crate::material::KeyMaterial;

/// HMAC key for master generation.
pub const MASTER_KEY_DOMAIN: &[u8] = b"Bitcoin seed";

/// Accepted seed lengths in bytes (128 to 512 bits).
pub const SEED_LEN_RANGE: RangeInclusive<usize> = 16..=64;

/// A chain code; wiped on drop.
pub type ChainCode = Zeroizing<[u8; 32]>;

/// Output of seed expansion.
pub struct MasterKey {
    pub key_material: KeyMaterial,
    pub chain_code: ChainCode,
}

/// Expand `seed` into the master scalar and chain code.
pub fn expand_seed<B: CurveBackend>(backend: &B, seed: &[u8]) -> Result<MasterKey, KeyError> {
    if !SEED_LEN_RANGE.contains(&seed.len()) {
        return Err(KeyError::InvalidSeedLength(seed.len()));
    }

    let i = backend.hmac_sha512(MASTER_KEY_DOMAIN, seed);
    let key_material = KeyMaterial::with_page_lock(&i[..32], backend.lock_key_pages())?;
    let mut chain_code = ChainCode::default();
    chain_code.copy_from_slice(&i[32..]);

    Ok(MasterKey {
        key_material,
        chain_code,
    })
}
