//! Signing key over a single-owner scalar
//!
//! A [`SigningKey`] owns exactly one [`KeyMaterial`] and exposes the
//! capability set external code depends on through the [`Signer`] trait:
//! public key derivation, low-S recoverable ECDSA, ECDH and disposal.
//!
//! The public key is never stored; it is recomputed from the live scalar,
//! so after disposal nothing key-dependent remains reachable.

use std::fmt;
use std::sync::Arc;

use zeroize::Zeroizing;

use crate::arith;
use crate::backend::{CurveBackend, Secp256k1Backend, UNCOMPRESSED_POINT_LEN};
use crate::error::KeyError;
use crate::material::KeyMaterial;

/// Length of a message digest accepted by [`Signer::sign`].
pub const DIGEST_LEN: usize = 32;

/// Canonical (low-S) recoverable ECDSA signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
    /// Recovery bit plus the backend's offset (27/28 by default).
    pub v: u8,
    recovery_id: u8,
}

impl Signature {
    /// The raw recovery bit, 0 or 1.
    pub fn recovery_id(&self) -> u8 {
        self.recovery_id
    }

    /// `r || s || v`
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut out = [0u8; 65];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }
}

/// Key capabilities consumed by wallet and transaction layers.
pub trait Signer {
    /// SEC1 public key, 33 bytes when `compressed`, else 65.
    fn public_key(&self, compressed: bool) -> Result<Vec<u8>, KeyError>;

    /// Sign a 32-byte digest deterministically, in low-S form.
    fn sign(&self, digest: &[u8]) -> Result<Signature, KeyError>;

    /// ECDH: this key's scalar times the counterparty point, uncompressed.
    fn compute_shared_secret(
        &self,
        other_public_key: &[u8],
    ) -> Result<Zeroizing<[u8; UNCOMPRESSED_POINT_LEN]>, KeyError>;

    /// Erase the private scalar. Repeated calls are no-ops.
    fn dispose(&mut self);

    fn is_disposed(&self) -> bool;
}

pub struct SigningKey<B: CurveBackend = Secp256k1Backend> {
    material: KeyMaterial,
    backend: Arc<B>,
}

impl SigningKey<Secp256k1Backend> {
    /// Build a key from a 32-byte scalar with the default backend.
    pub fn from_slice(scalar: &[u8]) -> Result<Self, KeyError> {
        Self::with_backend(scalar, Arc::new(Secp256k1Backend::new()))
    }
}

impl<B: CurveBackend> SigningKey<B> {
    pub fn with_backend(scalar: &[u8], backend: Arc<B>) -> Result<Self, KeyError> {
        let material = KeyMaterial::with_page_lock(scalar, backend.lock_key_pages())?;
        Ok(Self::from_material(material, backend))
    }

    pub(crate) fn from_material(material: KeyMaterial, backend: Arc<B>) -> Self {
        Self { material, backend }
    }

    /// The owned key material, for inspection. Reading the scalar through it
    /// still fails after disposal.
    pub fn key_material(&self) -> &KeyMaterial {
        &self.material
    }

    pub(crate) fn backend(&self) -> &Arc<B> {
        &self.backend
    }
}

impl<B: CurveBackend> Signer for SigningKey<B> {
    fn public_key(&self, compressed: bool) -> Result<Vec<u8>, KeyError> {
        let scalar = self.material.expose_secret()?;
        self.backend.public_key(scalar, compressed)
    }

    fn sign(&self, digest: &[u8]) -> Result<Signature, KeyError> {
        let digest: &[u8; DIGEST_LEN] = digest
            .try_into()
            .map_err(|_| KeyError::InvalidDigestLength(digest.len()))?;
        let scalar = self.material.expose_secret()?;

        let raw = self.backend.sign_recoverable(digest, scalar)?;
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&raw.compact[..32]);
        s.copy_from_slice(&raw.compact[32..]);

        let mut recovery_id = raw.recovery_id & 1;
        normalize_low_s(&mut s, &mut recovery_id);

        Ok(Signature {
            r,
            s,
            v: self.backend.recovery_id_offset() + recovery_id,
            recovery_id,
        })
    }

    fn compute_shared_secret(
        &self,
        other_public_key: &[u8],
    ) -> Result<Zeroizing<[u8; UNCOMPRESSED_POINT_LEN]>, KeyError> {
        let scalar = self.material.expose_secret()?;
        self.backend.shared_point(other_public_key, scalar)
    }

    fn dispose(&mut self) {
        self.material.erase();
    }

    fn is_disposed(&self) -> bool {
        !self.material.is_alive()
    }
}

impl<B: CurveBackend> fmt::Debug for SigningKey<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("material", &self.material)
            .finish()
    }
}

/// Replace `s` with `n - s` when it lies in the upper half, flipping the
/// recovery bit to match.
pub(crate) fn normalize_low_s(s: &mut [u8; 32], recovery_id: &mut u8) {
    if arith::is_high(s) {
        arith::negate_mod_order(s);
        *recovery_id ^= 1;
    }
}
