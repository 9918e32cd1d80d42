//! Injected curve and hash primitives.
//!
//! Seed expansion, signing keys and nodes never reach for a process-wide
//! hashing or curve implementation. They are handed a [`CurveBackend`] at
//! construction and share it through an `Arc`. [`Secp256k1Backend`] is the
//! production implementation on top of libsecp256k1 and `bitcoin::hashes`.

use bitcoin::hashes::{hash160, sha512, Hash, HashEngine, Hmac, HmacEngine};
use secp256k1::ecdh::shared_secret_point;
use secp256k1::{All, Message, PublicKey, Secp256k1, SecretKey};
use zeroize::{Zeroize, Zeroizing};

use crate::config::HdConfig;
use crate::error::KeyError;

/// Length of an uncompressed SEC1 point, `0x04 || x || y`.
pub const UNCOMPRESSED_POINT_LEN: usize = 65;

/// Compact ECDSA output before low-S normalisation.
pub struct RawSignature {
    /// `r || s`, big-endian.
    pub compact: [u8; 64],
    /// 0 or 1.
    pub recovery_id: u8,
}

/// Primitives the key lifecycle needs from the outside world.
///
/// Implementations receive scalars by reference only and must not retain or
/// log them.
pub trait CurveBackend: Send + Sync {
    fn hmac_sha512(&self, key: &[u8], data: &[u8]) -> Zeroizing<[u8; 64]>;

    /// RIPEMD160(SHA256(data)).
    fn hash160(&self, data: &[u8]) -> [u8; 20];

    /// `scalar * G`, as 33 bytes when `compressed`, else 65.
    fn public_key(&self, scalar: &[u8; 32], compressed: bool) -> Result<Vec<u8>, KeyError>;

    /// Deterministic (RFC 6979) recoverable ECDSA over a 32-byte digest.
    fn sign_recoverable(
        &self,
        digest: &[u8; 32],
        scalar: &[u8; 32],
    ) -> Result<RawSignature, KeyError>;

    /// `scalar * P` for a SEC1-encoded point `P`, uncompressed.
    fn shared_point(
        &self,
        public_key: &[u8],
        scalar: &[u8; 32],
    ) -> Result<Zeroizing<[u8; UNCOMPRESSED_POINT_LEN]>, KeyError>;

    /// Added to the recovery bit to form `v`.
    fn recovery_id_offset(&self) -> u8 {
        27
    }

    /// Whether new key buffers should be `mlock`ed.
    fn lock_key_pages(&self) -> bool {
        false
    }
}

/// libsecp256k1-backed implementation.
pub struct Secp256k1Backend {
    secp: Secp256k1<All>,
    recovery_id_offset: u8,
    lock_key_pages: bool,
}

impl Secp256k1Backend {
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
            recovery_id_offset: 27,
            lock_key_pages: false,
        }
    }

    /// Take the signing offset and page-locking policy from configuration.
    pub fn from_config(config: &HdConfig) -> Self {
        Self {
            secp: Secp256k1::new(),
            recovery_id_offset: config.signing.recovery_id_offset,
            lock_key_pages: config.memory.lock_key_pages,
        }
    }

    /// Run `f` with a library secret key built from `scalar`, erasing it after.
    fn with_secret_key<T>(
        scalar: &[u8; 32],
        f: impl FnOnce(&SecretKey) -> Result<T, KeyError>,
    ) -> Result<T, KeyError> {
        let mut secret_key = SecretKey::from_slice(scalar).map_err(|_| KeyError::InvalidScalar)?;
        let result = f(&secret_key);
        secret_key.non_secure_erase();
        result
    }
}

impl Default for Secp256k1Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl CurveBackend for Secp256k1Backend {
    fn hmac_sha512(&self, key: &[u8], data: &[u8]) -> Zeroizing<[u8; 64]> {
        let mut engine = HmacEngine::<sha512::Hash>::new(key);
        engine.input(data);
        Zeroizing::new(Hmac::from_engine(engine).to_byte_array())
    }

    fn hash160(&self, data: &[u8]) -> [u8; 20] {
        hash160::Hash::hash(data).to_byte_array()
    }

    fn public_key(&self, scalar: &[u8; 32], compressed: bool) -> Result<Vec<u8>, KeyError> {
        Self::with_secret_key(scalar, |sk| {
            let pk = PublicKey::from_secret_key(&self.secp, sk);
            Ok(if compressed {
                pk.serialize().to_vec()
            } else {
                pk.serialize_uncompressed().to_vec()
            })
        })
    }

    fn sign_recoverable(
        &self,
        digest: &[u8; 32],
        scalar: &[u8; 32],
    ) -> Result<RawSignature, KeyError> {
        let msg = Message::from_digest(*digest);
        Self::with_secret_key(scalar, |sk| {
            let sig = self.secp.sign_ecdsa_recoverable(&msg, sk);
            let (recovery_id, compact) = sig.serialize_compact();
            Ok(RawSignature {
                compact,
                recovery_id: recovery_id.to_i32() as u8,
            })
        })
    }

    fn shared_point(
        &self,
        public_key: &[u8],
        scalar: &[u8; 32],
    ) -> Result<Zeroizing<[u8; UNCOMPRESSED_POINT_LEN]>, KeyError> {
        let point = PublicKey::from_slice(public_key).map_err(|_| KeyError::InvalidPublicKey)?;
        Self::with_secret_key(scalar, |sk| {
            let mut xy = shared_secret_point(&point, sk);
            let mut out = Zeroizing::new([0u8; UNCOMPRESSED_POINT_LEN]);
            out[0] = 0x04;
            out[1..].copy_from_slice(&xy);
            xy.zeroize();
            Ok(out)
        })
    }

    fn recovery_id_offset(&self) -> u8 {
        self.recovery_id_offset
    }

    fn lock_key_pages(&self) -> bool {
        self.lock_key_pages
    }
}
