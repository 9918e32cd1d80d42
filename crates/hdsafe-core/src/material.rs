//! Single-owner private scalar storage
//!
//! A [`KeyMaterial`] owns one 32-byte heap buffer holding a big-endian
//! scalar in `[1, n-1]`. The buffer never moves while the material lives,
//! so moving the owner leaves no stale copy behind. Erasure is explicit via
//! [`KeyMaterial::erase`] and also runs on drop, so every exit path wipes.
//!
//! There is no `Clone`: a scalar has exactly one owner at a time.

use std::cmp::Ordering;
use std::fmt;

use zeroize::Zeroize;

use crate::arith::{self, SCALAR_LEN};
use crate::error::KeyError;
use crate::memory;

pub struct KeyMaterial {
    bytes: Box<[u8; SCALAR_LEN]>,
    alive: bool,
    locked: bool,
}

impl KeyMaterial {
    /// Take a copy of a validated scalar.
    ///
    /// Fails with `InvalidKeyLength` unless `bytes` is exactly 32 bytes and
    /// with `InvalidScalar` if the value is zero or not below the order.
    pub fn new(bytes: &[u8]) -> Result<Self, KeyError> {
        Self::with_page_lock(bytes, false)
    }

    /// Like [`KeyMaterial::new`], optionally `mlock`ing the buffer.
    pub fn with_page_lock(bytes: &[u8], lock: bool) -> Result<Self, KeyError> {
        if bytes.len() != SCALAR_LEN {
            return Err(KeyError::InvalidKeyLength {
                expected: SCALAR_LEN,
                actual: bytes.len(),
            });
        }

        let mut material = Self {
            bytes: Box::new([0u8; SCALAR_LEN]),
            alive: true,
            locked: false,
        };
        if lock {
            material.locked = memory::lock_key_buffer(&material.bytes);
        }
        material.bytes.copy_from_slice(bytes);

        // An invalid value is wiped by Drop on the way out
        if arith::is_zero(&material.bytes)
            || arith::compare_to_order(&material.bytes) != Ordering::Less
        {
            return Err(KeyError::InvalidScalar);
        }

        Ok(material)
    }

    /// Read-only view of the scalar. Fails once erased.
    pub fn expose_secret(&self) -> Result<&[u8; SCALAR_LEN], KeyError> {
        if !self.alive {
            return Err(KeyError::UseAfterDispose);
        }
        Ok(&self.bytes)
    }

    /// Overwrite all 32 bytes with zero and mark the material dead.
    ///
    /// Calling this more than once is a no-op.
    pub fn erase(&mut self) {
        (*self.bytes).zeroize();
        self.alive = false;
        if self.locked {
            memory::unlock_key_buffer(&self.bytes);
            self.locked = false;
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether the pages under this buffer are currently `mlock`ed.
    pub fn is_page_locked(&self) -> bool {
        self.locked && memory::is_buffer_locked(&self.bytes)
    }

    /// True once erased and every byte of the buffer reads zero.
    pub fn is_wiped(&self) -> bool {
        !self.alive && arith::is_zero(&self.bytes)
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.erase();
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("alive", &self.alive)
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
