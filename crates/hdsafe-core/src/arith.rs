//! Fixed-width 256-bit arithmetic modulo the secp256k1 group order.
//!
//! All values are 32-byte big-endian buffers owned by the caller, so every
//! intermediate can be wiped in place. There is no bignum type here and
//! nothing allocates.
//!
//! Comparison walks most-significant byte first. Addition and subtraction
//! propagate carry/borrow from the least-significant byte up through the
//! whole buffer; combining bytes independently is not modular addition.

use std::cmp::Ordering;

/// Width of a scalar in bytes.
pub const SCALAR_LEN: usize = 32;

/// The secp256k1 group order `n`.
pub const CURVE_ORDER: [u8; SCALAR_LEN] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe,
    0xba, 0xae, 0xdc, 0xe6, 0xaf, 0x48, 0xa0, 0x3b, 0xbf, 0xd2, 0x5e, 0x8c, 0xd0, 0x36, 0x41, 0x41,
];

/// `n / 2` rounded down. Low-S signatures satisfy `s <= HALF_ORDER`.
pub const HALF_ORDER: [u8; SCALAR_LEN] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

#[inline]
fn compare(a: &[u8; SCALAR_LEN], b: &[u8; SCALAR_LEN]) -> Ordering {
    for i in 0..SCALAR_LEN {
        match a[i].cmp(&b[i]) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// Compare a buffer against the group order.
#[inline]
pub fn compare_to_order(buf: &[u8; SCALAR_LEN]) -> Ordering {
    compare(buf, &CURVE_ORDER)
}

/// Whether `s` lies in the upper half of the order range.
#[inline]
pub fn is_high(s: &[u8; SCALAR_LEN]) -> bool {
    compare(s, &HALF_ORDER) == Ordering::Greater
}

#[inline]
pub fn is_zero(buf: &[u8; SCALAR_LEN]) -> bool {
    // Fold instead of short-circuiting so the scan length doesn't depend on content
    buf.iter().fold(0u8, |acc, &b| acc | b) == 0
}

/// `a += b` over 256 bits. Returns the carry out of the top byte.
pub fn add_assign(a: &mut [u8; SCALAR_LEN], b: &[u8; SCALAR_LEN]) -> bool {
    let mut carry = 0u16;
    for i in (0..SCALAR_LEN).rev() {
        let sum = a[i] as u16 + b[i] as u16 + carry;
        a[i] = (sum & 0xff) as u8;
        carry = sum >> 8;
    }
    carry != 0
}

/// `buf -= n` with borrow propagation, wrapping modulo 2^256.
///
/// Used after an addition whose raw result overflowed or reached `n`; in
/// that case the wrapped difference is the reduced sum.
pub fn subtract_order(buf: &mut [u8; SCALAR_LEN]) {
    let mut borrow = 0i16;
    for i in (0..SCALAR_LEN).rev() {
        let diff = buf[i] as i16 - CURVE_ORDER[i] as i16 - borrow;
        if diff < 0 {
            buf[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            buf[i] = diff as u8;
            borrow = 0;
        }
    }
}

/// `a = (a + b) mod n` for `a, b < n`.
pub fn add_mod_order(a: &mut [u8; SCALAR_LEN], b: &[u8; SCALAR_LEN]) {
    let overflowed = add_assign(a, b);
    if overflowed || compare_to_order(a) != Ordering::Less {
        subtract_order(a);
    }
}

/// `buf = n - buf` for `0 < buf < n`.
pub fn negate_mod_order(buf: &mut [u8; SCALAR_LEN]) {
    let mut borrow = 0i16;
    for i in (0..SCALAR_LEN).rev() {
        let diff = CURVE_ORDER[i] as i16 - buf[i] as i16 - borrow;
        if diff < 0 {
            buf[i] = (diff + 256) as u8;
            borrow = 1;
        } else {
            buf[i] = diff as u8;
            borrow = 0;
        }
    }
}
