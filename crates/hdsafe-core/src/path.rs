//! Derivation path strings such as `m/44'/60'/0'/0/0`.
//!
//! Child numbers and paths are the `bitcoin::bip32` types. The only thing
//! tracked here is whether a string starts at the master node (`m/...`) or
//! is relative to whichever node it is applied to.

use bitcoin::bip32::DerivationPath;

use crate::error::KeyError;

/// Whether `path` is anchored at the master node.
pub fn is_absolute(path: &str) -> bool {
    let path = path.trim();
    path == "m" || path.starts_with("m/")
}

/// Parse an absolute (`m/0'/1`) or relative (`0'/1`) path string.
///
/// `m` alone is the empty path. Hardened steps take `'` or `h`.
pub fn parse_path(path: &str) -> Result<DerivationPath, KeyError> {
    let trimmed = path.trim();
    let relative = match trimmed.strip_prefix('m') {
        Some("") => return Ok(DerivationPath::master()),
        Some(rest) => rest
            .strip_prefix('/')
            .ok_or_else(|| KeyError::InvalidPath(format!("bad path '{}'", path)))?,
        None => trimmed,
    };
    if relative.is_empty() {
        return Err(KeyError::InvalidPath(format!("bad path '{}'", path)));
    }

    format!("m/{}", relative)
        .parse::<DerivationPath>()
        .map_err(|e: bitcoin::bip32::Error| KeyError::InvalidPath(format!("{}: {}", path, e)))
}
