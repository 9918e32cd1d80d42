//! hdsafe core
//!
//! BIP-32 secp256k1 key derivation where every private scalar lives in one
//! owned, fixed-size buffer that is wiped on disposal or drop.
//!
//! # Key Derivation
//!
//! From a 16..=64 byte seed:
//! - master node via HMAC-SHA512("Bitcoin seed", seed), path `m`
//! - children via [`HdNode::derive_child`], e.g. `m/44'/60'/0'/0/0`
//!
//! # Lifecycle
//!
//! [`HdNode::dispose`] and [`Signer::dispose`] zero the scalar before
//! returning; every key-dependent call afterwards fails with
//! [`KeyError::UseAfterDispose`].

use std::sync::Arc;

pub mod arith;
pub mod backend;
pub mod config;
pub mod error;
pub mod material;
pub mod memory;
pub mod node;
pub mod path;
pub mod seed;
pub mod signing;

pub use backend::{CurveBackend, Secp256k1Backend};
pub use config::HdConfig;
pub use error::KeyError;
pub use material::KeyMaterial;
pub use bitcoin::bip32::{ChildNumber, DerivationPath, Fingerprint};
pub use node::{HdNode, NodeInfo};
pub use path::{is_absolute, parse_path};
pub use signing::{Signature, Signer, SigningKey};

/// Master node (depth 0, path `m`) from seed bytes.
pub fn master_from_seed(seed: &[u8]) -> Result<HdNode, KeyError> {
    HdNode::from_seed(seed)
}

/// Derive the configured path from `seed` using the configured backend policy.
///
/// The configuration is validated and the requested process hardening is
/// applied first. Key errors stay reachable through `downcast_ref::<KeyError>()`.
/// The master node is wiped before this returns.
pub fn derive_from_config(seed: &[u8], config: &HdConfig) -> anyhow::Result<HdNode> {
    config.validate()?;
    if !config.harden_process() {
        log::warn!("Process hardening incomplete, continuing");
    }

    let backend = Arc::new(Secp256k1Backend::from_config(config));
    let master = HdNode::from_seed_with_backend(seed, backend)?;

    let path = &config.derivation.path;
    let node = if config.derivation.best_effort {
        master.derive_path_best_effort(path)?
    } else {
        master.derive_path(path)?
    };
    Ok(node)
}
